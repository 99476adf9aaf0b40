//! Fixture builders and an in-memory account store.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use manifest_load_types::{
    Account, AccountInfo, AccountRetriever, Address, KeyType, PublicKey, RetrieverError,
    SignerData, DEFAULT_ACCOUNT_PREFIX,
};
use parking_lot::RwLock;

/// Chain id used by offline signing tests.
pub const TEST_CHAIN_ID: &str = "test-chain";

/// Account without private key material, derived from `seed`.
pub fn watch_only_account(name: &str, seed: u64) -> Account {
    let key = crate::key_from_seed(KeyType::Secp256k1, seed, 0);
    Account::watch_only(name, key.public_key(), DEFAULT_ACCOUNT_PREFIX)
        .expect("default prefix is valid")
}

/// Signer data for `public_key` on [`TEST_CHAIN_ID`].
pub fn test_signer_data(public_key: PublicKey, account_number: u64, sequence: u64) -> SignerData {
    SignerData {
        chain_id: TEST_CHAIN_ID.to_string(),
        account_number,
        sequence,
        public_key,
    }
}

/// Account store keyed by bech32 address.
///
/// Unknown addresses fail with [`RetrieverError::NotFound`]. Every lookup is
/// counted, hit or miss.
#[derive(Debug, Default)]
pub struct InMemoryRetriever {
    accounts: RwLock<HashMap<String, AccountInfo>>,
    lookups: AtomicUsize,
}

impl InMemoryRetriever {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store with every account at `account_number = index`, `sequence = 0`.
    pub fn with_accounts(accounts: &[Account]) -> Self {
        let retriever = Self::new();
        for (i, account) in accounts.iter().enumerate() {
            retriever.set(
                account.address(),
                AccountInfo {
                    account_number: i as u64,
                    sequence: 0,
                },
            );
        }
        retriever
    }

    pub fn set(&self, address: &Address, info: AccountInfo) {
        self.accounts
            .write()
            .insert(address.as_str().to_string(), info);
    }

    /// Number of lookups served so far.
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::Relaxed)
    }
}

impl AccountRetriever for InMemoryRetriever {
    fn account_info(&self, address: &Address) -> Result<AccountInfo, RetrieverError> {
        self.lookups.fetch_add(1, Ordering::Relaxed);
        self.accounts
            .read()
            .get(address.as_str())
            .copied()
            .ok_or_else(|| RetrieverError::NotFound(address.to_string()))
    }
}
