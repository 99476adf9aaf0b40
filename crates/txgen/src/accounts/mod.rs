//! Account pool for transaction generation.
//!
//! The pool is built once at startup and is read-only afterwards, so it can
//! be shared behind an `Arc` by every client and worker thread.

use manifest_load_types::{Account, AddressError, KeyError, KeyPair, KeyType};
use rand::RngCore;
use std::collections::HashMap;
use tracing::info;

/// First seed used by [`AccountPool::generate`].
pub const FIRST_GENERATED_SEED: u64 = 100;

/// Immutable set of accounts, addressable by index or name.
#[derive(Debug, Clone, Default)]
pub struct AccountPool {
    accounts: Vec<Account>,
    by_name: HashMap<String, usize>,
}

impl AccountPool {
    /// Build a pool from accounts. Names must be unique.
    pub fn new(accounts: Vec<Account>) -> Result<Self, AccountPoolError> {
        let mut by_name = HashMap::with_capacity(accounts.len());
        for (idx, account) in accounts.iter().enumerate() {
            if by_name.insert(account.name().to_string(), idx).is_some() {
                return Err(AccountPoolError::DuplicateName(account.name().to_string()));
            }
        }
        Ok(Self { accounts, by_name })
    }

    /// Generate `count` signing accounts from consecutive seeds.
    ///
    /// Seeds start at [`FIRST_GENERATED_SEED`], so the same `count` always
    /// yields the same accounts.
    pub fn generate(
        count: usize,
        key_type: KeyType,
        prefix: &str,
    ) -> Result<Self, AccountPoolError> {
        info!(count, %key_type, prefix, "Generating account pool");

        let accounts = (0..count)
            .map(|i| {
                let seed = seed_bytes(FIRST_GENERATED_SEED + i as u64);
                let key = KeyPair::from_seed(key_type, &seed)
                    .map_err(|source| AccountPoolError::InvalidKey { index: i, source })?;
                Ok(Account::from_key(format!("user{}", i + 1), key, prefix)?)
            })
            .collect::<Result<Vec<_>, AccountPoolError>>()?;

        let pool = Self::new(accounts)?;
        info!(total_accounts = pool.len(), "Generated account pool");
        Ok(pool)
    }

    /// Build `user1..userN` from hex-encoded private keys.
    pub fn from_hex_keys<S: AsRef<str>>(
        keys: &[S],
        key_type: KeyType,
        prefix: &str,
    ) -> Result<Self, AccountPoolError> {
        let accounts = keys
            .iter()
            .enumerate()
            .map(|(i, hex_key)| {
                let key = KeyPair::from_hex(key_type, hex_key.as_ref())
                    .map_err(|source| AccountPoolError::InvalidKey { index: i, source })?;
                Ok(Account::from_key(format!("user{}", i + 1), key, prefix)?)
            })
            .collect::<Result<Vec<_>, AccountPoolError>>()?;

        Self::new(accounts)
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// Account at `index`.
    pub fn get(&self, index: usize) -> Result<&Account, AccountPoolError> {
        self.accounts
            .get(index)
            .ok_or_else(|| AccountPoolError::NotFound(format!("#{index}")))
    }

    /// Account named `name`.
    pub fn by_name(&self, name: &str) -> Result<&Account, AccountPoolError> {
        self.by_name
            .get(name)
            .map(|&idx| &self.accounts[idx])
            .ok_or_else(|| AccountPoolError::NotFound(name.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Account> {
        self.accounts.iter()
    }

    /// Number of accounts able to sign.
    pub fn signing_accounts(&self) -> usize {
        self.accounts.iter().filter(|a| a.can_sign()).count()
    }

    /// Pick `n` distinct accounts uniformly at random.
    ///
    /// Sampling is without replacement, so no account appears twice.
    pub fn sample_distinct(
        &self,
        rng: &mut dyn RngCore,
        n: usize,
    ) -> Result<Vec<&Account>, AccountPoolError> {
        if self.accounts.len() < n {
            return Err(AccountPoolError::TooFewAccounts {
                required: n,
                available: self.accounts.len(),
            });
        }

        Ok(rand::seq::index::sample(rng, self.accounts.len(), n)
            .into_iter()
            .map(|idx| &self.accounts[idx])
            .collect())
    }
}

/// Expand a `u64` seed into secret key bytes.
fn seed_bytes(seed: u64) -> [u8; 32] {
    let mut bytes = [0u8; 32];
    for (i, chunk) in bytes.chunks_mut(8).enumerate() {
        // Vary each chunk so small seeds still fill the whole secret
        let varied = seed.wrapping_add(i as u64);
        chunk.copy_from_slice(&varied.to_le_bytes());
    }
    // Big-endian secp256k1 scalar must stay below the curve order.
    bytes[0] &= 0x7f;
    bytes
}

/// Errors that can occur during account pool operations.
#[derive(Debug, thiserror::Error)]
pub enum AccountPoolError {
    #[error("Duplicate account name: {0}")]
    DuplicateName(String),

    #[error("Account {0} not found")]
    NotFound(String),

    #[error("Pool has {available} accounts, {required} required")]
    TooFewAccounts { required: usize, available: usize },

    #[error("Invalid key for account #{index}: {source}")]
    InvalidKey {
        index: usize,
        #[source]
        source: KeyError,
    },

    #[error(transparent)]
    Address(#[from] AddressError),
}
