//! Test helpers for the load tester - deterministic accounts and fakes for
//! the external collaborators.
//!
//! Keys are derived from a seed so that tests can sign, verify and compare
//! bytes across runs.
//!
//! # Example
//!
//! ```rust
//! use manifest_load_test_helpers::TestAccounts;
//! use manifest_load_types::KeyType;
//!
//! // Two signing accounts, user1 and user2
//! let accounts = TestAccounts::new(2, 42, KeyType::Secp256k1);
//!
//! let message = b"payload";
//! let signature = accounts.key(0).sign(message);
//! assert!(accounts.account(0).public_key().verify(message, &signature));
//! ```

pub mod faulty;
pub mod fixtures;

use manifest_load_types::{Account, KeyPair, KeyType, DEFAULT_ACCOUNT_PREFIX};

/// A set of signing accounts with deterministic keys.
///
/// Account `i` is named `user{i+1}` and addressed under the `manifest`
/// prefix.
pub struct TestAccounts {
    keys: Vec<KeyPair>,
    accounts: Vec<Account>,
}

impl std::fmt::Debug for TestAccounts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestAccounts")
            .field("size", &self.accounts.len())
            .field(
                "addresses",
                &self
                    .accounts
                    .iter()
                    .map(|a| a.address().as_str())
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl TestAccounts {
    /// Create `size` accounts of `key_type` from `seed`.
    ///
    /// Same seed, same keys. Different seeds produce different keys.
    pub fn new(size: usize, seed: u64, key_type: KeyType) -> Self {
        let mut keys = Vec::with_capacity(size);
        let mut accounts = Vec::with_capacity(size);

        for i in 0..size {
            let key = key_from_seed(key_type, seed, i);
            let account = Account::from_key(
                format!("user{}", i + 1),
                key.clone(),
                DEFAULT_ACCOUNT_PREFIX,
            )
            .expect("default prefix is valid");
            keys.push(key);
            accounts.push(account);
        }

        Self { keys, accounts }
    }

    /// Get the number of accounts.
    pub fn size(&self) -> usize {
        self.accounts.len()
    }

    /// Get a key by index.
    ///
    /// # Panics
    ///
    /// Panics if `idx >= size()`.
    pub fn key(&self, idx: usize) -> &KeyPair {
        &self.keys[idx]
    }

    /// Get an account by index.
    ///
    /// # Panics
    ///
    /// Panics if `idx >= size()`.
    pub fn account(&self, idx: usize) -> &Account {
        &self.accounts[idx]
    }

    /// Clones of all accounts, in index order.
    pub fn accounts(&self) -> Vec<Account> {
        self.accounts.clone()
    }

    /// Clones of all accounts followed by one watch-only account named
    /// `watcher`.
    pub fn accounts_with_watch_only(&self) -> Vec<Account> {
        let mut accounts = self.accounts();
        accounts.push(fixtures::watch_only_account("watcher", 0xFEED));
        accounts
    }
}

/// Deterministic key for position `index` under `seed`.
pub fn key_from_seed(key_type: KeyType, seed: u64, index: usize) -> KeyPair {
    let mut seed_bytes = [0u8; 32];
    let key_seed = seed
        .wrapping_add(index as u64)
        .wrapping_mul(0x517cc1b727220a95);
    seed_bytes[..8].copy_from_slice(&key_seed.to_le_bytes());
    seed_bytes[8..16].copy_from_slice(&(index as u64).to_le_bytes());
    seed_bytes[16..24].copy_from_slice(&seed.to_le_bytes());
    // Keeps the secp256k1 scalar non-zero and below the curve order.
    seed_bytes[0] &= 0x7f;
    seed_bytes[31] = 0x01;

    KeyPair::from_seed(key_type, &seed_bytes).expect("seed is a valid scalar")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accounts_creation() {
        let accounts = TestAccounts::new(4, 42, KeyType::Secp256k1);

        assert_eq!(accounts.size(), 4);
        assert_eq!(accounts.account(0).name(), "user1");
        assert_eq!(accounts.account(3).name(), "user4");
        assert!(accounts.account(0).can_sign());
    }

    #[test]
    fn test_accounts_deterministic() {
        let a1 = TestAccounts::new(4, 42, KeyType::Ed25519);
        let a2 = TestAccounts::new(4, 42, KeyType::Ed25519);

        for i in 0..4 {
            assert_eq!(a1.account(i).address(), a2.account(i).address());
        }
    }

    #[test]
    fn test_accounts_different_seeds() {
        let a1 = TestAccounts::new(1, 42, KeyType::Secp256k1);
        let a2 = TestAccounts::new(1, 43, KeyType::Secp256k1);

        assert_ne!(a1.account(0).public_key(), a2.account(0).public_key());
    }

    #[test]
    fn test_watch_only_appended() {
        let accounts = TestAccounts::new(2, 7, KeyType::Secp256k1).accounts_with_watch_only();

        assert_eq!(accounts.len(), 3);
        assert!(!accounts[2].can_sign());
        assert_eq!(accounts[2].name(), "watcher");
    }

    #[test]
    fn test_key_signing() {
        let accounts = TestAccounts::new(2, 42, KeyType::Secp256k1);

        let message = b"test message";
        let signature = accounts.key(0).sign(message);

        assert!(accounts.account(0).public_key().verify(message, &signature));
        assert!(!accounts.account(1).public_key().verify(message, &signature));
    }
}
