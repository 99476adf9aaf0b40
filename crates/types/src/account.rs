//! Signer identities and on-chain account lookup.

use crate::{Address, AddressError, KeyPair, PublicKey};
use thiserror::Error;

/// A named identity that can appear as sender or counterparty.
///
/// Accounts built with [`Account::from_key`] own their private key and can
/// sign; [`Account::watch_only`] accounts carry only the public half.
#[derive(Debug, Clone)]
pub struct Account {
    name: String,
    address: Address,
    public_key: PublicKey,
    key: Option<KeyPair>,
}

impl Account {
    /// Account owning `key`, addressed under `prefix`.
    pub fn from_key(
        name: impl Into<String>,
        key: KeyPair,
        prefix: &str,
    ) -> Result<Self, AddressError> {
        let public_key = key.public_key();
        let address = Address::from_public_key(&public_key, prefix)?;
        Ok(Self {
            name: name.into(),
            address,
            public_key,
            key: Some(key),
        })
    }

    /// Account without private key material.
    pub fn watch_only(
        name: impl Into<String>,
        public_key: PublicKey,
        prefix: &str,
    ) -> Result<Self, AddressError> {
        let address = Address::from_public_key(&public_key, prefix)?;
        Ok(Self {
            name: name.into(),
            address,
            public_key,
            key: None,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    pub fn key(&self) -> Option<&KeyPair> {
        self.key.as_ref()
    }

    pub fn can_sign(&self) -> bool {
        self.key.is_some()
    }
}

/// On-chain account number and next sequence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccountInfo {
    pub account_number: u64,
    pub sequence: u64,
}

/// Source of on-chain account state.
pub trait AccountRetriever: Send + Sync {
    fn account_info(&self, address: &Address) -> Result<AccountInfo, RetrieverError>;
}

/// Errors that can occur when fetching account state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RetrieverError {
    #[error("account {0} not found")]
    NotFound(String),

    #[error("request failed: {0}")]
    Transport(String),

    #[error("malformed response: {0}")]
    InvalidResponse(String),
}
