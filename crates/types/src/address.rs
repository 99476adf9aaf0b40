//! Bech32 account addresses.
//!
//! An address is 20 bytes derived from the account's public key:
//!
//! | Key kind | Address bytes |
//! |----------|---------------|
//! | SECP256K1 | `RIPEMD160(SHA256(compressed_pubkey))` |
//! | ED25519 | `SHA256(pubkey)[..20]` |
//!
//! and is rendered as bech32 under the chain's account prefix.

use crate::PublicKey;
use bech32::{Bech32, Hrp};
use ripemd::Ripemd160;
use sha2::{Digest, Sha256};
use std::fmt;

/// Account prefix used by the Manifest ledger.
pub const DEFAULT_ACCOUNT_PREFIX: &str = "manifest";

/// Length of the raw address.
pub const ADDRESS_BYTES: usize = 20;

/// A bech32 account address.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address {
    encoded: String,
    bytes: [u8; ADDRESS_BYTES],
}

impl Address {
    /// Derive the address of a public key under `prefix`.
    pub fn from_public_key(public_key: &PublicKey, prefix: &str) -> Result<Self, AddressError> {
        let sha = Sha256::digest(public_key.as_bytes());
        let mut bytes = [0u8; ADDRESS_BYTES];
        match public_key {
            PublicKey::Secp256k1(_) => {
                bytes.copy_from_slice(&Ripemd160::digest(sha));
            }
            PublicKey::Ed25519(_) => {
                bytes.copy_from_slice(&sha[..ADDRESS_BYTES]);
            }
        }
        Self::from_raw(bytes, prefix)
    }

    /// Encode raw address bytes under `prefix`.
    pub fn from_raw(bytes: [u8; ADDRESS_BYTES], prefix: &str) -> Result<Self, AddressError> {
        let hrp = Hrp::parse(prefix).map_err(|e| AddressError::InvalidPrefix(e.to_string()))?;
        let encoded = bech32::encode::<Bech32>(hrp, &bytes)
            .map_err(|e| AddressError::Encode(e.to_string()))?;
        Ok(Self { encoded, bytes })
    }

    /// Parse and validate a bech32 address.
    pub fn parse(input: &str) -> Result<Self, AddressError> {
        let (_, data) = bech32::decode(input).map_err(|e| AddressError::Decode(e.to_string()))?;
        let bytes: [u8; ADDRESS_BYTES] =
            data.as_slice()
                .try_into()
                .map_err(|_| AddressError::InvalidLength {
                    expected: ADDRESS_BYTES,
                    actual: data.len(),
                })?;
        Ok(Self {
            encoded: input.to_ascii_lowercase(),
            bytes,
        })
    }

    /// Human-readable prefix of this address.
    pub fn prefix(&self) -> &str {
        self.encoded
            .rsplit_once('1')
            .map(|(hrp, _)| hrp)
            .unwrap_or_default()
    }

    /// The bech32 string.
    pub fn as_str(&self) -> &str {
        &self.encoded
    }

    /// The raw address bytes.
    pub fn as_bytes(&self) -> &[u8; ADDRESS_BYTES] {
        &self.bytes
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encoded)
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.encoded)
    }
}

/// Errors that can occur when deriving or parsing addresses.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressError {
    #[error("Invalid bech32 prefix: {0}")]
    InvalidPrefix(String),

    #[error("Bech32 encode failed: {0}")]
    Encode(String),

    #[error("Bech32 decode failed: {0}")]
    Decode(String),

    #[error("Invalid address length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
}
