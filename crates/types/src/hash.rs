//! Transaction hash type using SHA-256.

use sha2::{Digest, Sha256};
use std::fmt;

/// A 32-byte SHA-256 hash.
///
/// The ledger identifies a transaction by the SHA-256 of its wire bytes and
/// displays it as upper-case hex.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Hash([u8; 32]);

impl Hash {
    /// Hash of encoded transaction bytes, as the node reports it.
    pub fn of_tx_bytes(tx_bytes: &[u8]) -> Self {
        Self(Sha256::digest(tx_bytes).into())
    }

    /// Convert hash to upper-case hex string.
    pub fn to_hex(&self) -> String {
        hex::encode_upper(self.0)
    }

    /// Get bytes as slice reference.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex = self.to_hex();
        write!(f, "Hash({}..{})", &hex[..8], &hex[56..])
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_deterministic() {
        let data = b"hello world";
        assert_eq!(Hash::of_tx_bytes(data), Hash::of_tx_bytes(data));
        assert_ne!(Hash::of_tx_bytes(b"hello"), Hash::of_tx_bytes(b"world"));
    }

    #[test]
    fn test_known_sha256_vector() {
        let hash = Hash::of_tx_bytes(b"abc");
        assert_eq!(
            hash.to_string(),
            "BA7816BF8F01CFEA414140DE5DAE2223B00361A396177A9CB410FF61F20015AD"
        );
        assert_eq!(hash.as_bytes()[0], 0xba);
        assert_eq!(format!("{hash:?}"), "Hash(BA7816BF..F20015AD)");
    }
}
