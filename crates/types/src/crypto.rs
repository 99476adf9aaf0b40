//! Signing keys, public keys and signatures.
//!
//! Supports:
//! - SECP256K1: The default account key on Cosmos SDK chains
//! - ED25519: Accepted by the ledger for account keys as well
//!
//! The set of key kinds is closed. Anything else is rejected when the key is
//! parsed, never later in the signing path.

use sbor::prelude::*;
use std::fmt;
use std::str::FromStr;

/// Supported key types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, BasicSbor)]
pub enum KeyType {
    /// SECP256K1 ECDSA over SHA-256.
    Secp256k1,
    /// ED25519.
    Ed25519,
}

impl KeyType {
    /// Canonical lower-case name.
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyType::Secp256k1 => "secp256k1",
            KeyType::Ed25519 => "ed25519",
        }
    }
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KeyType {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "secp256k1" => Ok(KeyType::Secp256k1),
            "ed25519" => Ok(KeyType::Ed25519),
            other => Err(KeyError::UnsupportedKeyType(other.to_string())),
        }
    }
}

/// Private key material able to produce signatures.
#[derive(Clone)]
pub enum KeyPair {
    /// SECP256K1 signing key.
    Secp256k1(k256::ecdsa::SigningKey),
    /// ED25519 signing key.
    Ed25519(ed25519_dalek::SigningKey),
}

impl KeyPair {
    /// Size of the raw private key for both supported kinds.
    pub const SECRET_BYTES: usize = 32;

    /// Build a key from raw 32-byte secret material.
    pub fn from_bytes(key_type: KeyType, bytes: &[u8]) -> Result<Self, KeyError> {
        let secret: [u8; 32] = bytes
            .try_into()
            .map_err(|_| KeyError::InvalidLength {
                expected: Self::SECRET_BYTES,
                actual: bytes.len(),
            })?;

        match key_type {
            KeyType::Secp256k1 => k256::ecdsa::SigningKey::from_bytes((&secret).into())
                .map(KeyPair::Secp256k1)
                .map_err(|e| KeyError::InvalidKey(e.to_string())),
            KeyType::Ed25519 => Ok(KeyPair::Ed25519(ed25519_dalek::SigningKey::from_bytes(
                &secret,
            ))),
        }
    }

    /// Parse a hex-encoded secret, with or without a `0x` prefix.
    pub fn from_hex(key_type: KeyType, input: &str) -> Result<Self, KeyError> {
        let trimmed = input.trim();
        let hex_str = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);
        let decoded = hex::decode(hex_str).map_err(|_| KeyError::InvalidHex)?;
        Self::from_bytes(key_type, &decoded)
    }

    /// Generate a keypair from a seed (for testing and generated pools).
    ///
    /// A SECP256K1 seed must be a valid non-zero scalar below the curve order,
    /// which holds for every seed that is not all-zero or all-0xFF.
    pub fn from_seed(key_type: KeyType, seed: &[u8; 32]) -> Result<Self, KeyError> {
        Self::from_bytes(key_type, seed)
    }

    /// The kind of this key.
    pub fn key_type(&self) -> KeyType {
        match self {
            KeyPair::Secp256k1(_) => KeyType::Secp256k1,
            KeyPair::Ed25519(_) => KeyType::Ed25519,
        }
    }

    /// Sign a message.
    ///
    /// Both kinds are deterministic: signing the same bytes twice yields the
    /// same signature.
    pub fn sign(&self, message: &[u8]) -> Signature {
        match self {
            KeyPair::Secp256k1(signing_key) => {
                use k256::ecdsa::signature::Signer;
                let sig: k256::ecdsa::Signature = signing_key.sign(message);
                Signature(sig.to_bytes().to_vec())
            }
            KeyPair::Ed25519(signing_key) => {
                use ed25519_dalek::Signer;
                Signature(signing_key.sign(message).to_bytes().to_vec())
            }
        }
    }

    /// Get the public key.
    pub fn public_key(&self) -> PublicKey {
        match self {
            KeyPair::Secp256k1(signing_key) => {
                let point = signing_key.verifying_key().to_encoded_point(true);
                let mut bytes = [0u8; 33];
                bytes.copy_from_slice(point.as_bytes());
                PublicKey::Secp256k1(bytes)
            }
            KeyPair::Ed25519(signing_key) => {
                PublicKey::Ed25519(signing_key.verifying_key().to_bytes())
            }
        }
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never print secret material.
        write!(f, "KeyPair::{}({:?})", self.key_type(), self.public_key())
    }
}

/// A public key for signature verification.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, BasicSbor)]
pub enum PublicKey {
    /// SECP256K1 public key (33 bytes, SEC1 compressed).
    Secp256k1([u8; 33]),
    /// ED25519 public key (32 bytes).
    Ed25519([u8; 32]),
}

impl PublicKey {
    /// The kind of this key.
    pub fn key_type(&self) -> KeyType {
        match self {
            PublicKey::Secp256k1(_) => KeyType::Secp256k1,
            PublicKey::Ed25519(_) => KeyType::Ed25519,
        }
    }

    /// Protobuf type URL the ledger uses for this key kind.
    pub fn type_url(&self) -> &'static str {
        match self {
            PublicKey::Secp256k1(_) => "/cosmos.crypto.secp256k1.PubKey",
            PublicKey::Ed25519(_) => "/cosmos.crypto.ed25519.PubKey",
        }
    }

    /// Verify a signature.
    pub fn verify(&self, message: &[u8], signature: &Signature) -> bool {
        match self {
            PublicKey::Secp256k1(pk_bytes) => {
                use k256::ecdsa::signature::Verifier;
                let vk = match k256::ecdsa::VerifyingKey::from_sec1_bytes(pk_bytes) {
                    Ok(vk) => vk,
                    Err(_) => return false,
                };
                let sig = match k256::ecdsa::Signature::from_slice(signature.as_bytes()) {
                    Ok(sig) => sig,
                    Err(_) => return false,
                };
                vk.verify(message, &sig).is_ok()
            }
            PublicKey::Ed25519(pk_bytes) => {
                use ed25519_dalek::Verifier;
                let vk = match ed25519_dalek::VerifyingKey::from_bytes(pk_bytes) {
                    Ok(vk) => vk,
                    Err(_) => return false,
                };
                let sig_array: [u8; 64] = match signature.as_bytes().try_into() {
                    Ok(arr) => arr,
                    Err(_) => return false,
                };
                let sig = ed25519_dalek::Signature::from_bytes(&sig_array);
                vk.verify(message, &sig).is_ok()
            }
        }
    }

    /// Get the raw bytes of this public key.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            PublicKey::Secp256k1(bytes) => bytes.as_slice(),
            PublicKey::Ed25519(bytes) => bytes.as_slice(),
        }
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PublicKey::Secp256k1(bytes) => {
                write!(f, "PublicKey::Secp256k1({})", hex::encode(bytes))
            }
            PublicKey::Ed25519(bytes) => {
                write!(f, "PublicKey::Ed25519({})", hex::encode(bytes))
            }
        }
    }
}

/// A signature over a canonical signing payload.
///
/// Empty until the real-sign phase fills it in.
#[derive(Clone, Default, PartialEq, Eq, BasicSbor)]
#[sbor(transparent)]
pub struct Signature(Vec<u8>);

impl Signature {
    /// The empty placeholder signature.
    pub fn empty() -> Self {
        Signature(Vec::new())
    }

    /// Wrap raw signature bytes.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Signature(bytes)
    }

    /// Whether this is the placeholder.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Get signature as byte slice.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Get signature as bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.0.clone()
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("Signature(empty)");
        }
        let hex = hex::encode(&self.0);
        write!(f, "Signature({}..)", &hex[..hex.len().min(16)])
    }
}

/// Errors that can occur when loading key material.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeyError {
    /// Key kind outside the supported set.
    #[error("Unsupported key type: {0} (expected secp256k1 or ed25519)")]
    UnsupportedKeyType(String),

    /// Wrong secret length.
    #[error("Invalid key length: expected {expected}, got {actual}")]
    InvalidLength {
        /// Expected length.
        expected: usize,
        /// Actual length.
        actual: usize,
    },

    /// Secret rejected by the curve implementation.
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// Invalid hex characters.
    #[error("Invalid hex string")]
    InvalidHex,
}
