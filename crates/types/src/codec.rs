//! Transaction wire codec.
//!
//! # Wire Format
//!
//! A transaction travels as SBOR-encoded [`TxRaw`]:
//!
//! ```text
//! TxRaw { body_bytes, auth_info_bytes, signatures }
//! ```
//!
//! `body_bytes` and `auth_info_bytes` are exactly the bytes that went into
//! the [`SignDoc`](crate::SignDoc), so a receiver can verify signatures
//! without re-encoding.

use crate::{AuthInfo, Tx, TxBody};
use sbor::prelude::*;
use thiserror::Error;

/// Transaction as it appears on the wire.
#[derive(Debug, Clone, PartialEq, Eq, BasicSbor)]
pub struct TxRaw {
    pub body_bytes: Vec<u8>,
    pub auth_info_bytes: Vec<u8>,
    pub signatures: Vec<Vec<u8>>,
}

/// Errors that can occur during transaction encoding/decoding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("SBOR decode error: {0}")]
    SborDecode(String),

    #[error("SBOR encode error: {0}")]
    SborEncode(String),

    #[error("transaction carries no signatures")]
    Unsigned,

    #[error("{signatures} signatures for {signers} signers")]
    SignatureCountMismatch { signatures: usize, signers: usize },

    #[error("signature {index} is still a placeholder")]
    PlaceholderSignature { index: usize },
}

/// Turns a finalized transaction into transport bytes.
pub trait TxEncoder: Send + Sync {
    fn encode(&self, tx: &Tx) -> Result<Vec<u8>, CodecError>;
}

/// Turns transport bytes back into a transaction.
pub trait TxDecoder: Send + Sync {
    fn decode(&self, bytes: &[u8]) -> Result<Tx, CodecError>;
}

/// SBOR codec over [`TxRaw`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SborTxCodec;

impl SborTxCodec {
    pub fn new() -> Self {
        Self
    }

    /// Split an encoded transaction into its raw parts.
    pub fn decode_raw(bytes: &[u8]) -> Result<TxRaw, CodecError> {
        sbor_decode(bytes)
    }
}

fn sbor_encode<T: sbor::BasicEncode>(value: &T) -> Result<Vec<u8>, CodecError> {
    sbor::basic_encode(value).map_err(|e| CodecError::SborEncode(format!("{:?}", e)))
}

fn sbor_decode<T: sbor::BasicDecode>(bytes: &[u8]) -> Result<T, CodecError> {
    sbor::basic_decode(bytes).map_err(|e| CodecError::SborDecode(format!("{:?}", e)))
}

impl TxEncoder for SborTxCodec {
    fn encode(&self, tx: &Tx) -> Result<Vec<u8>, CodecError> {
        if tx.signatures.is_empty() {
            return Err(CodecError::Unsigned);
        }
        if tx.signatures.len() != tx.auth_info.signer_infos.len() {
            return Err(CodecError::SignatureCountMismatch {
                signatures: tx.signatures.len(),
                signers: tx.auth_info.signer_infos.len(),
            });
        }
        if let Some(index) = tx.signatures.iter().position(|sig| sig.is_empty()) {
            return Err(CodecError::PlaceholderSignature { index });
        }

        let raw = TxRaw {
            body_bytes: sbor_encode(&tx.body)?,
            auth_info_bytes: sbor_encode(&tx.auth_info)?,
            signatures: tx.signatures.iter().map(|sig| sig.to_bytes()).collect(),
        };
        sbor_encode(&raw)
    }
}

impl TxDecoder for SborTxCodec {
    fn decode(&self, bytes: &[u8]) -> Result<Tx, CodecError> {
        let raw = Self::decode_raw(bytes)?;
        let body: TxBody = sbor_decode(&raw.body_bytes)?;
        let auth_info: AuthInfo = sbor_decode(&raw.auth_info_bytes)?;

        Ok(Tx {
            body,
            auth_info,
            signatures: raw
                .signatures
                .into_iter()
                .map(crate::Signature::from_bytes)
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        sign_doc_bytes, Coin, Hash, KeyPair, KeyType, MemberRequest, MsgCreateGroup, SignMode,
        SignatureV2, SignerData, TxBuilder,
    };

    fn signed_tx() -> (KeyPair, Tx) {
        let key = KeyPair::from_seed(KeyType::Secp256k1, &[8u8; 32]).unwrap();
        let mut builder = TxBuilder::new();
        builder
            .set_msgs(vec![MsgCreateGroup {
                admin: "manifest1admin".into(),
                members: vec![MemberRequest {
                    address: "manifest1admin".into(),
                    weight: "1".into(),
                    metadata: "user".into(),
                }],
                metadata: "abc".into(),
            }
            .into()])
            .unwrap();
        builder.set_fee(vec![Coin::new("umfx", 5)]);
        builder.set_gas_limit(200_000);
        builder
            .set_signatures(vec![SignatureV2::placeholder(
                key.public_key(),
                SignMode::Direct,
                0,
            )])
            .unwrap();

        let signer = SignerData {
            chain_id: "test-chain".into(),
            account_number: 0,
            sequence: 0,
            public_key: key.public_key(),
        };
        let payload = sign_doc_bytes(builder.tx(), &signer).unwrap();
        let mut sig = SignatureV2::placeholder(key.public_key(), SignMode::Direct, 0);
        sig.signature = key.sign(&payload);
        builder.set_signatures(vec![sig]).unwrap();
        (key, builder.into_tx())
    }

    #[test]
    fn test_decode_restores_transaction() {
        let (_, tx) = signed_tx();
        let codec = SborTxCodec::new();
        let bytes = codec.encode(&tx).unwrap();
        assert_eq!(codec.decode(&bytes).unwrap(), tx);
    }

    #[test]
    fn test_raw_parts_verify_without_reencoding() {
        let (key, tx) = signed_tx();
        let bytes = SborTxCodec.encode(&tx).unwrap();
        let raw = SborTxCodec::decode_raw(&bytes).unwrap();

        let doc = crate::SignDoc {
            body_bytes: raw.body_bytes,
            auth_info_bytes: raw.auth_info_bytes,
            chain_id: "test-chain".into(),
            account_number: 0,
        };
        let payload = sbor::basic_encode(&doc).unwrap();
        let sig = crate::Signature::from_bytes(raw.signatures[0].clone());
        assert!(key.public_key().verify(&payload, &sig));
    }

    #[test]
    fn test_encode_rejects_unsigned() {
        let tx = Tx::default();
        assert_eq!(SborTxCodec.encode(&tx), Err(CodecError::Unsigned));
    }

    #[test]
    fn test_encode_rejects_placeholder_signature() {
        let (_, mut tx) = signed_tx();
        assert!(tx.is_fully_signed());
        tx.signatures = vec![crate::Signature::empty()];
        assert!(!tx.is_fully_signed());
        assert_eq!(
            SborTxCodec.encode(&tx),
            Err(CodecError::PlaceholderSignature { index: 0 })
        );
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(
            SborTxCodec.decode(&[0xde, 0xad, 0xbe, 0xef]),
            Err(CodecError::SborDecode(_))
        ));
    }

    #[test]
    fn test_tx_hash_stable() {
        let (_, tx) = signed_tx();
        let a = SborTxCodec.encode(&tx).unwrap();
        let b = SborTxCodec.encode(&tx).unwrap();
        assert_eq!(Hash::of_tx_bytes(&a), Hash::of_tx_bytes(&b));
    }
}
