//! Canonical signing payload.
//!
//! A signer signs the SBOR encoding of a [`SignDoc`]:
//!
//! ```text
//! SignDoc { body_bytes, auth_info_bytes, chain_id, account_number }
//! ```
//!
//! where `body_bytes` and `auth_info_bytes` are the SBOR encodings of the
//! transaction's body and auth info. The chain id and account number bind the
//! signature to one chain and one account; the sequence is bound through the
//! signer info inside `auth_info_bytes`.

use crate::{PublicKey, Tx};
use sbor::prelude::*;

/// The document a signature is computed over.
#[derive(Debug, Clone, PartialEq, Eq, BasicSbor)]
pub struct SignDoc {
    pub body_bytes: Vec<u8>,
    pub auth_info_bytes: Vec<u8>,
    pub chain_id: String,
    pub account_number: u64,
}

/// Account context plus the signer's public key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignerData {
    pub chain_id: String,
    pub account_number: u64,
    pub sequence: u64,
    pub public_key: PublicKey,
}

/// Build the [`SignDoc`] for `signer` over `tx`.
///
/// The signer's public key must already be recorded in the transaction's
/// signer infos with the same sequence.
pub fn sign_doc(tx: &Tx, signer: &SignerData) -> Result<SignDoc, SignDocError> {
    let recorded = tx
        .auth_info
        .signer_infos
        .iter()
        .find(|info| info.public_key == signer.public_key)
        .ok_or(SignDocError::SignerNotFound)?;

    if recorded.sequence != signer.sequence {
        return Err(SignDocError::SequenceMismatch {
            recorded: recorded.sequence,
            expected: signer.sequence,
        });
    }

    Ok(SignDoc {
        body_bytes: encode(&tx.body)?,
        auth_info_bytes: encode(&tx.auth_info)?,
        chain_id: signer.chain_id.clone(),
        account_number: signer.account_number,
    })
}

/// Encoded [`SignDoc`], the bytes handed to [`KeyPair::sign`](crate::KeyPair::sign).
pub fn sign_doc_bytes(tx: &Tx, signer: &SignerData) -> Result<Vec<u8>, SignDocError> {
    encode(&sign_doc(tx, signer)?)
}

fn encode<T: sbor::BasicEncode>(value: &T) -> Result<Vec<u8>, SignDocError> {
    sbor::basic_encode(value).map_err(|e| SignDocError::Encode(format!("{:?}", e)))
}

/// Errors that can occur while building the signing payload.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignDocError {
    #[error("signer public key not present in transaction signer infos")]
    SignerNotFound,

    #[error("signer info records sequence {recorded}, expected {expected}")]
    SequenceMismatch { recorded: u64, expected: u64 },

    #[error("SBOR encode error: {0}")]
    Encode(String),
}
