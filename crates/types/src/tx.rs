//! Transaction model and builder.
//!
//! Mirrors the ledger's transaction layout:
//!
//! ```text
//! Tx
//! ├── body:      TxBody   { messages, memo, timeout_height }
//! ├── auth_info: AuthInfo { signer_infos, fee }
//! └── signatures: one per signer info, same order
//! ```
//!
//! The signed payload covers the encoded `body` *and* the encoded
//! `auth_info`, so the signer infos (public key, sign mode, sequence) must be
//! in place before a signature can be computed.

use crate::{Coin, Msg, PublicKey, Signature};
use sbor::prelude::*;

/// Messages plus the fields every message in the transaction shares.
#[derive(Debug, Clone, Default, PartialEq, Eq, BasicSbor)]
pub struct TxBody {
    pub messages: Vec<Msg>,
    pub memo: String,
    /// Block height after which the transaction is invalid. Zero disables it.
    pub timeout_height: u64,
}

/// Flat fee paid for the transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq, BasicSbor)]
pub struct Fee {
    pub amount: Vec<Coin>,
    pub gas_limit: u64,
}

/// How a signer's signature is computed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, BasicSbor)]
pub enum SignMode {
    /// Signature over the encoded [`SignDoc`](crate::SignDoc).
    #[default]
    Direct,
}

/// Per-signer metadata carried in the auth info.
#[derive(Debug, Clone, PartialEq, Eq, BasicSbor)]
pub struct SignerInfo {
    pub public_key: PublicKey,
    pub mode: SignMode,
    pub sequence: u64,
}

/// Signer list and fee.
#[derive(Debug, Clone, Default, PartialEq, Eq, BasicSbor)]
pub struct AuthInfo {
    pub signer_infos: Vec<SignerInfo>,
    pub fee: Fee,
}

/// A complete transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq, BasicSbor)]
pub struct Tx {
    pub body: TxBody,
    pub auth_info: AuthInfo,
    pub signatures: Vec<Signature>,
}

impl Tx {
    /// Whether every signer slot carries a non-empty signature.
    pub fn is_fully_signed(&self) -> bool {
        !self.signatures.is_empty()
            && self.signatures.len() == self.auth_info.signer_infos.len()
            && self.signatures.iter().all(|sig| !sig.is_empty())
    }
}

/// A signature together with the signer metadata it was made under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureV2 {
    pub public_key: PublicKey,
    pub mode: SignMode,
    pub signature: Signature,
    pub sequence: u64,
}

impl SignatureV2 {
    /// Signer metadata with an empty signature.
    pub fn placeholder(public_key: PublicKey, mode: SignMode, sequence: u64) -> Self {
        Self {
            public_key,
            mode,
            signature: Signature::empty(),
            sequence,
        }
    }
}

/// Incrementally assembles a [`Tx`].
#[derive(Debug, Clone, Default)]
pub struct TxBuilder {
    tx: Tx,
}

impl TxBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the message set. At least one message is required.
    pub fn set_msgs(&mut self, msgs: Vec<Msg>) -> Result<(), TxBuildError> {
        if msgs.is_empty() {
            return Err(TxBuildError::NoMessages);
        }
        self.tx.body.messages = msgs;
        Ok(())
    }

    pub fn set_fee(&mut self, amount: Vec<Coin>) {
        self.tx.auth_info.fee.amount = amount;
    }

    pub fn set_gas_limit(&mut self, gas_limit: u64) {
        self.tx.auth_info.fee.gas_limit = gas_limit;
    }

    pub fn set_memo(&mut self, memo: impl Into<String>) {
        self.tx.body.memo = memo.into();
    }

    pub fn set_timeout_height(&mut self, height: u64) {
        self.tx.body.timeout_height = height;
    }

    /// Replace the signer list.
    ///
    /// Signer infos and signature slots are written together, in the given
    /// order, so the two lists always have the same length.
    pub fn set_signatures(&mut self, signatures: Vec<SignatureV2>) -> Result<(), TxBuildError> {
        if signatures.is_empty() {
            return Err(TxBuildError::NoSigners);
        }

        let (infos, sigs): (Vec<_>, Vec<_>) = signatures
            .into_iter()
            .map(|sig| {
                (
                    SignerInfo {
                        public_key: sig.public_key,
                        mode: sig.mode,
                        sequence: sig.sequence,
                    },
                    sig.signature,
                )
            })
            .unzip();

        self.tx.auth_info.signer_infos = infos;
        self.tx.signatures = sigs;
        Ok(())
    }

    /// The transaction as assembled so far.
    pub fn tx(&self) -> &Tx {
        &self.tx
    }

    pub fn into_tx(self) -> Tx {
        self.tx
    }
}

/// Errors that can occur while assembling a transaction.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TxBuildError {
    #[error("transaction must contain at least one message")]
    NoMessages,

    #[error("transaction must have at least one signer")]
    NoSigners,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{KeyPair, KeyType, MsgSend};

    fn send_msg() -> Msg {
        Msg::BankSend(MsgSend {
            from_address: "manifest1a".into(),
            to_address: "manifest1b".into(),
            amount: vec![Coin::new("umfx", 1)],
        })
    }

    #[test]
    fn test_builder_rejects_empty_messages() {
        let mut builder = TxBuilder::new();
        assert_eq!(builder.set_msgs(vec![]), Err(TxBuildError::NoMessages));
    }

    #[test]
    fn test_builder_sets_fields() {
        let mut builder = TxBuilder::new();
        builder.set_msgs(vec![send_msg()]).unwrap();
        builder.set_fee(vec![Coin::new("umfx", 5)]);
        builder.set_gas_limit(200_000);
        builder.set_memo("hello");
        builder.set_timeout_height(99);

        let tx = builder.into_tx();
        assert_eq!(tx.body.messages.len(), 1);
        assert_eq!(tx.body.memo, "hello");
        assert_eq!(tx.body.timeout_height, 99);
        assert_eq!(tx.auth_info.fee.amount, vec![Coin::new("umfx", 5)]);
        assert_eq!(tx.auth_info.fee.gas_limit, 200_000);
        assert!(!tx.is_fully_signed());
    }

    #[test]
    fn test_set_signatures_keeps_lists_aligned() {
        let key = KeyPair::from_seed(KeyType::Secp256k1, &[4u8; 32]).unwrap();
        let mut builder = TxBuilder::new();
        builder.set_msgs(vec![send_msg()]).unwrap();

        builder
            .set_signatures(vec![SignatureV2::placeholder(
                key.public_key(),
                SignMode::Direct,
                7,
            )])
            .unwrap();
        assert_eq!(builder.tx().auth_info.signer_infos.len(), 1);
        assert_eq!(builder.tx().signatures, vec![Signature::empty()]);
        assert_eq!(builder.tx().auth_info.signer_infos[0].sequence, 7);
        assert!(!builder.tx().is_fully_signed());

        let mut real = SignatureV2::placeholder(key.public_key(), SignMode::Direct, 7);
        real.signature = key.sign(b"payload");
        builder.set_signatures(vec![real]).unwrap();
        assert!(builder.tx().is_fully_signed());

        assert_eq!(builder.set_signatures(vec![]), Err(TxBuildError::NoSigners));
    }
}
