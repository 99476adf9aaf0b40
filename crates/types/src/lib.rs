//! Chain primitives for the Manifest ledger load tester.
//!
//! This crate provides the types the transaction generator builds on:
//!
//! - **Primitives**: keys, signatures, hashes, bech32 addresses
//! - **Ledger data**: coins and the messages the generator can emit
//! - **Transactions**: the transaction model, its builder, the canonical
//!   signing payload and the wire codec
//! - **Accounts**: signer identities and the account-state lookup seam
//!
//! It does not depend on any other workspace crate.

mod account;
mod address;
mod codec;
mod coin;
mod crypto;
mod hash;
mod msg;
mod signing;
mod tx;

pub use account::{Account, AccountInfo, AccountRetriever, RetrieverError};
pub use address::{Address, AddressError, ADDRESS_BYTES, DEFAULT_ACCOUNT_PREFIX};
pub use codec::{CodecError, SborTxCodec, TxDecoder, TxEncoder, TxRaw};
pub use coin::{validate_denom, Coin, DenomError};
pub use crypto::{KeyError, KeyPair, KeyType, PublicKey, Signature};
pub use hash::Hash;
pub use msg::{MemberRequest, Msg, MsgCreateGroup, MsgSend};
pub use signing::{sign_doc, sign_doc_bytes, SignDoc, SignDocError, SignerData};
pub use tx::{AuthInfo, Fee, SignMode, SignatureV2, SignerInfo, Tx, TxBody, TxBuildError, TxBuilder};
