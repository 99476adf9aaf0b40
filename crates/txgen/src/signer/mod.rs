//! Two-phase signing pipeline.
//!
//! The signed payload covers the auth info, and the auth info lists every
//! signer's public key and sequence. Signer metadata therefore has to be in
//! the transaction before the real signature can be computed:
//!
//! ```text
//! build ──► placeholder ──► real sign ──► encode
//!   │            │               │            │
//!   │            │               │            └─ TxEncoder -> bytes
//!   │            │               └─ sign(SignDoc), replace empty signature
//!   │            └─ signer info {pubkey, sequence}, empty signature
//!   └─ msgs, fee, gas limit, memo, timeout height
//! ```
//!
//! The sender handed in must be the message's signer. Each call runs the
//! phases in order, once, with no retries. A failure only affects that call.

use crate::config::Params;
use manifest_load_types::{
    sign_doc_bytes, Account, AccountInfo, AccountRetriever, CodecError, Msg, RetrieverError,
    SborTxCodec, SignDocError, SignMode, SignatureV2, SignerData, Tx, TxBuildError, TxBuilder,
    TxEncoder,
};
use std::sync::Arc;
use tracing::trace;

/// Where account number and sequence come from.
#[derive(Clone)]
pub enum AccountContextSource {
    /// Same values for every sender. Runs fully offline.
    Fixed { account_number: u64, sequence: u64 },
    /// Looked up per transaction. Lookups are not cached or retried.
    Online(Arc<dyn AccountRetriever>),
}

impl Default for AccountContextSource {
    fn default() -> Self {
        AccountContextSource::Fixed {
            account_number: 0,
            sequence: 0,
        }
    }
}

impl std::fmt::Debug for AccountContextSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AccountContextSource::Fixed {
                account_number,
                sequence,
            } => f
                .debug_struct("Fixed")
                .field("account_number", account_number)
                .field("sequence", sequence)
                .finish(),
            AccountContextSource::Online(_) => f.write_str("Online"),
        }
    }
}

/// Chain id, account number and sequence for one signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountContext {
    pub chain_id: String,
    pub account_number: u64,
    pub sequence: u64,
}

/// Turns an unsigned message into signed transport bytes.
#[derive(Clone)]
pub struct SigningPipeline {
    chain_id: String,
    context: AccountContextSource,
    encoder: Arc<dyn TxEncoder>,
}

impl std::fmt::Debug for SigningPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningPipeline")
            .field("chain_id", &self.chain_id)
            .field("context", &self.context)
            .finish()
    }
}

impl SigningPipeline {
    pub fn new(
        chain_id: impl Into<String>,
        context: AccountContextSource,
        encoder: Arc<dyn TxEncoder>,
    ) -> Self {
        Self {
            chain_id: chain_id.into(),
            context,
            encoder,
        }
    }

    /// Fixed account number 0 and sequence 0, SBOR wire codec.
    pub fn offline(chain_id: impl Into<String>) -> Self {
        Self::new(
            chain_id,
            AccountContextSource::default(),
            Arc::new(SborTxCodec::new()),
        )
    }

    pub fn chain_id(&self) -> &str {
        &self.chain_id
    }

    pub fn context_source(&self) -> &AccountContextSource {
        &self.context
    }

    /// Sign `msg` for `sender` and encode it.
    pub fn sign(
        &self,
        sender: &Account,
        msg: Msg,
        params: &Params,
        memo: &str,
    ) -> Result<Vec<u8>, PipelineError> {
        let tx = self.sign_tx(sender, msg, params, memo)?;
        Ok(self.encode(&tx)?)
    }

    /// The build, placeholder and real-sign phases.
    pub fn sign_tx(
        &self,
        sender: &Account,
        msg: Msg,
        params: &Params,
        memo: &str,
    ) -> Result<Tx, SigningError> {
        if !sender.can_sign() {
            return Err(SigningError::MissingPrivateKey(sender.name().to_string()));
        }
        if msg.signer() != sender.address().as_str() {
            return Err(SigningError::SignerMismatch {
                sender: sender.address().to_string(),
                signer: msg.signer().to_string(),
            });
        }

        let mut builder = Self::build(msg, params, memo)?;
        let context = self.account_context(sender)?;
        Self::attach_placeholder(&mut builder, sender, &context)?;
        Self::sign_with_key(&mut builder, sender, &context)?;
        Ok(builder.into_tx())
    }

    /// Build phase: message, fee, gas limit, memo and timeout height.
    pub fn build(msg: Msg, params: &Params, memo: &str) -> Result<TxBuilder, SigningError> {
        let mut builder = TxBuilder::new();
        builder.set_msgs(vec![msg])?;
        builder.set_fee(vec![params.fee_coin()]);
        builder.set_gas_limit(params.gas_limit);
        builder.set_memo(memo);
        builder.set_timeout_height(params.timeout_height);
        trace!(gas_limit = params.gas_limit, fee = params.fee, "Built transaction shell");
        Ok(builder)
    }

    /// Account context for `sender` from the configured source.
    pub fn account_context(&self, sender: &Account) -> Result<AccountContext, SigningError> {
        let AccountInfo {
            account_number,
            sequence,
        } = match &self.context {
            AccountContextSource::Fixed {
                account_number,
                sequence,
            } => AccountInfo {
                account_number: *account_number,
                sequence: *sequence,
            },
            AccountContextSource::Online(retriever) => retriever
                .account_info(sender.address())
                .map_err(|source| SigningError::AccountLookup {
                    address: sender.address().to_string(),
                    source,
                })?,
        };

        Ok(AccountContext {
            chain_id: self.chain_id.clone(),
            account_number,
            sequence,
        })
    }

    /// Placeholder phase: record the signer with an empty signature.
    pub fn attach_placeholder(
        builder: &mut TxBuilder,
        sender: &Account,
        context: &AccountContext,
    ) -> Result<(), SigningError> {
        builder.set_signatures(vec![SignatureV2::placeholder(
            sender.public_key().clone(),
            SignMode::Direct,
            context.sequence,
        )])?;
        trace!(sender = %sender.address(), sequence = context.sequence, "Attached placeholder signature");
        Ok(())
    }

    /// Real-sign phase: sign the canonical payload and replace the
    /// placeholder.
    pub fn sign_with_key(
        builder: &mut TxBuilder,
        sender: &Account,
        context: &AccountContext,
    ) -> Result<(), SigningError> {
        let key = sender
            .key()
            .ok_or_else(|| SigningError::MissingPrivateKey(sender.name().to_string()))?;

        let signer = SignerData {
            chain_id: context.chain_id.clone(),
            account_number: context.account_number,
            sequence: context.sequence,
            public_key: sender.public_key().clone(),
        };
        let payload = sign_doc_bytes(builder.tx(), &signer)?;

        builder.set_signatures(vec![SignatureV2 {
            public_key: signer.public_key,
            mode: SignMode::Direct,
            signature: key.sign(&payload),
            sequence: context.sequence,
        }])?;
        trace!(sender = %sender.address(), payload_len = payload.len(), "Signed transaction");
        Ok(())
    }

    /// Encode phase.
    pub fn encode(&self, tx: &Tx) -> Result<Vec<u8>, EncodingError> {
        Ok(self.encoder.encode(tx)?)
    }
}

/// Errors from the build, placeholder and real-sign phases.
#[derive(Debug, thiserror::Error)]
pub enum SigningError {
    #[error("Account {0} has no private key")]
    MissingPrivateKey(String),

    #[error("Sender {sender} is not the message signer {signer}")]
    SignerMismatch { sender: String, signer: String },

    #[error("Transaction assembly failed: {0}")]
    Build(#[from] TxBuildError),

    #[error("Account lookup for {address} failed: {source}")]
    AccountLookup {
        address: String,
        #[source]
        source: RetrieverError,
    },

    #[error("Signing payload: {0}")]
    SignDoc(#[from] SignDocError),
}

/// The wire encoder rejected a finalized transaction.
#[derive(Debug, thiserror::Error)]
#[error("Wire encoding failed: {0}")]
pub struct EncodingError(#[from] pub CodecError);

/// Failure of [`SigningPipeline::sign`], by phase.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Signing(#[from] SigningError),

    #[error(transparent)]
    Encoding(#[from] EncodingError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use manifest_load_test_helpers::faulty::{FailingRetriever, RejectingEncoder};
    use manifest_load_test_helpers::fixtures::{watch_only_account, InMemoryRetriever};
    use manifest_load_test_helpers::TestAccounts;
    use manifest_load_types::{Coin, KeyType, MsgSend, TxDecoder};

    fn send(from: &Account, to: &Account) -> Msg {
        MsgSend {
            from_address: from.address().to_string(),
            to_address: to.address().to_string(),
            amount: vec![Coin::new("umfx", 1)],
        }
        .into()
    }

    fn signer_data(sender: &Account, ctx: &AccountContext) -> SignerData {
        SignerData {
            chain_id: ctx.chain_id.clone(),
            account_number: ctx.account_number,
            sequence: ctx.sequence,
            public_key: sender.public_key().clone(),
        }
    }

    #[test]
    fn test_offline_signing_deterministic() {
        for key_type in [KeyType::Secp256k1, KeyType::Ed25519] {
            let accounts = TestAccounts::new(2, 1, key_type);
            let (a, b) = (accounts.account(0), accounts.account(1));
            let pipeline = SigningPipeline::offline("test-chain");
            let params = Params::default();

            let first = pipeline.sign(a, send(a, b), &params, "").unwrap();
            let second = pipeline.sign(a, send(a, b), &params, "").unwrap();
            assert!(!first.is_empty());
            assert_eq!(first, second);
        }
    }

    #[test]
    fn test_signature_verifies_over_sign_doc() {
        let accounts = TestAccounts::new(2, 2, KeyType::Secp256k1);
        let (a, b) = (accounts.account(0), accounts.account(1));
        let pipeline = SigningPipeline::offline("test-chain");

        let tx = pipeline
            .sign_tx(a, send(a, b), &Params::default(), "memo")
            .unwrap();
        assert!(tx.is_fully_signed());
        assert_eq!(tx.body.memo, "memo");
        assert_eq!(tx.auth_info.signer_infos[0].sequence, 0);

        let ctx = pipeline.account_context(a).unwrap();
        let payload = sign_doc_bytes(&tx, &signer_data(a, &ctx)).unwrap();
        assert!(a.public_key().verify(&payload, &tx.signatures[0]));
    }

    #[test]
    fn test_phases_in_order() {
        let accounts = TestAccounts::new(2, 3, KeyType::Ed25519);
        let (a, b) = (accounts.account(0), accounts.account(1));
        let pipeline = SigningPipeline::offline("test-chain");
        let ctx = pipeline.account_context(a).unwrap();

        let mut builder = SigningPipeline::build(send(a, b), &Params::default(), "").unwrap();
        assert!(builder.tx().auth_info.signer_infos.is_empty());

        SigningPipeline::attach_placeholder(&mut builder, a, &ctx).unwrap();
        assert!(builder.tx().signatures[0].is_empty());
        let before = sign_doc_bytes(builder.tx(), &signer_data(a, &ctx)).unwrap();

        SigningPipeline::sign_with_key(&mut builder, a, &ctx).unwrap();
        assert!(builder.tx().is_fully_signed());
        let after = sign_doc_bytes(builder.tx(), &signer_data(a, &ctx)).unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn test_real_sign_without_placeholder_fails() {
        let accounts = TestAccounts::new(2, 3, KeyType::Ed25519);
        let (a, b) = (accounts.account(0), accounts.account(1));
        let ctx = SigningPipeline::offline("test-chain").account_context(a).unwrap();

        let mut builder = SigningPipeline::build(send(a, b), &Params::default(), "").unwrap();
        assert!(matches!(
            SigningPipeline::sign_with_key(&mut builder, a, &ctx),
            Err(SigningError::SignDoc(SignDocError::SignerNotFound))
        ));
    }

    #[test]
    fn test_missing_private_key() {
        let accounts = TestAccounts::new(1, 4, KeyType::Secp256k1);
        let watcher = watch_only_account("watcher", 8);
        let pipeline = SigningPipeline::offline("test-chain");

        let err = pipeline
            .sign(&watcher, send(&watcher, accounts.account(0)), &Params::default(), "")
            .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Signing(SigningError::MissingPrivateKey(name)) if name == "watcher"
        ));
    }

    #[test]
    fn test_sender_must_be_message_signer() {
        let accounts = TestAccounts::new(2, 9, KeyType::Secp256k1);
        let (a, b) = (accounts.account(0), accounts.account(1));
        let pipeline = SigningPipeline::offline("test-chain");

        let err = pipeline
            .sign(a, send(b, a), &Params::default(), "")
            .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Signing(SigningError::SignerMismatch { ref sender, ref signer })
                if sender == a.address().as_str() && signer == b.address().as_str()
        ));

        // Same pipeline still signs a well-formed message afterwards
        assert!(pipeline.sign(b, send(b, a), &Params::default(), "").is_ok());
    }

    #[test]
    fn test_online_context_used() {
        let accounts = TestAccounts::new(2, 5, KeyType::Secp256k1);
        let (a, b) = (accounts.account(0), accounts.account(1));
        let retriever = Arc::new(InMemoryRetriever::new());
        retriever.set(
            a.address(),
            AccountInfo {
                account_number: 12,
                sequence: 34,
            },
        );
        let pipeline = SigningPipeline::new(
            "manifest-1",
            AccountContextSource::Online(retriever.clone()),
            Arc::new(SborTxCodec::new()),
        );

        let bytes = pipeline.sign(a, send(a, b), &Params::default(), "").unwrap();
        let tx = SborTxCodec.decode(&bytes).unwrap();
        assert_eq!(tx.auth_info.signer_infos[0].sequence, 34);

        let ctx = AccountContext {
            chain_id: "manifest-1".into(),
            account_number: 12,
            sequence: 34,
        };
        let payload = sign_doc_bytes(&tx, &signer_data(a, &ctx)).unwrap();
        assert!(a.public_key().verify(&payload, &tx.signatures[0]));
        assert_eq!(retriever.lookups(), 1);
    }

    #[test]
    fn test_account_lookup_failure_is_per_call() {
        let accounts = TestAccounts::new(2, 6, KeyType::Secp256k1);
        let (a, b) = (accounts.account(0), accounts.account(1));
        let retriever = Arc::new(FailingRetriever::new());
        let pipeline = SigningPipeline::new(
            "manifest-1",
            AccountContextSource::Online(retriever.clone()),
            Arc::new(SborTxCodec::new()),
        );

        for _ in 0..2 {
            assert!(matches!(
                pipeline.sign(a, send(a, b), &Params::default(), ""),
                Err(PipelineError::Signing(SigningError::AccountLookup { .. }))
            ));
        }
        assert_eq!(retriever.attempts(), 2);
    }

    #[test]
    fn test_encoder_rejection() {
        let accounts = TestAccounts::new(2, 7, KeyType::Secp256k1);
        let (a, b) = (accounts.account(0), accounts.account(1));
        let pipeline = SigningPipeline::new(
            "test-chain",
            AccountContextSource::default(),
            Arc::new(RejectingEncoder),
        );

        assert!(matches!(
            pipeline.sign(a, send(a, b), &Params::default(), ""),
            Err(PipelineError::Encoding(_))
        ));
    }
}
