//! Collaborators that always fail.
//!
//! Used to check that failures surface as per-call errors and leave the
//! caller usable.

use std::sync::atomic::{AtomicUsize, Ordering};

use manifest_load_types::{
    AccountInfo, AccountRetriever, Address, CodecError, RetrieverError, Tx, TxEncoder,
};

/// Retriever whose every lookup fails with a transport error.
#[derive(Debug, Default)]
pub struct FailingRetriever {
    attempts: AtomicUsize,
}

impl FailingRetriever {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::Relaxed)
    }
}

impl AccountRetriever for FailingRetriever {
    fn account_info(&self, _address: &Address) -> Result<AccountInfo, RetrieverError> {
        self.attempts.fetch_add(1, Ordering::Relaxed);
        Err(RetrieverError::Transport("connection refused".to_string()))
    }
}

/// Encoder that rejects every transaction.
#[derive(Debug, Default, Clone, Copy)]
pub struct RejectingEncoder;

impl TxEncoder for RejectingEncoder {
    fn encode(&self, _tx: &Tx) -> Result<Vec<u8>, CodecError> {
        Err(CodecError::SborEncode("rejected by test encoder".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::watch_only_account;

    #[test]
    fn test_failing_retriever_counts_attempts() {
        let retriever = FailingRetriever::new();
        let account = watch_only_account("a", 1);

        assert!(retriever.account_info(account.address()).is_err());
        assert!(retriever.account_info(account.address()).is_err());
        assert_eq!(retriever.attempts(), 2);
    }

    #[test]
    fn test_rejecting_encoder() {
        assert!(matches!(
            RejectingEncoder.encode(&Tx::default()),
            Err(CodecError::SborEncode(_))
        ));
    }
}
