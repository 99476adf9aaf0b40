//! REST client for on-chain account state.

mod types;

pub use types::{AccountAny, AccountResponse, BaseAccount, ErrorResponse};

use manifest_load_types::{AccountInfo, AccountRetriever, Address, RetrieverError};
use std::time::Duration;
use tracing::debug;

/// Default per-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Looks up account number and sequence through a node's REST gateway.
#[derive(Debug, Clone)]
pub struct LcdClient {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl LcdClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, RetrieverError> {
        Self::with_timeout(base_url, DEFAULT_REQUEST_TIMEOUT)
    }

    pub fn with_timeout(
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, RetrieverError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RetrieverError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn account_url(&self, address: &Address) -> String {
        format!("{}/cosmos/auth/v1beta1/accounts/{}", self.base_url, address)
    }
}

impl AccountRetriever for LcdClient {
    fn account_info(&self, address: &Address) -> Result<AccountInfo, RetrieverError> {
        let url = self.account_url(address);
        debug!(%url, "Fetching account");

        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|e| RetrieverError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|e| RetrieverError::Transport(e.to_string()))?;

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(RetrieverError::NotFound(address.to_string()));
        }
        if !status.is_success() {
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| format!("code {}: {}", e.code, e.message))
                .unwrap_or(body);
            return Err(RetrieverError::Transport(format!("HTTP {status}: {message}")));
        }

        parse_account_info(&body)
    }
}

/// Extract account number and sequence from an account response body.
pub fn parse_account_info(body: &str) -> Result<AccountInfo, RetrieverError> {
    let response: AccountResponse = serde_json::from_str(body)
        .map_err(|e| RetrieverError::InvalidResponse(e.to_string()))?;

    response.account.info().ok_or_else(|| {
        RetrieverError::InvalidResponse(format!(
            "no account number in {}",
            response.account.type_url
        ))
    })
}
