//! Response types of the Cosmos REST (LCD) account endpoint.

use manifest_load_types::AccountInfo;
use serde::{Deserialize, Deserializer};

/// `GET /cosmos/auth/v1beta1/accounts/{address}`.
#[derive(Debug, Deserialize)]
pub struct AccountResponse {
    pub account: AccountAny,
}

/// The `Any`-wrapped account.
///
/// A plain `BaseAccount` carries the fields directly; vesting and module
/// accounts nest them under `base_account`, possibly inside
/// `base_vesting_account`.
#[derive(Debug, Deserialize)]
pub struct AccountAny {
    #[serde(rename = "@type", default)]
    pub type_url: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default, deserialize_with = "opt_u64_from_str")]
    pub account_number: Option<u64>,
    #[serde(default, deserialize_with = "opt_u64_from_str")]
    pub sequence: Option<u64>,
    #[serde(default)]
    pub base_account: Option<BaseAccount>,
    #[serde(default)]
    pub base_vesting_account: Option<BaseVestingAccount>,
}

impl AccountAny {
    /// Account number and sequence, wherever the layout keeps them.
    pub fn info(&self) -> Option<AccountInfo> {
        if let Some(account_number) = self.account_number {
            return Some(AccountInfo {
                account_number,
                sequence: self.sequence.unwrap_or_default(),
            });
        }

        self.base_account
            .as_ref()
            .or_else(|| {
                self.base_vesting_account
                    .as_ref()
                    .and_then(|v| v.base_account.as_ref())
            })
            .map(|base| AccountInfo {
                account_number: base.account_number,
                sequence: base.sequence,
            })
    }
}

#[derive(Debug, Deserialize)]
pub struct BaseAccount {
    #[serde(default)]
    pub address: String,
    #[serde(deserialize_with = "u64_from_str")]
    pub account_number: u64,
    #[serde(default, deserialize_with = "u64_from_str")]
    pub sequence: u64,
}

#[derive(Debug, Deserialize)]
pub struct BaseVestingAccount {
    #[serde(default)]
    pub base_account: Option<BaseAccount>,
}

/// Error body returned by the gateway.
#[derive(Debug, Deserialize)]
pub struct ErrorResponse {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: String,
}

/// Integers are JSON strings in the gateway's output.
#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    String(String),
    Number(u64),
}

impl StringOrNumber {
    fn into_u64<E: serde::de::Error>(self) -> Result<u64, E> {
        match self {
            StringOrNumber::String(s) => s.parse().map_err(E::custom),
            StringOrNumber::Number(n) => Ok(n),
        }
    }
}

fn u64_from_str<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    StringOrNumber::deserialize(deserializer)?.into_u64()
}

fn opt_u64_from_str<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u64>, D::Error> {
    Option::<StringOrNumber>::deserialize(deserializer)?
        .map(StringOrNumber::into_u64)
        .transpose()
}
