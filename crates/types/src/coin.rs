//! Single-denomination coin amounts.

use sbor::prelude::*;
use std::fmt;

/// An exact integer amount of one denomination.
#[derive(Debug, Clone, PartialEq, Eq, BasicSbor)]
pub struct Coin {
    pub denom: String,
    pub amount: u64,
}

impl Coin {
    pub fn new(denom: impl Into<String>, amount: u64) -> Self {
        Self {
            denom: denom.into(),
            amount,
        }
    }
}

impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.denom)
    }
}

/// Check a denomination against the ledger's denom rule:
/// `[a-zA-Z][a-zA-Z0-9/:._-]{2,127}`.
pub fn validate_denom(denom: &str) -> Result<(), DenomError> {
    let len = denom.len();
    if !(3..=128).contains(&len) {
        return Err(DenomError::InvalidLength(len));
    }

    let mut chars = denom.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        _ => return Err(DenomError::InvalidStart),
    }

    if let Some(c) = chars.find(|c| !(c.is_ascii_alphanumeric() || "/:._-".contains(*c))) {
        return Err(DenomError::InvalidCharacter(c));
    }

    Ok(())
}

/// Reasons a denomination is rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DenomError {
    #[error("denom length {0} outside 3..=128")]
    InvalidLength(usize),

    #[error("denom must start with a letter")]
    InvalidStart,

    #[error("denom contains invalid character {0:?}")]
    InvalidCharacter(char),
}
