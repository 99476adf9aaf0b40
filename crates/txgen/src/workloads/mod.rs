//! Transaction-shape generators.
//!
//! A generator picks participants from the pool and builds one unsigned
//! message. Adding a shape means adding a [`Shape`] variant, its generator
//! and one registration; the selector and signer stay untouched.
//!
//! Generators only read the pool and the parameters, so one instance can be
//! shared by every client.

mod bank_send;
mod create_group;

pub use bank_send::BankSendGenerator;
pub use create_group::CreateGroupGenerator;

use crate::accounts::{AccountPool, AccountPoolError};
use crate::config::{ConfigError, Params};
use manifest_load_types::{Account, Msg};
use rand::RngCore;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Builds one unsigned message and names its sender.
pub trait TxGenerator: Send + Sync {
    /// Pick participants from `pool` and build a message.
    ///
    /// The returned account is the message's only signer and always holds
    /// private key material.
    fn generate<'a>(
        &self,
        pool: &'a AccountPool,
        params: &Params,
        rng: &mut dyn RngCore,
    ) -> Result<(&'a Account, Msg), GenerationError>;
}

/// The transaction shapes this crate knows how to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shape {
    BankSend,
    CreateGroup,
}

impl Shape {
    pub const ALL: [Shape; 2] = [Shape::BankSend, Shape::CreateGroup];

    /// Registry name.
    pub fn name(&self) -> &'static str {
        match self {
            Shape::BankSend => "bank_send",
            Shape::CreateGroup => "create_group",
        }
    }

    /// The generator for this shape.
    pub fn generator(&self) -> Arc<dyn TxGenerator> {
        match self {
            Shape::BankSend => Arc::new(BankSendGenerator),
            Shape::CreateGroup => Arc::new(CreateGroupGenerator),
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Shape {
    type Err = UnknownShape;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "bank_send" => Ok(Shape::BankSend),
            "create_group" => Ok(Shape::CreateGroup),
            other => Err(UnknownShape(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown transaction shape: {0} (expected bank_send or create_group)")]
pub struct UnknownShape(pub String);

/// Parse `name=weight` pairs separated by commas.
///
/// `"bank_send=3,create_group=1"` yields both shapes with their weights.
/// A bare name gets weight 1.
pub fn parse_weights(input: &str) -> Result<Vec<(Shape, u64)>, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidWeights {
        input: input.to_string(),
        reason,
    };

    let mut weights = Vec::new();
    for entry in input.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let (name, weight) = match entry.split_once('=') {
            Some((name, weight)) => {
                let weight = weight
                    .trim()
                    .parse::<u64>()
                    .map_err(|e| invalid(format!("{entry}: {e}")))?;
                (name, weight)
            }
            None => (entry, 1),
        };
        let shape = name.parse::<Shape>().map_err(|e| invalid(e.to_string()))?;
        weights.push((shape, weight));
    }

    if weights.is_empty() {
        return Err(invalid("no shapes given".to_string()));
    }
    Ok(weights)
}

/// Pick `n` distinct participants, requiring the first to be able to sign.
fn pick_participants<'a>(
    pool: &'a AccountPool,
    rng: &mut dyn RngCore,
    n: usize,
) -> Result<Vec<&'a Account>, GenerationError> {
    let picked = pool.sample_distinct(rng, n)?;
    if let Some(sender) = picked.first() {
        if !sender.can_sign() {
            return Err(GenerationError::SenderCannotSign(sender.name().to_string()));
        }
    }
    Ok(picked)
}

/// Errors that can occur while generating a message.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error(transparent)]
    Pool(#[from] AccountPoolError),

    #[error("Selected sender {0} has no private key")]
    SenderCannotSign(String),
}
