//! Generation parameters and load-test configuration.

use manifest_load_types::{validate_denom, Coin, DenomError};
use rand::distributions::{Alphanumeric, DistString};
use rand::RngCore;
use std::time::Duration;

/// Default coin denomination of the Manifest ledger.
pub const DEFAULT_DENOM: &str = "umfx";

/// Memo length used by [`MemoPolicy::Random`] when none is given.
pub const DEFAULT_RANDOM_MEMO_LEN: usize = 255;

/// How the memo of each transaction is chosen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemoPolicy {
    /// Same memo on every transaction.
    Fixed(String),
    /// Fresh alphanumeric memo of `len` characters per transaction.
    Random { len: usize },
}

impl Default for MemoPolicy {
    fn default() -> Self {
        MemoPolicy::Fixed(String::new())
    }
}

impl MemoPolicy {
    /// Resolve the memo for one transaction.
    pub fn resolve(&self, rng: &mut dyn RngCore) -> String {
        match self {
            MemoPolicy::Fixed(memo) => memo.clone(),
            MemoPolicy::Random { len } => Alphanumeric.sample_string(rng, *len),
        }
    }
}

/// Parameters shared by every generator and the signing pipeline.
///
/// Read-only once a factory has been built from it.
#[derive(Debug, Clone)]
pub struct Params {
    /// Quantity moved by a bank send.
    pub amount: u64,

    /// Denomination of transfers and fees.
    pub denom: String,

    /// Flat fee per transaction, in `denom`.
    pub fee: u64,

    /// Gas limit per transaction.
    pub gas_limit: u64,

    /// Length of the random metadata attached to a new group.
    pub create_group_metadata_size: usize,

    /// Memo selection.
    pub memo: MemoPolicy,

    /// Timeout height, zero for none.
    pub timeout_height: u64,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            amount: 1,
            denom: DEFAULT_DENOM.to_string(),
            fee: 5,
            gas_limit: 200_000,
            create_group_metadata_size: 100,
            memo: MemoPolicy::default(),
            timeout_height: 0,
        }
    }
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_amount(mut self, amount: u64) -> Self {
        self.amount = amount;
        self
    }

    pub fn with_denom(mut self, denom: impl Into<String>) -> Self {
        self.denom = denom.into();
        self
    }

    pub fn with_fee(mut self, fee: u64) -> Self {
        self.fee = fee;
        self
    }

    pub fn with_gas_limit(mut self, gas_limit: u64) -> Self {
        self.gas_limit = gas_limit;
        self
    }

    pub fn with_create_group_metadata_size(mut self, size: usize) -> Self {
        self.create_group_metadata_size = size;
        self
    }

    pub fn with_memo(mut self, memo: MemoPolicy) -> Self {
        self.memo = memo;
        self
    }

    pub fn with_timeout_height(mut self, height: u64) -> Self {
        self.timeout_height = height;
        self
    }

    /// The transfer amount as a coin.
    pub fn amount_coin(&self) -> Coin {
        Coin::new(self.denom.clone(), self.amount)
    }

    /// The fee as a coin.
    pub fn fee_coin(&self) -> Coin {
        Coin::new(self.denom.clone(), self.fee)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_denom(&self.denom).map_err(|source| ConfigError::InvalidDenom {
            denom: self.denom.clone(),
            source,
        })
    }
}

/// Configuration handed to the factory by the harness.
#[derive(Debug, Clone)]
pub struct LoadTestConfig {
    /// Number of concurrent workers, one client each.
    pub workers: usize,

    /// How long the run lasts.
    pub duration: Duration,

    /// Stop after this many generated transactions.
    pub max_txs: Option<u64>,

    /// Base seed for the clients' RNGs. Entropy when unset.
    pub seed: Option<u64>,

    /// Interval between progress lines.
    pub progress_interval: Duration,
}

impl Default for LoadTestConfig {
    fn default() -> Self {
        Self {
            workers: 1,
            duration: Duration::from_secs(10),
            max_txs: None,
            seed: None,
            progress_interval: Duration::from_secs(1),
        }
    }
}

impl LoadTestConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    pub fn with_max_txs(mut self, max_txs: u64) -> Self {
        self.max_txs = Some(max_txs);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_progress_interval(mut self, interval: Duration) -> Self {
        self.progress_interval = interval;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::NoWorkers);
        }
        if self.duration.is_zero() && self.max_txs.is_none() {
            return Err(ConfigError::Unbounded);
        }
        Ok(())
    }
}

/// Configuration errors, surfaced at startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid denom {denom:?}: {source}")]
    InvalidDenom {
        denom: String,
        #[source]
        source: DenomError,
    },

    #[error("Account pool is empty")]
    EmptyPool,

    #[error("No account in the pool can sign")]
    NoSigningAccounts,

    #[error("No transaction shape registered")]
    NoGenerators,

    #[error("At least one worker is required")]
    NoWorkers,

    #[error("Run needs a duration or a transaction budget")]
    Unbounded,

    #[error("Invalid weights {input:?}: {reason}")]
    InvalidWeights { input: String, reason: String },
}
