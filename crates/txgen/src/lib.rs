//! Manifest ledger transaction generator
//!
//! Produces signed transactions for a load-test harness: a weighted choice of
//! transaction shape, a message built from a shared account pool, and a
//! two-phase signature over the canonical signing payload.
//!
//! # Modules
//!
//! - [`accounts`]: Account pool and participant sampling
//! - [`workloads`]: Transaction shapes (`TxGenerator` trait)
//! - [`selector`]: Generator registry and weighted selection
//! - [`signer`]: Signing pipeline
//! - [`loadtest`]: Client factory and client for the harness
//! - [`client`]: LCD client for on-chain account state
//! - [`runner`]: Offline bench runner
//! - [`latency`]: Generation latency tracking
//! - [`config`]: Configuration types

pub mod accounts;
pub mod client;
pub mod config;
pub mod latency;
pub mod loadtest;
pub mod runner;
pub mod selector;
pub mod signer;
pub mod workloads;

pub use accounts::{AccountPool, AccountPoolError};
pub use client::LcdClient;
pub use config::{ConfigError, LoadTestConfig, MemoPolicy, Params};
pub use latency::{LatencyReport, LatencyTracker};
pub use loadtest::{
    GenerateTxError, LoadTestClient, LoadTestClientFactory, Stage, TxClient, TxClientFactory,
};
pub use runner::{RunReport, Runner, RunnerError};
pub use selector::{GeneratorEntry, GeneratorRegistry};
pub use signer::{AccountContextSource, PipelineError, SigningError, SigningPipeline};
pub use workloads::{parse_weights, GenerationError, Shape, TxGenerator};
