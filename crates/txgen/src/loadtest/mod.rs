//! Client factory and client handed to the load-test harness.
//!
//! The harness receives a factory instance directly, builds one client per
//! worker and calls [`LoadTestClient::generate_tx`] in a loop. Registry, pool,
//! parameters and signing pipeline are built once and shared read-only; each
//! client owns its RNG.

use crate::accounts::AccountPool;
use crate::config::{ConfigError, LoadTestConfig, Params};
use crate::selector::GeneratorRegistry;
use crate::signer::{EncodingError, PipelineError, SigningError, SigningPipeline};
use crate::workloads::{GenerationError, Shape, TxGenerator};
use manifest_load_types::Hash;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// Seed distance between consecutive clients.
const CLIENT_SEED_STRIDE: u64 = 1000;

/// Builds clients for the harness.
pub trait LoadTestClientFactory: Send + Sync {
    type Client: LoadTestClient;

    /// Check a configuration before any client is built.
    fn validate_config(&self, config: &LoadTestConfig) -> Result<(), ConfigError>;

    /// Build one client.
    fn new_client(&self, config: &LoadTestConfig) -> Result<Self::Client, ConfigError>;
}

/// Produces signed transactions, one per call.
pub trait LoadTestClient: Send {
    fn generate_tx(&mut self) -> Result<Vec<u8>, GenerateTxError>;
}

/// Factory over the built-in generators and signing pipeline.
pub struct TxClientFactory {
    registry: Arc<GeneratorRegistry>,
    pool: Arc<AccountPool>,
    params: Arc<Params>,
    pipeline: Arc<SigningPipeline>,
    clients_created: AtomicU64,
}

impl fmt::Debug for TxClientFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TxClientFactory")
            .field("registry", &self.registry)
            .field("accounts", &self.pool.len())
            .field("params", &self.params)
            .field("pipeline", &self.pipeline)
            .finish()
    }
}

impl TxClientFactory {
    /// Factory with an empty registry.
    ///
    /// Fails when the parameters are invalid or no account in the pool can
    /// sign.
    pub fn new(
        pool: AccountPool,
        params: Params,
        pipeline: SigningPipeline,
    ) -> Result<Self, ConfigError> {
        params.validate()?;
        if pool.is_empty() {
            return Err(ConfigError::EmptyPool);
        }
        if pool.signing_accounts() == 0 {
            return Err(ConfigError::NoSigningAccounts);
        }

        info!(
            accounts = pool.len(),
            chain_id = pipeline.chain_id(),
            context = ?pipeline.context_source(),
            "Created transaction client factory"
        );

        Ok(Self {
            registry: Arc::new(GeneratorRegistry::new()),
            pool: Arc::new(pool),
            params: Arc::new(params),
            pipeline: Arc::new(pipeline),
            clients_created: AtomicU64::new(0),
        })
    }

    /// Register every built-in shape at weight 1.
    pub fn with_default_generators(mut self) -> Self {
        for shape in Shape::ALL {
            self.register_shape(shape, 1);
        }
        self
    }

    /// Register a generator. Last registration of a name wins.
    ///
    /// Clients built earlier keep the registry they were built with.
    pub fn register_generator(
        &mut self,
        name: impl Into<String>,
        generator: Arc<dyn TxGenerator>,
        weight: u64,
    ) {
        Arc::make_mut(&mut self.registry).register(name, generator, weight);
    }

    /// Register a built-in shape under its own name.
    pub fn register_shape(&mut self, shape: Shape, weight: u64) {
        self.register_generator(shape.name(), shape.generator(), weight);
    }

    pub fn registry(&self) -> &GeneratorRegistry {
        &self.registry
    }

    pub fn pool(&self) -> &AccountPool {
        &self.pool
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Build a client with an explicit RNG.
    pub fn client_with_rng(&self, rng: ChaCha8Rng) -> TxClient {
        TxClient {
            registry: Arc::clone(&self.registry),
            pool: Arc::clone(&self.pool),
            params: Arc::clone(&self.params),
            pipeline: Arc::clone(&self.pipeline),
            rng,
        }
    }
}

impl LoadTestClientFactory for TxClientFactory {
    type Client = TxClient;

    /// Only the registry matters here. Worker count and run bounds belong to
    /// the harness.
    fn validate_config(&self, _config: &LoadTestConfig) -> Result<(), ConfigError> {
        if self.registry.is_empty() {
            return Err(ConfigError::NoGenerators);
        }
        Ok(())
    }

    fn new_client(&self, config: &LoadTestConfig) -> Result<TxClient, ConfigError> {
        self.validate_config(config)?;

        let index = self.clients_created.fetch_add(1, Ordering::Relaxed);
        let rng = match config.seed {
            Some(seed) => {
                ChaCha8Rng::seed_from_u64(seed.wrapping_add(index.wrapping_mul(CLIENT_SEED_STRIDE)))
            }
            None => ChaCha8Rng::from_entropy(),
        };
        debug!(client = index, seeded = config.seed.is_some(), "Created client");

        Ok(self.client_with_rng(rng))
    }
}

/// Produces one signed transaction per call.
pub struct TxClient {
    registry: Arc<GeneratorRegistry>,
    pool: Arc<AccountPool>,
    params: Arc<Params>,
    pipeline: Arc<SigningPipeline>,
    rng: ChaCha8Rng,
}

impl fmt::Debug for TxClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TxClient")
            .field("shapes", &self.registry.len())
            .field("accounts", &self.pool.len())
            .finish()
    }
}

impl TxClient {
    /// Selection, generation, signing, encoding.
    pub fn generate_tx(&mut self) -> Result<Vec<u8>, GenerateTxError> {
        let entry = self
            .registry
            .select(&mut self.rng)
            .ok_or(GenerateTxError::Selection)?;

        let (sender, msg) = entry
            .generator
            .generate(&self.pool, &self.params, &mut self.rng)
            .map_err(|source| GenerateTxError::Generation {
                shape: entry.name.clone(),
                source,
            })?;

        let memo = self.params.memo.resolve(&mut self.rng);
        let bytes = self
            .pipeline
            .sign(sender, msg, &self.params, &memo)
            .map_err(|e| match e {
                PipelineError::Signing(source) => GenerateTxError::Signing {
                    shape: entry.name.clone(),
                    source,
                },
                PipelineError::Encoding(source) => GenerateTxError::Encoding {
                    shape: entry.name.clone(),
                    source,
                },
            })?;

        debug!(
            shape = %entry.name,
            sender = %sender.address(),
            hash = %Hash::of_tx_bytes(&bytes),
            bytes = bytes.len(),
            "Generated transaction"
        );
        Ok(bytes)
    }
}

impl LoadTestClient for TxClient {
    fn generate_tx(&mut self) -> Result<Vec<u8>, GenerateTxError> {
        TxClient::generate_tx(self)
    }
}

/// The stage of [`TxClient::generate_tx`] that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Stage {
    Selection,
    Generation,
    Signing,
    Encoding,
}

impl Stage {
    pub const ALL: [Stage; 4] = [
        Stage::Selection,
        Stage::Generation,
        Stage::Signing,
        Stage::Encoding,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Selection => "selection",
            Stage::Generation => "generation",
            Stage::Signing => "signing",
            Stage::Encoding => "encoding",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-call failure of [`TxClient::generate_tx`].
#[derive(Debug, thiserror::Error)]
pub enum GenerateTxError {
    #[error("selection failed: no transaction shape registered")]
    Selection,

    #[error("generation failed for {shape}: {source}")]
    Generation {
        shape: String,
        #[source]
        source: GenerationError,
    },

    #[error("signing failed for {shape}: {source}")]
    Signing {
        shape: String,
        #[source]
        source: SigningError,
    },

    #[error("encoding failed for {shape}: {source}")]
    Encoding {
        shape: String,
        #[source]
        source: EncodingError,
    },
}

impl GenerateTxError {
    pub fn stage(&self) -> Stage {
        match self {
            GenerateTxError::Selection => Stage::Selection,
            GenerateTxError::Generation { .. } => Stage::Generation,
            GenerateTxError::Signing { .. } => Stage::Signing,
            GenerateTxError::Encoding { .. } => Stage::Encoding,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signer::AccountContextSource;
    use manifest_load_test_helpers::faulty::{FailingRetriever, RejectingEncoder};
    use manifest_load_test_helpers::TestAccounts;
    use manifest_load_types::{KeyType, SborTxCodec};
    use tracing_test::traced_test;

    fn pool(size: usize) -> AccountPool {
        AccountPool::new(TestAccounts::new(size, 11, KeyType::Secp256k1).accounts()).unwrap()
    }

    fn seeded() -> LoadTestConfig {
        LoadTestConfig::new().with_seed(7)
    }

    #[test]
    fn test_factory_rejects_empty_pool() {
        assert!(matches!(
            TxClientFactory::new(
                AccountPool::default(),
                Params::default(),
                SigningPipeline::offline("test-chain")
            ),
            Err(ConfigError::EmptyPool)
        ));
    }

    #[test]
    fn test_factory_rejects_watch_only_pool() {
        let watchers = vec![manifest_load_test_helpers::fixtures::watch_only_account("w", 1)];
        assert!(matches!(
            TxClientFactory::new(
                AccountPool::new(watchers).unwrap(),
                Params::default(),
                SigningPipeline::offline("test-chain")
            ),
            Err(ConfigError::NoSigningAccounts)
        ));
    }

    #[test]
    fn test_validate_requires_generators() {
        let factory =
            TxClientFactory::new(pool(2), Params::default(), SigningPipeline::offline("c"))
                .unwrap();
        assert!(matches!(
            factory.validate_config(&seeded()),
            Err(ConfigError::NoGenerators)
        ));

        let factory = factory.with_default_generators();
        assert!(factory.validate_config(&seeded()).is_ok());
        assert_eq!(factory.registry().len(), 2);
    }

    #[test]
    fn test_factory_leaves_harness_settings_alone() {
        let factory =
            TxClientFactory::new(pool(2), Params::default(), SigningPipeline::offline("c"))
                .unwrap()
                .with_default_generators();
        let config = LoadTestConfig::new()
            .with_workers(0)
            .with_duration(std::time::Duration::ZERO);

        assert!(factory.validate_config(&config).is_ok());
        let mut client = factory.new_client(&config).unwrap();
        assert!(client.generate_tx().is_ok());
    }

    #[traced_test]
    #[test]
    fn test_seeded_clients_reproducible() {
        let make = || {
            TxClientFactory::new(pool(4), Params::default(), SigningPipeline::offline("c"))
                .unwrap()
                .with_default_generators()
        };
        let (f1, f2) = (make(), make());
        let mut c1 = f1.new_client(&seeded()).unwrap();
        let mut c2 = f2.new_client(&seeded()).unwrap();

        for _ in 0..20 {
            assert_eq!(c1.generate_tx().unwrap(), c2.generate_tx().unwrap());
        }
        assert!(logs_contain("Generated transaction"));
    }

    #[traced_test]
    #[test]
    fn test_generated_transaction_logs_its_hash() {
        let factory =
            TxClientFactory::new(pool(3), Params::default(), SigningPipeline::offline("c"))
                .unwrap()
                .with_default_generators();
        let mut client = factory.new_client(&seeded()).unwrap();

        let bytes = client.generate_tx().unwrap();
        let hash = Hash::of_tx_bytes(&bytes).to_string();
        assert_eq!(hash.len(), 64);
        assert!(logs_contain(&hash));
    }

    #[test]
    fn test_clients_get_distinct_streams() {
        let factory =
            TxClientFactory::new(pool(4), Params::default(), SigningPipeline::offline("c"))
                .unwrap()
                .with_default_generators();
        let mut c1 = factory.new_client(&seeded()).unwrap();
        let mut c2 = factory.new_client(&seeded()).unwrap();

        let a: Vec<_> = (0..10).map(|_| c1.generate_tx().unwrap()).collect();
        let b: Vec<_> = (0..10).map(|_| c2.generate_tx().unwrap()).collect();
        assert_ne!(a, b);
    }

    #[test]
    fn test_empty_registry_is_selection_error() {
        let factory =
            TxClientFactory::new(pool(2), Params::default(), SigningPipeline::offline("c"))
                .unwrap();
        let mut client = factory.client_with_rng(ChaCha8Rng::seed_from_u64(1));
        let err = client.generate_tx().unwrap_err();
        assert_eq!(err.stage(), Stage::Selection);
    }

    #[test]
    fn test_generation_error_carries_shape() {
        let mut factory =
            TxClientFactory::new(pool(1), Params::default(), SigningPipeline::offline("c"))
                .unwrap();
        factory.register_shape(Shape::BankSend, 1);
        let mut client = factory.new_client(&seeded()).unwrap();

        let err = client.generate_tx().unwrap_err();
        assert_eq!(err.stage(), Stage::Generation);
        assert!(err.to_string().contains("bank_send"));
    }

    #[test]
    fn test_signing_and_encoding_stages() {
        let online = SigningPipeline::new(
            "c",
            AccountContextSource::Online(Arc::new(FailingRetriever::new())),
            Arc::new(SborTxCodec::new()),
        );
        let mut client = TxClientFactory::new(pool(2), Params::default(), online)
            .unwrap()
            .with_default_generators()
            .new_client(&seeded())
            .unwrap();
        assert_eq!(client.generate_tx().unwrap_err().stage(), Stage::Signing);
        // Still usable after a failure
        assert_eq!(client.generate_tx().unwrap_err().stage(), Stage::Signing);

        let rejecting =
            SigningPipeline::new("c", AccountContextSource::default(), Arc::new(RejectingEncoder));
        let mut client = TxClientFactory::new(pool(2), Params::default(), rejecting)
            .unwrap()
            .with_default_generators()
            .new_client(&seeded())
            .unwrap();
        assert_eq!(client.generate_tx().unwrap_err().stage(), Stage::Encoding);
    }

    #[test]
    fn test_registration_after_client_creation() {
        let mut factory =
            TxClientFactory::new(pool(2), Params::default(), SigningPipeline::offline("c"))
                .unwrap();
        factory.register_shape(Shape::CreateGroup, 1);
        let client = factory.new_client(&seeded()).unwrap();

        factory.register_shape(Shape::BankSend, 5);
        assert_eq!(factory.registry().len(), 2);
        assert_eq!(client.registry.len(), 1);
    }
}
