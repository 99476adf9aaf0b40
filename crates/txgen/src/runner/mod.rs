//! Offline bench runner that drives clients from worker threads.
//!
//! One OS thread and one client per worker. Workers call
//! [`LoadTestClient::generate_tx`] until the deadline passes or the
//! transaction budget is used up, recording per-call latency into a local
//! histogram that is merged once the worker stops.

use crate::config::{ConfigError, LoadTestConfig};
use crate::latency::{LatencyError, LatencyReport, LatencyTracker};
use crate::loadtest::{LoadTestClient, LoadTestClientFactory, Stage};
use parking_lot::Mutex;
use std::io::Write;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// How often the progress loop wakes up.
const PROGRESS_TICK: Duration = Duration::from_millis(100);

type Sink = Mutex<Box<dyn Write + Send>>;

/// Runs a client factory for a bounded time or transaction budget.
pub struct Runner<F: LoadTestClientFactory> {
    factory: F,
    config: LoadTestConfig,
    sink: Option<Sink>,
}

impl<F: LoadTestClientFactory> Runner<F> {
    /// Create a runner. Worker count and run bounds are checked here, then
    /// the factory checks whatever it needs.
    pub fn new(factory: F, config: LoadTestConfig) -> Result<Self, RunnerError> {
        config.validate()?;
        factory.validate_config(&config)?;
        Ok(Self {
            factory,
            config,
            sink: None,
        })
    }

    /// Write every generated transaction as one hex line to `sink`.
    pub fn with_sink(mut self, sink: Box<dyn Write + Send>) -> Self {
        self.sink = Some(Mutex::new(sink));
        self
    }

    pub fn config(&self) -> &LoadTestConfig {
        &self.config
    }

    pub fn factory(&self) -> &F {
        &self.factory
    }

    /// Run all workers to completion.
    pub fn run(&self) -> Result<RunReport, RunnerError> {
        let clients = (0..self.config.workers)
            .map(|_| self.factory.new_client(&self.config))
            .collect::<Result<Vec<_>, _>>()?;

        let stats = RunStats::default();
        let tracker = LatencyTracker::new()?;
        let sink_error: Mutex<Option<std::io::Error>> = Mutex::new(None);
        let active = AtomicUsize::new(clients.len());

        let start = Instant::now();
        let deadline = (!self.config.duration.is_zero()).then(|| start + self.config.duration);

        info!(
            workers = self.config.workers,
            duration_secs = self.config.duration.as_secs_f64(),
            max_txs = ?self.config.max_txs,
            seeded = self.config.seed.is_some(),
            "Starting load test"
        );

        let worker_results = thread::scope(|scope| {
            let handles: Vec<_> = clients
                .into_iter()
                .enumerate()
                .map(|(worker_id, client)| {
                    let worker = Worker {
                        worker_id,
                        deadline,
                        max_txs: self.config.max_txs,
                        stats: &stats,
                        sink: self.sink.as_ref(),
                        sink_error: &sink_error,
                        tracker: &tracker,
                        active: &active,
                    };
                    scope.spawn(move || worker.run(client))
                })
                .collect();

            self.report_progress(&stats, &active, start);

            handles
                .into_iter()
                .enumerate()
                .map(|(worker_id, handle)| {
                    handle
                        .join()
                        .map_err(|_| RunnerError::WorkerPanicked(worker_id))
                })
                .collect::<Vec<_>>()
        });

        for result in worker_results {
            result??;
        }
        if let Some(e) = sink_error.lock().take() {
            return Err(RunnerError::Sink(e));
        }
        if let Some(sink) = &self.sink {
            sink.lock().flush()?;
        }

        let duration = start.elapsed();
        let report = RunReport {
            duration,
            generated: stats.generated.load(Ordering::SeqCst),
            failures: stats.failures(),
            bytes: stats.bytes.load(Ordering::SeqCst),
            avg_tps: stats.tps(duration),
            latency: tracker.report(),
        };

        info!(
            generated = report.generated,
            failed = report.total_failed(),
            avg_tps = report.avg_tps,
            "Load test finished"
        );
        Ok(report)
    }

    /// Log progress until every worker has stopped.
    fn report_progress(&self, stats: &RunStats, active: &AtomicUsize, start: Instant) {
        let interval = self.config.progress_interval;
        let mut last_progress = Instant::now();

        while active.load(Ordering::SeqCst) > 0 {
            thread::sleep(PROGRESS_TICK);
            if !interval.is_zero() && last_progress.elapsed() >= interval {
                let elapsed = start.elapsed();
                info!(
                    elapsed_secs = elapsed.as_secs(),
                    generated = stats.generated.load(Ordering::SeqCst),
                    failed = stats.failures().iter().map(|(_, n)| n).sum::<u64>(),
                    tps = stats.tps(elapsed).round() as u64,
                    "Progress"
                );
                last_progress = Instant::now();
            }
        }
    }
}

struct Worker<'a> {
    worker_id: usize,
    deadline: Option<Instant>,
    max_txs: Option<u64>,
    stats: &'a RunStats,
    sink: Option<&'a Sink>,
    sink_error: &'a Mutex<Option<std::io::Error>>,
    tracker: &'a LatencyTracker,
    active: &'a AtomicUsize,
}

impl Worker<'_> {
    fn run<C: LoadTestClient>(self, mut client: C) -> Result<(), RunnerError> {
        let _active = ActiveGuard(self.active);
        self.generate_loop(&mut client)
    }

    fn generate_loop<C: LoadTestClient>(&self, client: &mut C) -> Result<(), RunnerError> {
        let mut histogram = LatencyTracker::local_histogram()?;

        loop {
            if self.stats.stopped.load(Ordering::SeqCst) {
                break;
            }
            if self.deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                break;
            }
            if let Some(max) = self.max_txs {
                if self.stats.attempts.fetch_add(1, Ordering::SeqCst) >= max {
                    break;
                }
            }

            let started = Instant::now();
            let result = client.generate_tx();
            LatencyTracker::record_local(&mut histogram, started.elapsed());

            match result {
                Ok(bytes) => {
                    self.stats.generated.fetch_add(1, Ordering::SeqCst);
                    self.stats
                        .bytes
                        .fetch_add(bytes.len() as u64, Ordering::SeqCst);
                    self.write(&bytes);
                }
                Err(e) => {
                    self.stats.record_failure(e.stage());
                    warn!(
                        worker = self.worker_id,
                        stage = %e.stage(),
                        error = %e,
                        "Failed to generate transaction"
                    );
                }
            }
        }

        self.tracker.merge(&histogram)?;
        Ok(())
    }

    fn write(&self, bytes: &[u8]) {
        let Some(sink) = self.sink else {
            return;
        };
        if let Err(e) = writeln!(sink.lock(), "{}", hex::encode(bytes)) {
            warn!(worker = self.worker_id, error = %e, "Failed to write transaction");
            self.sink_error.lock().get_or_insert(e);
            self.stats.stopped.store(true, Ordering::SeqCst);
        }
    }
}

/// Marks a worker as stopped, including on panic.
struct ActiveGuard<'a>(&'a AtomicUsize);

impl Drop for ActiveGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Counters shared by all workers of one run.
#[derive(Default)]
struct RunStats {
    generated: AtomicU64,
    attempts: AtomicU64,
    bytes: AtomicU64,
    failed: [AtomicU64; 4],
    stopped: AtomicBool,
}

impl RunStats {
    fn record_failure(&self, stage: Stage) {
        self.failed[stage_index(stage)].fetch_add(1, Ordering::SeqCst);
    }

    fn failures(&self) -> Vec<(Stage, u64)> {
        Stage::ALL
            .iter()
            .map(|stage| (*stage, self.failed[stage_index(*stage)].load(Ordering::SeqCst)))
            .collect()
    }

    fn tps(&self, elapsed: Duration) -> f64 {
        let secs = elapsed.as_secs_f64();
        if secs > 0.0 {
            self.generated.load(Ordering::SeqCst) as f64 / secs
        } else {
            0.0
        }
    }
}

fn stage_index(stage: Stage) -> usize {
    match stage {
        Stage::Selection => 0,
        Stage::Generation => 1,
        Stage::Signing => 2,
        Stage::Encoding => 3,
    }
}

/// Report generated after a run.
#[derive(Debug)]
pub struct RunReport {
    /// Wall time of the run.
    pub duration: Duration,
    /// Transactions generated successfully.
    pub generated: u64,
    /// Failed calls per stage, in stage order.
    pub failures: Vec<(Stage, u64)>,
    /// Total encoded bytes.
    pub bytes: u64,
    /// Average generated transactions per second.
    pub avg_tps: f64,
    /// Per-call generation latency.
    pub latency: LatencyReport,
}

impl RunReport {
    pub fn failed(&self, stage: Stage) -> u64 {
        self.failures
            .iter()
            .find(|(s, _)| *s == stage)
            .map_or(0, |(_, n)| *n)
    }

    pub fn total_failed(&self) -> u64 {
        self.failures.iter().map(|(_, n)| n).sum()
    }

    /// Print the report to stdout.
    pub fn print(&self) {
        println!("\n=== Load Test Report ===");
        println!("Duration: {:?}", self.duration);
        println!("Generated: {}", self.generated);
        for (stage, count) in &self.failures {
            println!("Failed ({stage}): {count}");
        }
        println!("Bytes: {}", self.bytes);
        if self.generated > 0 {
            println!("Avg size: {} bytes", self.bytes / self.generated);
        }
        println!("Avg TPS: {:.2}", self.avg_tps);

        if self.latency.has_measurements() {
            self.latency.print_summary();
        }
    }
}

/// Errors that stop a run.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Latency tracking failed: {0}")]
    Latency(#[from] LatencyError),

    #[error("Failed to write transactions: {0}")]
    Sink(#[from] std::io::Error),

    #[error("Worker {0} panicked")]
    WorkerPanicked(usize),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounts::AccountPool;
    use crate::config::Params;
    use crate::loadtest::{GenerateTxError, TxClientFactory};
    use crate::signer::{AccountContextSource, SigningPipeline};
    use manifest_load_test_helpers::faulty::RejectingEncoder;
    use manifest_load_test_helpers::TestAccounts;
    use manifest_load_types::KeyType;
    use std::sync::Arc;
    use tracing_test::traced_test;

    fn factory(pipeline: SigningPipeline) -> TxClientFactory {
        let pool =
            AccountPool::new(TestAccounts::new(4, 3, KeyType::Ed25519).accounts()).unwrap();
        TxClientFactory::new(pool, Params::default(), pipeline)
            .unwrap()
            .with_default_generators()
    }

    fn budget(max_txs: u64, workers: usize) -> LoadTestConfig {
        LoadTestConfig::new()
            .with_workers(workers)
            .with_duration(Duration::ZERO)
            .with_max_txs(max_txs)
            .with_seed(1)
    }

    #[derive(Clone)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_runner_rejects_invalid_config() {
        let result = Runner::new(
            factory(SigningPipeline::offline("c")),
            LoadTestConfig::new().with_workers(0),
        );
        assert!(matches!(
            result,
            Err(RunnerError::Config(ConfigError::NoWorkers))
        ));
    }

    #[traced_test]
    #[test]
    fn test_runner_stops_at_budget() {
        let runner = Runner::new(factory(SigningPipeline::offline("c")), budget(100, 4)).unwrap();
        let report = runner.run().unwrap();

        assert_eq!(report.generated, 100);
        assert_eq!(report.total_failed(), 0);
        assert_eq!(report.latency.samples(), 100);
        assert!(report.bytes > 0);
        assert!(logs_contain("Load test finished"));
    }

    #[test]
    fn test_runner_stops_at_deadline() {
        let config = LoadTestConfig::new()
            .with_workers(2)
            .with_duration(Duration::from_millis(200))
            .with_seed(2);
        let runner = Runner::new(factory(SigningPipeline::offline("c")), config).unwrap();

        let report = runner.run().unwrap();
        assert!(report.generated > 0);
        assert!(report.duration >= Duration::from_millis(200));
    }

    #[test]
    fn test_runner_counts_failures_by_stage() {
        let pipeline =
            SigningPipeline::new("c", AccountContextSource::default(), Arc::new(RejectingEncoder));
        let runner = Runner::new(factory(pipeline), budget(10, 2)).unwrap();

        let report = runner.run().unwrap();
        assert_eq!(report.generated, 0);
        assert_eq!(report.failed(Stage::Encoding), 10);
        assert_eq!(report.failed(Stage::Signing), 0);
    }

    #[test]
    fn test_runner_writes_hex_lines() {
        let buf = SharedBuf(Arc::new(Mutex::new(Vec::new())));
        let runner = Runner::new(factory(SigningPipeline::offline("c")), budget(5, 1))
            .unwrap()
            .with_sink(Box::new(buf.clone()));
        runner.run().unwrap();

        let out = String::from_utf8(buf.0.lock().clone()).unwrap();
        let lines: Vec<_> = out.lines().collect();
        assert_eq!(lines.len(), 5);
        assert!(lines.iter().all(|l| hex::decode(l).is_ok()));
    }

    struct FailingFactory;
    struct FailingClient;

    impl LoadTestClient for FailingClient {
        fn generate_tx(&mut self) -> Result<Vec<u8>, GenerateTxError> {
            Err(GenerateTxError::Selection)
        }
    }

    impl LoadTestClientFactory for FailingFactory {
        type Client = FailingClient;

        fn validate_config(&self, _config: &LoadTestConfig) -> Result<(), ConfigError> {
            Ok(())
        }

        fn new_client(&self, _config: &LoadTestConfig) -> Result<FailingClient, ConfigError> {
            Ok(FailingClient)
        }
    }

    #[test]
    fn test_runner_accepts_any_factory() {
        let runner = Runner::new(FailingFactory, budget(7, 3)).unwrap();
        let report = runner.run().unwrap();
        assert_eq!(report.failed(Stage::Selection), 7);
        assert_eq!(report.generated, 0);
    }

    #[test]
    fn test_runner_checks_bounds_for_permissive_factory() {
        assert!(matches!(
            Runner::new(FailingFactory, budget(7, 0)),
            Err(RunnerError::Config(ConfigError::NoWorkers))
        ));

        let unbounded = LoadTestConfig::new().with_duration(Duration::ZERO);
        assert!(matches!(
            Runner::new(FailingFactory, unbounded),
            Err(RunnerError::Config(ConfigError::Unbounded))
        ));
    }
}
