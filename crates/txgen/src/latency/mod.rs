//! Per-call latency of transaction generation.
//!
//! Workers record into a private histogram on the hot path and merge it into
//! the shared tracker once, when they stop. The shared histogram is behind a
//! `parking_lot::Mutex` that is only taken for merges and reports.

use hdrhistogram::Histogram;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

/// Significant figures kept by every histogram.
const SIGFIG: u8 = 3;

/// Highest trackable latency in microseconds (one minute). Larger samples
/// are clamped to it.
const MAX_TRACKABLE_US: u64 = 60_000_000;

/// Aggregates generation latencies (microseconds) across workers.
#[derive(Clone)]
pub struct LatencyTracker {
    histogram: Arc<Mutex<Histogram<u64>>>,
}

impl LatencyTracker {
    pub fn new() -> Result<Self, LatencyError> {
        Ok(Self {
            histogram: Arc::new(Mutex::new(Self::local_histogram()?)),
        })
    }

    /// Empty histogram for one worker.
    pub fn local_histogram() -> Result<Histogram<u64>, LatencyError> {
        Histogram::new_with_bounds(1, MAX_TRACKABLE_US, SIGFIG)
            .map_err(|e| LatencyError::Create(e.to_string()))
    }

    /// Record one sample into a worker's histogram.
    #[inline]
    pub fn record_local(histogram: &mut Histogram<u64>, latency: Duration) {
        histogram.saturating_record(latency.as_micros() as u64);
    }

    /// Record one sample directly into the shared histogram.
    pub fn record(&self, latency: Duration) {
        Self::record_local(&mut self.histogram.lock(), latency);
    }

    /// Fold a worker's histogram into the shared one.
    pub fn merge(&self, local: &Histogram<u64>) -> Result<(), LatencyError> {
        self.histogram
            .lock()
            .add(local)
            .map_err(|e| LatencyError::Merge(e.to_string()))
    }

    /// Snapshot of everything recorded so far.
    pub fn report(&self) -> LatencyReport {
        LatencyReport {
            histogram: self.histogram.lock().clone(),
        }
    }
}

impl std::fmt::Debug for LatencyTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LatencyTracker")
            .field("samples", &self.histogram.lock().len())
            .finish()
    }
}

/// Report containing latency measurements.
#[derive(Clone)]
pub struct LatencyReport {
    /// Values in microseconds.
    histogram: Histogram<u64>,
}

impl std::fmt::Debug for LatencyReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LatencyReport")
            .field("samples", &self.samples())
            .field("p50", &self.p50_latency())
            .field("p99", &self.p99_latency())
            .finish()
    }
}

impl LatencyReport {
    /// Get the P50 (median) latency.
    pub fn p50_latency(&self) -> Duration {
        Duration::from_micros(self.histogram.value_at_quantile(0.50))
    }

    /// Get the P90 latency.
    pub fn p90_latency(&self) -> Duration {
        Duration::from_micros(self.histogram.value_at_quantile(0.90))
    }

    /// Get the P99 latency.
    pub fn p99_latency(&self) -> Duration {
        Duration::from_micros(self.histogram.value_at_quantile(0.99))
    }

    /// Get the maximum latency.
    pub fn max_latency(&self) -> Duration {
        Duration::from_micros(self.histogram.max())
    }

    /// Get the average latency.
    pub fn avg_latency(&self) -> Duration {
        Duration::from_micros(self.histogram.mean() as u64)
    }

    /// Get the minimum latency.
    pub fn min_latency(&self) -> Duration {
        Duration::from_micros(self.histogram.min())
    }

    /// Number of samples.
    pub fn samples(&self) -> u64 {
        self.histogram.len()
    }

    pub fn has_measurements(&self) -> bool {
        !self.histogram.is_empty()
    }

    /// Print a summary of the latency report.
    pub fn print_summary(&self) {
        println!("\n--- Generation Latency ---");
        println!("Samples: {}", self.samples());

        if self.has_measurements() {
            println!("  P50:  {:?}", self.p50_latency());
            println!("  P90:  {:?}", self.p90_latency());
            println!("  P99:  {:?}", self.p99_latency());
            println!("  Max:  {:?}", self.max_latency());
            println!("  Avg:  {:?}", self.avg_latency());
            println!("  Min:  {:?}", self.min_latency());
        } else {
            println!("No latency measurements recorded.");
        }
    }
}

/// Errors from histogram bookkeeping.
#[derive(Debug, thiserror::Error)]
pub enum LatencyError {
    #[error("Histogram creation failed: {0}")]
    Create(String),

    #[error("Histogram merge failed: {0}")]
    Merge(String),
}
