//! Observability metrics: search latency, add throughput, failures.

use std::collections::VecDeque;
use std::time::Duration;

/// Caps memory use; older samples are dropped first.
const MAX_LATENCY_SAMPLES: usize = 10_000;

/// Collects runtime metrics for the vector store.
#[derive(Debug, Default)]
pub struct MetricsCollector {
    search_latencies_us: VecDeque<f64>,
    total_searches: u64,
    total_adds: u64,
    failed_adds: u64,
    missing_records: u64,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a search with its duration and how many hits failed to resolve.
    pub fn record_search(&mut self, duration: Duration, missing: usize) {
        self.total_searches += 1;
        self.missing_records += missing as u64;
        if self.search_latencies_us.len() == MAX_LATENCY_SAMPLES {
            self.search_latencies_us.pop_front();
        }
        self.search_latencies_us.push_back(duration.as_micros() as f64);
    }

    /// Record a successful add.
    pub fn record_add(&mut self) {
        self.total_adds += 1;
    }

    /// Record an add that returned an error.
    pub fn record_failed_add(&mut self) {
        self.failed_adds += 1;
    }

    pub fn total_searches(&self) -> u64 {
        self.total_searches
    }

    pub fn total_adds(&self) -> u64 {
        self.total_adds
    }

    pub fn failed_adds(&self) -> u64 {
        self.failed_adds
    }

    pub fn missing_records(&self) -> u64 {
        self.missing_records
    }

    /// Average search latency in microseconds.
    pub fn avg_search_latency_us(&self) -> f64 {
        if self.search_latencies_us.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.search_latencies_us.iter().sum();
        sum / self.search_latencies_us.len() as f64
    }

    /// Get a percentile of search latency (e.g., 50.0, 95.0, 99.0).
    pub fn percentile_search_latency_us(&self, percentile: f64) -> f64 {
        if self.search_latencies_us.is_empty() {
            return 0.0;
        }

        let mut sorted: Vec<f64> = self.search_latencies_us.iter().copied().collect();
        sorted.sort_by(|a, b| a.total_cmp(b));

        let index = ((percentile / 100.0) * (sorted.len() - 1) as f64).round() as usize;
        sorted[index.min(sorted.len() - 1)]
    }
}
