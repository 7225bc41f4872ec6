//! In-process metrics.
//!
//! Lock-free counters and latency histograms. The report scheduler logs a
//! snapshot on every tick.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// A monotonically increasing counter.
#[derive(Debug, Default)]
pub struct Counter(AtomicU64);

impl Counter {
    pub fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    pub fn inc(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_by(&self, n: u64) {
        self.0.fetch_add(n, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// Histogram for latency tracking.
#[derive(Debug)]
pub struct Histogram {
    /// Upper bounds in ms; the last bucket also takes anything larger
    buckets: [AtomicU64; 13],
    sum: AtomicU64,
    count: AtomicU64,
}

impl Default for Histogram {
    fn default() -> Self {
        Self::new()
    }
}

impl Histogram {
    // Report generation waits on the summarizer, so the tail reaches minutes.
    const BUCKET_BOUNDS: [u64; 13] = [
        1, 5, 10, 25, 50, 100, 250, 500, 1_000, 5_000, 10_000, 30_000, 120_000,
    ];

    pub fn new() -> Self {
        Self {
            buckets: Default::default(),
            sum: AtomicU64::new(0),
            count: AtomicU64::new(0),
        }
    }

    /// Records a value in milliseconds.
    pub fn observe(&self, ms: u64) {
        self.sum.fetch_add(ms, Ordering::Relaxed);
        self.count.fetch_add(1, Ordering::Relaxed);

        let idx = Self::BUCKET_BOUNDS
            .iter()
            .position(|&bound| ms <= bound)
            .unwrap_or(Self::BUCKET_BOUNDS.len() - 1);
        self.buckets[idx].fetch_add(1, Ordering::Relaxed);
    }

    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    pub fn sum(&self) -> u64 {
        self.sum.load(Ordering::Relaxed)
    }

    pub fn mean(&self) -> f64 {
        let count = self.count();
        if count == 0 {
            0.0
        } else {
            self.sum() as f64 / count as f64
        }
    }

    /// Returns `(upper_bound_ms, count)` pairs.
    pub fn buckets(&self) -> Vec<(u64, u64)> {
        Self::BUCKET_BOUNDS
            .iter()
            .zip(self.buckets.iter())
            .map(|(&bound, count)| (bound, count.load(Ordering::Relaxed)))
            .collect()
    }
}

/// Collected metrics for the collector.
#[derive(Debug, Default)]
pub struct Metrics {
    // Ingestion
    pub sessions_created: Counter,
    pub events_received: Counter,
    pub events_inserted: Counter,
    pub event_batches_failed: Counter,
    pub client_errors_reported: Counter,
    pub rate_limited_requests: Counter,

    // Reports
    pub reports_generated: Counter,
    pub reports_served_cached: Counter,
    pub summaries_failed: Counter,

    // Latency
    pub ingest_latency_ms: Histogram,
    pub report_latency_ms: Histogram,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes a snapshot of current metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            timestamp: Utc::now(),
            sessions_created: self.sessions_created.get(),
            events_received: self.events_received.get(),
            events_inserted: self.events_inserted.get(),
            event_batches_failed: self.event_batches_failed.get(),
            client_errors_reported: self.client_errors_reported.get(),
            rate_limited_requests: self.rate_limited_requests.get(),
            reports_generated: self.reports_generated.get(),
            reports_served_cached: self.reports_served_cached.get(),
            summaries_failed: self.summaries_failed.get(),
            ingest_latency_mean_ms: self.ingest_latency_ms.mean(),
            report_latency_mean_ms: self.report_latency_ms.mean(),
        }
    }
}

/// A snapshot of metrics at a point in time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub timestamp: DateTime<Utc>,
    pub sessions_created: u64,
    pub events_received: u64,
    pub events_inserted: u64,
    pub event_batches_failed: u64,
    pub client_errors_reported: u64,
    pub rate_limited_requests: u64,
    pub reports_generated: u64,
    pub reports_served_cached: u64,
    pub summaries_failed: u64,
    pub ingest_latency_mean_ms: f64,
    pub report_latency_mean_ms: f64,
}

impl MetricsSnapshot {
    /// Emit the snapshot as one structured log line.
    pub fn log(&self) {
        tracing::info!(
            sessions_created = self.sessions_created,
            events_received = self.events_received,
            events_inserted = self.events_inserted,
            event_batches_failed = self.event_batches_failed,
            client_errors_reported = self.client_errors_reported,
            rate_limited_requests = self.rate_limited_requests,
            reports_generated = self.reports_generated,
            reports_served_cached = self.reports_served_cached,
            summaries_failed = self.summaries_failed,
            ingest_latency_mean_ms = self.ingest_latency_mean_ms,
            report_latency_mean_ms = self.report_latency_mean_ms,
            "Metrics snapshot"
        );
    }
}

/// Global metrics registry.
pub static METRICS: std::sync::LazyLock<Metrics> = std::sync::LazyLock::new(Metrics::new);

/// Get the global metrics instance.
pub fn metrics() -> &'static Metrics {
    &METRICS
}
