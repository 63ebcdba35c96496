//! Application metrics collection and reporting.

use metrics::{counter, histogram};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tokio::sync::RwLock;

/// Metrics collector for the viewer API.
///
/// Counters are kept twice: as atomics for the JSON stats endpoint and
/// through the `metrics` crate for the Prometheus exporter.
#[derive(Debug)]
pub struct MetricsCollector {
    /// Request counts
    pub view_requests: AtomicU64,
    pub sites_unavailable: AtomicU64,
    pub lookup_failures: AtomicU64,
    pub point_requests: AtomicU64,
    pub basemap_fallbacks: AtomicU64,

    /// Extent resolution timing
    resolve_times: RwLock<TimingStats>,

    /// Start time for uptime calculation
    start_time: Instant,
}

#[derive(Debug, Default)]
struct TimingStats {
    count: u64,
    total_us: u64,
    min_us: u64,
    max_us: u64,
    last_us: u64,
}

impl TimingStats {
    fn record(&mut self, duration_us: u64) {
        self.count += 1;
        self.total_us += duration_us;
        self.last_us = duration_us;
        if self.min_us == 0 || duration_us < self.min_us {
            self.min_us = duration_us;
        }
        if duration_us > self.max_us {
            self.max_us = duration_us;
        }
    }

    fn avg_ms(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            (self.total_us as f64 / self.count as f64) / 1000.0
        }
    }

    fn last_ms(&self) -> f64 {
        self.last_us as f64 / 1000.0
    }

    fn min_ms(&self) -> f64 {
        self.min_us as f64 / 1000.0
    }

    fn max_ms(&self) -> f64 {
        self.max_us as f64 / 1000.0
    }
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self {
            view_requests: AtomicU64::new(0),
            sites_unavailable: AtomicU64::new(0),
            lookup_failures: AtomicU64::new(0),
            point_requests: AtomicU64::new(0),
            basemap_fallbacks: AtomicU64::new(0),
            resolve_times: RwLock::new(TimingStats::default()),
            start_time: Instant::now(),
        }
    }

    /// Record a completed view resolution.
    pub async fn record_view(&self, source: &'static str, duration_us: u64) {
        self.view_requests.fetch_add(1, Ordering::Relaxed);
        counter!("view_requests_total", "source" => source).increment(1);
        histogram!("resolve_duration_ms").record(duration_us as f64 / 1000.0);

        let mut times = self.resolve_times.write().await;
        times.record(duration_us);
    }

    /// Record a view request that ended in the terminal "no longer
    /// available" response.
    pub fn record_site_unavailable(&self) {
        self.sites_unavailable.fetch_add(1, Ordering::Relaxed);
        counter!("sites_unavailable_total").increment(1);
    }

    /// Record a failed feature lookup against an upstream service.
    pub fn record_lookup_failure(&self, lookup: &str) {
        self.lookup_failures.fetch_add(1, Ordering::Relaxed);
        counter!("lookup_failures_total", "lookup" => lookup.to_string()).increment(1);
    }

    /// Record a point-label fetch and how many labels it produced.
    pub fn record_point_request(&self, labels: usize) {
        self.point_requests.fetch_add(1, Ordering::Relaxed);
        counter!("point_lookups_total").increment(1);
        histogram!("point_labels_returned").record(labels as f64);
    }

    /// Record that the fallback base map was selected.
    pub fn record_basemap_fallback(&self) {
        self.basemap_fallbacks.fetch_add(1, Ordering::Relaxed);
        counter!("basemap_fallbacks_total").increment(1);
    }

    /// Get current metrics snapshot
    pub async fn snapshot(&self) -> MetricsSnapshot {
        let resolve_times = self.resolve_times.read().await;

        MetricsSnapshot {
            uptime_secs: self.start_time.elapsed().as_secs(),

            view_requests: self.view_requests.load(Ordering::Relaxed),
            sites_unavailable: self.sites_unavailable.load(Ordering::Relaxed),
            lookup_failures: self.lookup_failures.load(Ordering::Relaxed),
            point_requests: self.point_requests.load(Ordering::Relaxed),
            basemap_fallbacks: self.basemap_fallbacks.load(Ordering::Relaxed),

            resolve_count: resolve_times.count,
            resolve_avg_ms: resolve_times.avg_ms(),
            resolve_last_ms: resolve_times.last_ms(),
            resolve_min_ms: resolve_times.min_ms(),
            resolve_max_ms: resolve_times.max_ms(),
        }
    }

    /// Reset all counters (useful for testing)
    pub async fn reset(&self) {
        self.view_requests.store(0, Ordering::Relaxed);
        self.sites_unavailable.store(0, Ordering::Relaxed);
        self.lookup_failures.store(0, Ordering::Relaxed);
        self.point_requests.store(0, Ordering::Relaxed);
        self.basemap_fallbacks.store(0, Ordering::Relaxed);
        *self.resolve_times.write().await = TimingStats::default();
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of current metrics for JSON serialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub uptime_secs: u64,

    pub view_requests: u64,
    pub sites_unavailable: u64,
    pub lookup_failures: u64,
    pub point_requests: u64,
    pub basemap_fallbacks: u64,

    pub resolve_count: u64,
    pub resolve_avg_ms: f64,
    pub resolve_last_ms: f64,
    pub resolve_min_ms: f64,
    pub resolve_max_ms: f64,
}

/// Timer guard for measuring operation duration.
pub struct Timer {
    start: Instant,
}

impl Timer {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed_us(&self) -> u64 {
        self.start.elapsed().as_micros() as u64
    }
}
