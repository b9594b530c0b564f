//! Lock-free metrics collection and periodic reporting
//!
//! Uses atomics for hot-path operations to avoid mutex contention.
//! Counters and the latency histogram are cumulative so the Prometheus
//! endpoint can expose them directly via `snapshot()`; only the per-second
//! rate window is reset, and only by `report()`.
//!
//! NOTE: All atomics use Relaxed ordering intentionally. These are statistical
//! counters only; do NOT use them for coordination.

use crate::domain::types::Resolution;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::info;

/// Prometheus-style exponential bucket boundaries (microseconds)
/// Buckets: ≤100, ≤200, ≤400, ≤800, ≤1600, ≤3200, ≤6400, ≤12800, ≤25600, ≤51200, >51200
const BUCKET_BOUNDS: [u64; 10] = [100, 200, 400, 800, 1600, 3200, 6400, 12800, 25600, 51200];
const NUM_BUCKETS: usize = 11;

/// Compute bucket index for a latency value using binary search
#[inline]
fn bucket_index(latency_us: u64) -> usize {
    BUCKET_BOUNDS.partition_point(|&bound| bound < latency_us)
}

/// Update an atomic max value using compare-and-swap loop
#[inline]
fn update_atomic_max(atomic_max: &AtomicU64, new_value: u64) {
    let mut current_max = atomic_max.load(Ordering::Relaxed);
    while new_value > current_max {
        match atomic_max.compare_exchange_weak(
            current_max,
            new_value,
            Ordering::Relaxed,
            Ordering::Relaxed,
        ) {
            Ok(_) => break,
            Err(actual) => current_max = actual,
        }
    }
}

/// Load all bucket values without resetting
#[inline]
fn load_buckets(buckets: &[AtomicU64; NUM_BUCKETS]) -> [u64; NUM_BUCKETS] {
    let mut result = [0u64; NUM_BUCKETS];
    for (i, bucket) in buckets.iter().enumerate() {
        result[i] = bucket.load(Ordering::Relaxed);
    }
    result
}

/// Compute percentile from histogram buckets
/// Returns the upper bound of the bucket containing the percentile
fn percentile_from_buckets(buckets: &[u64; NUM_BUCKETS], percentile: f64) -> u64 {
    let total: u64 = buckets.iter().sum();
    if total == 0 {
        return 0;
    }

    let target = (total as f64 * percentile) as u64;
    let mut cumulative = 0u64;

    // Last bucket uses 2x the previous bound
    const BUCKET_UPPER_BOUNDS: [u64; NUM_BUCKETS] =
        [100, 200, 400, 800, 1600, 3200, 6400, 12800, 25600, 51200, 102400];

    for (i, &count) in buckets.iter().enumerate() {
        cumulative += count;
        if cumulative >= target {
            return BUCKET_UPPER_BOUNDS[i];
        }
    }
    BUCKET_UPPER_BOUNDS[NUM_BUCKETS - 1]
}

/// Lock-free metrics collector for path resolution
pub struct Metrics {
    /// Successful previews (monotonic)
    previews_total: AtomicU64,
    /// Previews since last report (reset on report)
    previews_since_report: AtomicU64,
    /// Previews whose prefix matched a park (monotonic)
    parks_matched_total: AtomicU64,
    /// Previews that resolved an attraction (monotonic)
    attractions_matched_total: AtomicU64,
    /// Previews aborted by a lookup failure (monotonic)
    lookup_failures_total: AtomicU64,
    /// Sum of resolution latencies in microseconds (monotonic)
    latency_sum_us: AtomicU64,
    /// Max resolution latency in microseconds (monotonic)
    latency_max_us: AtomicU64,
    /// Resolution latency histogram buckets (monotonic)
    latency_buckets: [AtomicU64; NUM_BUCKETS],
    /// Last report time (only accessed from reporter)
    last_report_time: parking_lot::Mutex<Instant>,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            previews_total: AtomicU64::new(0),
            previews_since_report: AtomicU64::new(0),
            parks_matched_total: AtomicU64::new(0),
            attractions_matched_total: AtomicU64::new(0),
            lookup_failures_total: AtomicU64::new(0),
            latency_sum_us: AtomicU64::new(0),
            latency_max_us: AtomicU64::new(0),
            latency_buckets: std::array::from_fn(|_| AtomicU64::new(0)),
            last_report_time: parking_lot::Mutex::new(Instant::now()),
        }
    }

    /// Record a completed preview (lock-free)
    #[inline]
    pub fn record_preview(&self, latency_us: u64, resolution: &Resolution) {
        self.previews_total.fetch_add(1, Ordering::Relaxed);
        self.previews_since_report.fetch_add(1, Ordering::Relaxed);
        if resolution.matched_park_id.is_some() {
            self.parks_matched_total.fetch_add(1, Ordering::Relaxed);
        }
        if resolution.matched_attraction_id.is_some() {
            self.attractions_matched_total.fetch_add(1, Ordering::Relaxed);
        }

        self.latency_sum_us.fetch_add(latency_us, Ordering::Relaxed);
        self.latency_buckets[bucket_index(latency_us)].fetch_add(1, Ordering::Relaxed);
        update_atomic_max(&self.latency_max_us, latency_us);
    }

    #[inline]
    pub fn record_lookup_failure(&self) {
        self.lookup_failures_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn previews_total(&self) -> u64 {
        self.previews_total.load(Ordering::Relaxed)
    }

    pub fn lookup_failures_total(&self) -> u64 {
        self.lookup_failures_total.load(Ordering::Relaxed)
    }

    /// Snapshot all counters; resets only the rate window
    pub fn report(&self) -> MetricsSummary {
        let now = Instant::now();
        let elapsed_secs = {
            let mut last = self.last_report_time.lock();
            let elapsed = now.duration_since(*last).as_secs_f64();
            *last = now;
            elapsed
        };
        let previews_window = self.previews_since_report.swap(0, Ordering::Relaxed);
        self.summarize(previews_window, elapsed_secs)
    }

    /// Snapshot all counters without touching the rate window (scrape path)
    pub fn snapshot(&self) -> MetricsSummary {
        let elapsed_secs = self.last_report_time.lock().elapsed().as_secs_f64();
        let previews_window = self.previews_since_report.load(Ordering::Relaxed);
        self.summarize(previews_window, elapsed_secs)
    }

    fn summarize(&self, previews_window: u64, elapsed_secs: f64) -> MetricsSummary {
        let previews_per_sec =
            if elapsed_secs > 0.0 { previews_window as f64 / elapsed_secs } else { 0.0 };

        let previews_total = self.previews_total.load(Ordering::Relaxed);
        let latency_buckets = load_buckets(&self.latency_buckets);
        let latency_sum_us = self.latency_sum_us.load(Ordering::Relaxed);
        let latency_count: u64 = latency_buckets.iter().sum();
        let avg_latency_us = if latency_count > 0 { latency_sum_us / latency_count } else { 0 };

        MetricsSummary {
            previews_total,
            previews_per_sec,
            parks_matched_total: self.parks_matched_total.load(Ordering::Relaxed),
            attractions_matched_total: self.attractions_matched_total.load(Ordering::Relaxed),
            lookup_failures_total: self.lookup_failures_total.load(Ordering::Relaxed),
            latency_buckets,
            latency_sum_us,
            avg_latency_us,
            max_latency_us: self.latency_max_us.load(Ordering::Relaxed),
            lat_p50_us: percentile_from_buckets(&latency_buckets, 0.50),
            lat_p99_us: percentile_from_buckets(&latency_buckets, 0.99),
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Number of histogram buckets (exported for Prometheus formatting)
pub const METRICS_NUM_BUCKETS: usize = NUM_BUCKETS;

/// Exported bucket bounds for Prometheus formatting
pub const METRICS_BUCKET_BOUNDS: [u64; 10] = BUCKET_BOUNDS;

#[derive(Debug)]
pub struct MetricsSummary {
    pub previews_total: u64,
    pub previews_per_sec: f64,
    pub parks_matched_total: u64,
    pub attractions_matched_total: u64,
    pub lookup_failures_total: u64,
    /// Resolution latency histogram buckets
    /// Bounds: ≤100, ≤200, ≤400, ≤800, ≤1600, ≤3200, ≤6400, ≤12800, ≤25600, ≤51200, >51200 µs
    pub latency_buckets: [u64; NUM_BUCKETS],
    pub latency_sum_us: u64,
    pub avg_latency_us: u64,
    pub max_latency_us: u64,
    pub lat_p50_us: u64,
    pub lat_p99_us: u64,
}

impl MetricsSummary {
    pub fn log(&self) {
        info!(
            previews_total = %self.previews_total,
            previews_per_sec = format!("{:.1}", self.previews_per_sec),
            parks_matched = %self.parks_matched_total,
            attractions_matched = %self.attractions_matched_total,
            lookup_failures = %self.lookup_failures_total,
            avg_latency_us = %self.avg_latency_us,
            p99_us = %self.lat_p99_us,
            "metrics"
        );
    }
}
