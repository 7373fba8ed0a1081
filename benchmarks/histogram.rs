use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Bucket upper bounds in microseconds; the last bucket is open-ended.
const THRESHOLDS_US: [u64; 12] = [10, 50, 100, 250, 500, 1_000, 2_500, 5_000, 10_000, 50_000, 250_000, 1_000_000];

/// A lock-free latency histogram for normalize runs.
/// Buckets: [10us, 50us, 100us, 250us, 500us, 1ms, 2.5ms, 5ms, 10ms, 50ms, 250ms, 1s+]
pub struct LiveHistogram {
    buckets: [AtomicU64; 12],
}

impl LiveHistogram {
    pub fn new() -> Self {
        const ZERO: AtomicU64 = AtomicU64::new(0);
        Self { buckets: [ZERO; 12] }
    }

    pub fn record(&self, elapsed: Duration) {
        let us = elapsed.as_micros() as u64;
        let idx = THRESHOLDS_US
            .iter()
            .position(|&t| us < t)
            .unwrap_or(THRESHOLDS_US.len() - 1);
        self.buckets[idx].fetch_add(1, Ordering::Relaxed);
    }

    pub fn count(&self) -> u64 {
        self.buckets.iter().map(|b| b.load(Ordering::Relaxed)).sum()
    }

    /// Upper bound (us) of the bucket containing the `p` quantile. 0 if empty.
    pub fn calculate_percentile(&self, p: f64) -> u64 {
        let total = self.count();
        if total == 0 { return 0; }
        let target = ((total as f64 * p).ceil() as u64).max(1);
        let mut count = 0;
        for (i, b) in self.buckets.iter().enumerate() {
            count += b.load(Ordering::Relaxed);
            if count >= target { return THRESHOLDS_US[i]; }
        }
        THRESHOLDS_US[THRESHOLDS_US.len() - 1]
    }
}
