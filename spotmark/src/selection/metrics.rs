//! Per-strategy selection metrics.
//!
//! Every selection attempt is recorded against the strategy that ran it,
//! keeping a use count plus cumulative moving averages for latency and
//! success. The averages make strategy cost visible without retaining
//! per-attempt history.

use std::collections::HashMap;
use std::time::Duration;

use parking_lot::Mutex;

/// Accumulated statistics for one strategy.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StrategyStats {
    /// Number of selection attempts routed to this strategy.
    pub uses: u64,
    /// Cumulative moving average of attempt latency, in milliseconds.
    pub avg_latency_ms: f64,
    /// Fraction of attempts that resolved to a marker, in `[0, 1]`.
    pub success_rate: f64,
}

/// Thread-safe registry of per-strategy statistics.
#[derive(Debug, Default)]
pub struct SelectionMetrics {
    inner: Mutex<HashMap<&'static str, StrategyStats>>,
}

impl SelectionMetrics {
    pub fn new() -> Self {
        SelectionMetrics::default()
    }

    /// Records one selection attempt.
    ///
    /// Averages fold in the new sample as `avg' = (avg * (n - 1) + x) / n`
    /// where `n` is the updated use count.
    pub fn record(&self, strategy: &'static str, elapsed: Duration, success: bool) {
        let mut inner = self.inner.lock();
        let stats = inner.entry(strategy).or_default();

        stats.uses += 1;
        let n = stats.uses as f64;
        let latency_ms = elapsed.as_secs_f64() * 1000.0;
        let hit = if success { 1.0 } else { 0.0 };
        stats.avg_latency_ms = (stats.avg_latency_ms * (n - 1.0) + latency_ms) / n;
        stats.success_rate = (stats.success_rate * (n - 1.0) + hit) / n;
    }

    /// Statistics for one strategy, if it has been used.
    pub fn stats_for(&self, strategy: &str) -> Option<StrategyStats> {
        self.inner.lock().get(strategy).copied()
    }

    /// Copy of all per-strategy statistics.
    pub fn snapshot(&self) -> HashMap<&'static str, StrategyStats> {
        self.inner.lock().clone()
    }

    /// Clears all recorded statistics.
    pub fn reset(&self) {
        self.inner.lock().clear();
    }
}
