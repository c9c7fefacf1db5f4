//! Store statistics tracking and reporting.

use std::fmt;

/// Point-in-time statistics for a marker store.
///
/// Counters accumulate from construction (or the last `clear()`); the
/// occupancy fields are gauges read at snapshot time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreStats {
    // Cache counters
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub cleanup_passes: u64,

    // Instance lifecycle
    pub created: u64,
    pub reused_from_pool: u64,

    // Occupancy at snapshot time
    pub cached: usize,
    pub pooled: usize,
}

impl StoreStats {
    /// Cache hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    /// Fraction of instance needs satisfied by the pool (0.0 to 1.0).
    pub fn reuse_rate(&self) -> f64 {
        let total = self.created + self.reused_from_pool;
        if total == 0 {
            0.0
        } else {
            self.reused_from_pool as f64 / total as f64
        }
    }
}

impl fmt::Display for StoreStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "hits {} misses {} ({:.1}% hit) cached {} pooled {} evicted {} cleanups {}",
            self.hits,
            self.misses,
            self.hit_rate() * 100.0,
            self.cached,
            self.pooled,
            self.evictions,
            self.cleanup_passes
        )
    }
}
