//! Engine configuration.
//!
//! All limits and toggles are fixed at construction time; the engine holds
//! no mutable configuration state. `validate()` rejects degenerate values
//! before any component is built.

use std::time::Duration;

use crate::error::EngineError;

// ==================== Engine Defaults ====================

/// Default maximum number of markers held in the content-addressed cache.
pub const DEFAULT_MAX_CACHED_MARKERS: usize = 500;

/// Default maximum number of recycled instances held in the pool.
pub const DEFAULT_MAX_POOLED_MARKERS: usize = 100;

/// Default number of spots per batch during bulk transformation.
pub const DEFAULT_BATCH_SIZE: usize = 50;

/// Default number of batches allowed to run concurrently.
pub const DEFAULT_MAX_CONCURRENT_BATCHES: usize = 4;

/// Default quiet delay before a coalesced viewport request is executed,
/// in milliseconds.
pub const DEFAULT_DEBOUNCE_DELAY_MS: u64 = 300;

/// Default click-selection tolerance radius in kilometers.
///
/// Sized for regional viewports; embedders rendering street-level maps
/// tune this down.
pub const DEFAULT_CLICK_TOLERANCE_KM: f64 = 25.0;

/// Default cleanup trigger as a multiple of the cache maximum.
///
/// A cleanup pass starts once occupancy exceeds
/// `max_cached_markers * DEFAULT_CLEANUP_FACTOR` and trims back to the
/// maximum.
pub const DEFAULT_CLEANUP_FACTOR: f64 = 1.2;

/// Marker count below which the spatial-index strategy declines in favor
/// of the plain linear scan.
pub const DEFAULT_SPATIAL_INDEX_MIN_MARKERS: usize = 32;

/// Engine configuration, static for the lifetime of the engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    // ==================== Capacity Limits ====================
    /// Maximum cache occupancy after a cleanup pass.
    /// Default: 500.
    pub max_cached_markers: usize,

    /// Maximum pool occupancy; evictions beyond this drop the instance.
    /// Default: 100.
    pub max_pooled_markers: usize,

    /// Cleanup trigger factor applied to `max_cached_markers`.
    /// Must be at least 1.0. Default: 1.2.
    pub cleanup_factor: f64,

    // ==================== Batch Processing ====================
    /// Spots per batch. Default: 50.
    pub batch_size: usize,

    /// Concurrent batch limit enforced by the permit gate. Default: 4.
    pub max_concurrent_batches: usize,

    // ==================== Interaction ====================
    /// Quiet delay before a coalesced viewport recomputation runs.
    /// Default: 300 ms.
    pub debounce_delay: Duration,

    /// Selection tolerance radius in kilometers. Default: 25 km.
    pub click_tolerance_km: f64,

    /// Marker count at which the spatial-index strategy becomes worth its
    /// per-call build cost. Default: 32.
    pub spatial_index_min_markers: usize,

    // ==================== Feature Toggles ====================
    /// When false, every transform runs fresh; the cache map is bypassed.
    /// Default: true.
    pub caching_enabled: bool,

    /// When false, evicted markers are dropped instead of pooled.
    /// Default: true.
    pub pooling_enabled: bool,

    /// When false, the viewport pass admits every valid spot and culls
    /// nothing on geometry grounds. Default: true.
    pub viewport_culling_enabled: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            // Capacity limits
            max_cached_markers: DEFAULT_MAX_CACHED_MARKERS,
            max_pooled_markers: DEFAULT_MAX_POOLED_MARKERS,
            cleanup_factor: DEFAULT_CLEANUP_FACTOR,

            // Batch processing
            batch_size: DEFAULT_BATCH_SIZE,
            max_concurrent_batches: DEFAULT_MAX_CONCURRENT_BATCHES,

            // Interaction
            debounce_delay: Duration::from_millis(DEFAULT_DEBOUNCE_DELAY_MS),
            click_tolerance_km: DEFAULT_CLICK_TOLERANCE_KM,
            spatial_index_min_markers: DEFAULT_SPATIAL_INDEX_MIN_MARKERS,

            // Feature toggles
            caching_enabled: true,
            pooling_enabled: true,
            viewport_culling_enabled: true,
        }
    }
}

impl EngineConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache occupancy at which a cleanup pass is triggered.
    pub fn cleanup_threshold(&self) -> usize {
        (self.max_cached_markers as f64 * self.cleanup_factor).ceil() as usize
    }

    /// Rejects degenerate values before the engine is constructed.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.max_cached_markers == 0 {
            return Err(EngineError::InvalidConfig(
                "max_cached_markers must be non-zero".into(),
            ));
        }
        if self.batch_size == 0 {
            return Err(EngineError::InvalidConfig(
                "batch_size must be non-zero".into(),
            ));
        }
        if self.max_concurrent_batches == 0 {
            return Err(EngineError::InvalidConfig(
                "max_concurrent_batches must be non-zero".into(),
            ));
        }
        if self.cleanup_factor.is_nan() || self.cleanup_factor < 1.0 {
            return Err(EngineError::InvalidConfig(
                "cleanup_factor must be at least 1.0".into(),
            ));
        }
        if !self.click_tolerance_km.is_finite() || self.click_tolerance_km <= 0.0 {
            return Err(EngineError::InvalidConfig(
                "click_tolerance_km must be positive and finite".into(),
            ));
        }
        Ok(())
    }
}
