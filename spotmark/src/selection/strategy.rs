//! The selection strategy contract.
//!
//! Strategies resolve a click location against the visible markers and are
//! chosen at runtime by the coordinator. The trait is dyn-compatible
//! (`Arc<dyn SelectionStrategy>`), so async selection goes through pinned
//! boxed futures.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::coord::{Coordinate, Viewport};
use crate::marker::Marker;
use crate::selection::SelectionContext;
use crate::spot::Spot;

/// Boxed future type for dyn-compatible async methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Strategy name for the linear-scan distance strategy.
pub const DISTANCE_STRATEGY: &str = "distance";
/// Strategy name for the ephemeral-grid spatial strategy.
pub const SPATIAL_STRATEGY: &str = "spatial-index";
/// Strategy name for the platform hit-test delegation strategy.
pub const NATIVE_STRATEGY: &str = "native-hit-test";

/// The platform the engine is embedded in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Ios,
    Android,
    Desktop,
    Headless,
}

impl Platform {
    /// True when the platform's map control exposes its own hit-testing.
    pub fn supports_native_hit_testing(&self) -> bool {
        matches!(self, Platform::Ios | Platform::Android)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Ios => "ios",
            Platform::Android => "android",
            Platform::Desktop => "desktop",
            Platform::Headless => "headless",
        }
    }
}

/// A pluggable click-resolution algorithm.
///
/// Implementations only read marker state; the caller synchronizes visible
/// set updates against selection. Returning `None` means no marker
/// qualified, which is an answer, not an error.
pub trait SelectionStrategy: Send + Sync {
    /// Stable name used for preference matching and metrics.
    fn name(&self) -> &'static str;

    /// Whether this strategy can run for the given platform and context.
    fn is_applicable(&self, platform: Platform, context: &SelectionContext) -> bool;

    /// Resolves the click to the spot it designates, if any.
    fn select<'a>(
        &'a self,
        click: Coordinate,
        markers: &'a [Arc<Marker>],
        viewport: Option<&'a Viewport>,
    ) -> BoxFuture<'a, Option<Arc<Spot>>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_native_hit_testing_support() {
        assert!(Platform::Ios.supports_native_hit_testing());
        assert!(Platform::Android.supports_native_hit_testing());
        assert!(!Platform::Desktop.supports_native_hit_testing());
        assert!(!Platform::Headless.supports_native_hit_testing());
    }

    #[test]
    fn test_platform_names() {
        assert_eq!(Platform::Ios.as_str(), "ios");
        assert_eq!(Platform::Headless.as_str(), "headless");
    }

    #[test]
    fn test_strategy_names_are_distinct() {
        assert_ne!(DISTANCE_STRATEGY, SPATIAL_STRATEGY);
        assert_ne!(SPATIAL_STRATEGY, NATIVE_STRATEGY);
        assert_ne!(DISTANCE_STRATEGY, NATIVE_STRATEGY);
    }
}
