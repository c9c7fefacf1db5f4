//! Click selection subsystem.
//!
//! Resolving a click to a marker has no single best algorithm: a linear
//! distance scan is unbeatable for small sets, a spatial index wins in
//! crowded viewports, and mobile map controls can answer from their own
//! hit-testing. This module keeps all three behind one trait and routes
//! each click through the [`SelectionCoordinator`], which derives a
//! per-click [`SelectionContext`] and picks accordingly.
//!
//! Strategy usage is observable through [`SelectionMetrics`].

mod context;
mod coordinator;
mod distance;
mod metrics;
mod native;
mod spatial;
mod strategy;

pub use context::{
    zoom_bucket_for_span, PrecisionTier, SelectionContext, DEFAULT_ZOOM_BUCKET, DENSE_PINS_PER_KM2,
    DENSE_PIN_COUNT,
};
pub use coordinator::SelectionCoordinator;
pub use distance::DistanceSelection;
pub use metrics::{SelectionMetrics, StrategyStats};
pub use native::{HitTestSurface, NativeHitTestSelection, StaticHitTest};
pub use spatial::SpatialSelection;
pub use strategy::{
    BoxFuture, Platform, SelectionStrategy, DISTANCE_STRATEGY, NATIVE_STRATEGY, SPATIAL_STRATEGY,
};
