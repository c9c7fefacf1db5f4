//! Strategy coordination for click selection.
//!
//! One coordinator owns the strategy set for an engine. Each click derives
//! a [`SelectionContext`], picks the preferred strategy for that context,
//! and falls back to the distance scan whenever the preference cannot run.
//! Every attempt lands in the metrics registry, so strategy routing can be
//! observed in production without extra plumbing.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info};

use crate::config::EngineConfig;
use crate::coord::{Coordinate, Viewport};
use crate::error::EngineError;
use crate::marker::Marker;
use crate::selection::context::{PrecisionTier, SelectionContext, DENSE_PIN_COUNT};
use crate::selection::distance::DistanceSelection;
use crate::selection::metrics::SelectionMetrics;
use crate::selection::native::{HitTestSurface, NativeHitTestSelection};
use crate::selection::spatial::SpatialSelection;
use crate::selection::strategy::{
    Platform, SelectionStrategy, DISTANCE_STRATEGY, NATIVE_STRATEGY, SPATIAL_STRATEGY,
};
use crate::spot::Spot;

/// Routes clicks to the selection strategy the context calls for.
pub struct SelectionCoordinator {
    platform: Platform,
    strategies: Vec<Arc<dyn SelectionStrategy>>,
    /// Distance scan is applicable in every context, so selection always
    /// has somewhere to land.
    fallback: Arc<dyn SelectionStrategy>,
    metrics: SelectionMetrics,
}

impl SelectionCoordinator {
    /// Creates a coordinator with the standard strategy set: spatial-index,
    /// native hit-test, and the distance scan.
    pub fn new(
        platform: Platform,
        config: &EngineConfig,
        hit_test: Option<Arc<dyn HitTestSurface>>,
    ) -> Self {
        let distance: Arc<dyn SelectionStrategy> =
            Arc::new(DistanceSelection::new(config.click_tolerance_km));
        let strategies: Vec<Arc<dyn SelectionStrategy>> = vec![
            Arc::new(SpatialSelection::new(
                config.click_tolerance_km,
                config.spatial_index_min_markers,
            )),
            Arc::new(NativeHitTestSelection::new(hit_test)),
            Arc::clone(&distance),
        ];

        info!(
            platform = platform.as_str(),
            strategies = strategies.len(),
            tolerance_km = config.click_tolerance_km,
            "selection coordinator initialized"
        );

        SelectionCoordinator {
            platform,
            strategies,
            fallback: distance,
            metrics: SelectionMetrics::new(),
        }
    }

    /// Creates a coordinator over a caller-supplied strategy set.
    ///
    /// The distance fallback is still built internally, so a custom set
    /// only changes which preferences can be satisfied. An empty set is a
    /// configuration error and is rejected up front.
    pub fn with_strategies(
        platform: Platform,
        config: &EngineConfig,
        strategies: Vec<Arc<dyn SelectionStrategy>>,
    ) -> Result<Self, EngineError> {
        if strategies.is_empty() {
            return Err(EngineError::NoStrategies);
        }
        Ok(SelectionCoordinator {
            platform,
            strategies,
            fallback: Arc::new(DistanceSelection::new(config.click_tolerance_km)),
            metrics: SelectionMetrics::new(),
        })
    }

    /// Resolves a click against the visible markers.
    ///
    /// Derives the selection context, runs the preferred strategy when it
    /// is applicable, otherwise the distance fallback. The attempt is
    /// recorded in the metrics registry either way. `None` means the click
    /// landed on empty map.
    pub async fn select(
        &self,
        click: Coordinate,
        markers: &[Arc<Marker>],
        viewport: Option<&Viewport>,
        pin_count: Option<usize>,
    ) -> Option<Arc<Spot>> {
        let context = SelectionContext::derive(markers.len(), viewport, pin_count);
        let preferred = preferred_strategy(&context);

        let strategy = self
            .strategies
            .iter()
            .find(|s| s.name() == preferred && s.is_applicable(self.platform, &context))
            .unwrap_or(&self.fallback);

        let started = Instant::now();
        let selected = strategy.select(click, markers, viewport).await;
        self.metrics
            .record(strategy.name(), started.elapsed(), selected.is_some());

        debug!(
            strategy = strategy.name(),
            preferred,
            zoom_bucket = context.zoom_bucket,
            dense = context.dense,
            precision = context.precision.as_str(),
            visible = context.visible_count,
            found = selected.is_some(),
            "selection attempt"
        );

        selected
    }

    /// Per-strategy usage statistics.
    pub fn metrics(&self) -> &SelectionMetrics {
        &self.metrics
    }
}

/// Strategy preference for a context.
///
/// Density outranks precision: in a crowded viewport the spatial index
/// beats anything else regardless of zoom. At maximum precision the native
/// surface gives the answer the user saw on screen. Everything else is the
/// plain distance scan.
fn preferred_strategy(context: &SelectionContext) -> &'static str {
    if context.dense && context.pin_count > DENSE_PIN_COUNT {
        SPATIAL_STRATEGY
    } else if context.precision == PrecisionTier::Maximum {
        NATIVE_STRATEGY
    } else {
        DISTANCE_STRATEGY
    }
}
