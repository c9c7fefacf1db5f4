//! Integration tests for the marker engine.
//!
//! These tests exercise the complete engine flow:
//! - Batch transformation → cache/pool → statistics
//! - Viewport optimization, culling, and publication
//! - Debounced viewport recomputation
//! - Id-keyed reconciliation against a changing source
//! - Click selection with strategy routing and metrics
//!
//! Run with: `cargo test --test engine_integration`

use std::sync::Arc;
use std::time::Duration;

use spotmark::config::EngineConfig;
use spotmark::coord::{Coordinate, Viewport};
use spotmark::engine::MarkerEngine;
use spotmark::selection::{
    DistanceSelection, Platform, SelectionStrategy, SpatialSelection, StaticHitTest,
    NATIVE_STRATEGY, SPATIAL_STRATEGY,
};
use spotmark::spot::{Spot, SpotId, StaticSpotSource};

// ============================================================================
// Helper Functions
// ============================================================================

/// Debounce delay used by test engines.
const DELAY: Duration = Duration::from_millis(25);
/// Comfortable margin for a debounce window to close and the worker to run.
const SETTLE: Duration = Duration::from_millis(200);

fn spot(id: u64, lat: f64, lon: f64) -> Spot {
    Spot::new(SpotId(id), format!("spot-{id}"), Coordinate::new(lat, lon))
}

/// A row of spots spaced 0.001 degrees of longitude apart.
fn spot_row(count: u64, lat: f64, start_lon: f64) -> Vec<Spot> {
    (0..count)
        .map(|i| spot(i, lat, start_lon + i as f64 * 0.001))
        .collect()
}

fn test_config() -> EngineConfig {
    EngineConfig {
        debounce_delay: DELAY,
        ..EngineConfig::default()
    }
}

fn engine_with(config: EngineConfig, spots: Vec<Spot>) -> MarkerEngine {
    let source = Arc::new(StaticSpotSource::new(spots));
    MarkerEngine::new(config, source, Platform::Headless, None)
        .expect("test config should validate")
}

// ============================================================================
// Cache Reuse
// ============================================================================

/// Processing the same spot list twice must serve the second pass entirely
/// from the cache, returning the same marker instances.
#[tokio::test]
async fn test_repeat_processing_reuses_cached_markers() {
    let engine = engine_with(test_config(), Vec::new());
    let spots = spot_row(10, 40.7, -74.0);

    let first = engine.process_spots(spots.clone()).await;
    let second = engine.process_spots(spots).await;

    assert_eq!(first.valid, 10);
    assert_eq!(second.valid, 10);
    assert_eq!(second.cache_hits, 10, "Second pass should be all hits");

    // One batch each, so both outcomes are in input order and can be
    // compared pairwise.
    for (a, b) in first.markers.iter().zip(second.markers.iter()) {
        assert!(Arc::ptr_eq(a, b), "Cached marker instance should be reused");
        assert_eq!(a.key(), b.key());
    }
}

// ============================================================================
// Bounded Capacity
// ============================================================================

/// Whatever the volume, the cache stays within its cleanup threshold and
/// the pool within its maximum.
#[tokio::test]
async fn test_capacity_bounds_hold_under_volume() {
    let config = EngineConfig {
        max_cached_markers: 20,
        max_pooled_markers: 5,
        ..test_config()
    };
    let threshold = config.cleanup_threshold();
    let engine = engine_with(config, Vec::new());

    // 300 distinct spots, well past every bound.
    let spots: Vec<Spot> = (0..300).map(|i| spot(i, 40.0, -74.0 + i as f64 * 0.01)).collect();
    let outcome = engine.process_spots(spots).await;

    assert_eq!(outcome.valid, 300);
    let stats = engine.store_stats();
    assert!(
        stats.cached <= threshold,
        "Cache {} should stay within threshold {}",
        stats.cached,
        threshold
    );
    assert!(stats.pooled <= 5, "Pool {} should stay within max 5", stats.pooled);
    assert!(stats.cleanup_passes >= 1, "Volume should have forced cleanup");
}

// ============================================================================
// Viewport Optimization
// ============================================================================

/// Culling and admission against viewport bounds, published to subscribers.
#[tokio::test]
async fn test_viewport_cull_and_admit() {
    let engine = engine_with(
        test_config(),
        vec![
            spot(1, 40.7, -74.0),
            spot(2, 40.9, -73.9),
            spot(3, 10.0, 10.0),
            spot(4, 1000.0, 0.0),
        ],
    );
    let mut rx = engine.subscribe();
    let manhattan = Viewport::new(Coordinate::new(40.75, -73.98), 1.0, 1.0);

    let visible = engine.optimize_viewport(&manhattan);

    let mut ids: Vec<u64> = visible.iter().map(|m| m.spot_id().0).collect();
    ids.sort_unstable();
    assert_eq!(ids, vec![1, 2], "Only in-bounds valid spots are visible");
    assert!(rx.has_changed().unwrap());
    assert_eq!(rx.borrow_and_update().len(), 2);

    // Move the viewport; previous markers are culled, the far spot admitted.
    let pacific = Viewport::new(Coordinate::new(10.0, 10.0), 1.0, 1.0);
    let visible = engine.optimize_viewport(&pacific);

    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].spot_id(), SpotId(3));
    assert_eq!(engine.store_stats().evictions, 2, "Culled markers are evicted");
}

/// Re-optimizing an unchanged viewport returns the identical visible set.
#[tokio::test]
async fn test_viewport_optimization_is_idempotent() {
    let engine = engine_with(test_config(), spot_row(20, 40.75, -74.0));
    let viewport = Viewport::new(Coordinate::new(40.75, -73.99), 0.5, 0.5);

    let first = engine.optimize_viewport(&viewport);
    let second = engine.optimize_viewport(&viewport);

    assert_eq!(first.len(), second.len());
    for (a, b) in first.iter().zip(second.iter()) {
        assert!(
            Arc::ptr_eq(a, b),
            "Unchanged viewport should keep the same marker instances"
        );
    }
}

// ============================================================================
// Debounced Recomputation
// ============================================================================

/// A burst of viewport changes coalesces into one recomputation of the
/// latest viewport.
#[tokio::test]
async fn test_viewport_burst_coalesces() {
    let mut spots = spot_row(3, 10.0, 10.0);
    spots.extend((10..14).map(|i| spot(i, 40.75, -74.0 + (i - 10) as f64 * 0.001)));
    let engine = engine_with(test_config(), spots);

    // Five rapid changes ending on Manhattan.
    for _ in 0..4 {
        engine
            .request_viewport(Viewport::new(Coordinate::new(10.0, 10.0), 1.0, 1.0))
            .unwrap();
    }
    engine
        .request_viewport(Viewport::new(Coordinate::new(40.75, -74.0), 1.0, 1.0))
        .unwrap();
    tokio::time::sleep(SETTLE).await;

    let visible = engine.visible();
    assert_eq!(visible.len(), 4, "Only the final viewport was recomputed");
    assert!(visible.iter().all(|m| m.spot_id().0 >= 10));
    // A single optimization pass created only the final viewport's markers.
    assert_eq!(engine.store_stats().created, 4);
}

// ============================================================================
// Reconciliation
// ============================================================================

/// The visible set converges to the source's id set through adds, moves,
/// renames, and removals.
#[tokio::test]
async fn test_reconcile_converges_across_source_changes() {
    let source = Arc::new(StaticSpotSource::new(vec![
        spot(1, 40.7, -74.0),
        spot(2, 40.8, -74.1),
        spot(3, 40.9, -74.2),
    ]));
    let engine = MarkerEngine::new(
        test_config(),
        Arc::<StaticSpotSource>::clone(&source),
        Platform::Headless,
        None,
    )
    .unwrap();
    let initial = engine.reconcile_with_source();
    assert_eq!(initial.len(), 3);
    let moved_marker = initial
        .iter()
        .find(|m| m.spot_id() == SpotId(2))
        .cloned()
        .unwrap();

    // Spot 1 removed, spot 2 moved, spot 3 unchanged, spot 4 added.
    source.replace(vec![
        spot(2, 41.0, -74.5),
        spot(3, 40.9, -74.2),
        spot(4, 40.6, -73.9),
    ]);
    let visible = engine.reconcile_with_source();

    let mut ids: Vec<u64> = visible.iter().map(|m| m.spot_id().0).collect();
    ids.sort_unstable();
    assert_eq!(ids, vec![2, 3, 4]);

    // The moved spot kept its marker instance, rewritten in place.
    let rewritten = visible.iter().find(|m| m.spot_id() == SpotId(2)).unwrap();
    assert!(Arc::ptr_eq(&moved_marker, rewritten));
    assert_eq!(rewritten.coordinate(), Coordinate::new(41.0, -74.5));
}

// ============================================================================
// Selection
// ============================================================================

/// The distance and spatial-index strategies resolve every click to the
/// same spot over the same marker set.
#[tokio::test]
async fn test_selection_strategies_agree() {
    // A 15 x 15 grid of spots spaced 0.05 degrees apart.
    let spots: Vec<Spot> = (0..225)
        .map(|i| {
            spot(
                i,
                40.0 + (i / 15) as f64 * 0.05,
                -74.0 + (i % 15) as f64 * 0.05,
            )
        })
        .collect();
    let engine = engine_with(test_config(), spots);
    let viewport = Viewport::new(Coordinate::new(40.35, -73.65), 1.0, 1.0);
    let markers = engine.optimize_viewport(&viewport);
    assert_eq!(markers.len(), 225);

    let distance = DistanceSelection::new(25.0);
    let spatial = SpatialSelection::new(25.0, 32);
    let clicks = [
        Coordinate::new(40.26, -73.74),
        Coordinate::new(40.0, -74.0),
        Coordinate::new(40.42, -73.53),
        Coordinate::new(39.0, -74.0),
        Coordinate::new(40.125, -73.875),
    ];

    for click in clicks {
        let by_distance = distance.select(click, &markers, None).await;
        let by_spatial = spatial.select(click, &markers, None).await;
        assert_eq!(
            by_distance.as_ref().map(|s| s.id),
            by_spatial.as_ref().map(|s| s.id),
            "Strategies disagree at {click}"
        );
    }
}

/// Strategy agreement over an unstructured scatter, where cell boundaries
/// fall wherever they fall.
#[tokio::test]
async fn test_selection_strategies_agree_on_random_scatter() {
    use rand::Rng;

    let mut rng = rand::rng();
    let spots: Vec<Spot> = (0..120)
        .map(|i| {
            spot(
                i,
                40.0 + rng.random_range(-0.5..0.5),
                -74.0 + rng.random_range(-0.5..0.5),
            )
        })
        .collect();
    let engine = engine_with(test_config(), spots);
    let viewport = Viewport::new(Coordinate::new(40.0, -74.0), 1.2, 1.2);
    let markers = engine.optimize_viewport(&viewport);
    assert_eq!(markers.len(), 120);

    let distance = DistanceSelection::new(25.0);
    let spatial = SpatialSelection::new(25.0, 32);

    for _ in 0..30 {
        let click = Coordinate::new(
            40.0 + rng.random_range(-0.6..0.6),
            -74.0 + rng.random_range(-0.6..0.6),
        );
        let by_distance = distance.select(click, &markers, None).await;
        let by_spatial = spatial.select(click, &markers, None).await;
        assert_eq!(
            by_distance.as_ref().map(|s| s.id),
            by_spatial.as_ref().map(|s| s.id),
            "Strategies disagree at {click}"
        );
    }
}

/// Three spots, click near the middle one: both strategies pick it.
#[tokio::test]
async fn test_selection_picks_the_close_neighbor() {
    let engine = engine_with(
        test_config(),
        vec![
            spot(1, 0.0001, 0.0001),
            spot(2, 0.0, 1.0),
            spot(3, 1.0, 1.0),
        ],
    );
    let viewport = Viewport::new(Coordinate::new(0.5, 0.5), 3.0, 3.0);
    let markers = engine.optimize_viewport(&viewport);
    assert_eq!(markers.len(), 3);

    // About 15.7 km from spot 2; the others are past 100 km.
    let click = Coordinate::new(0.1, 0.9);
    let by_distance = DistanceSelection::new(25.0).select(click, &markers, None).await;
    let by_spatial = SpatialSelection::new(25.0, 1).select(click, &markers, None).await;

    assert_eq!(by_distance.map(|s| s.id), Some(SpotId(2)));
    assert_eq!(by_spatial.map(|s| s.id), Some(SpotId(2)));
}

/// In a dense, tightly zoomed viewport the coordinator must route the
/// click to the spatial index even when a native surface is available.
#[tokio::test]
async fn test_dense_viewport_routes_past_native_surface() {
    let source = Arc::new(StaticSpotSource::new(spot_row(500, 40.0, -74.25)));
    let decoy = Arc::new(Spot::new(
        SpotId(9999),
        "decoy",
        Coordinate::new(1.0, 1.0),
    ));
    let engine = MarkerEngine::new(
        test_config(),
        source,
        Platform::Ios,
        Some(Arc::new(StaticHitTest::hit(decoy))),
    )
    .unwrap();

    let viewport = Viewport::new(Coordinate::new(40.0, -74.0), 0.04, 0.04);
    let visible = engine.optimize_viewport(&viewport);
    assert!(visible.len() >= 32, "Need enough markers for the spatial index");

    let selected = engine
        .select_at(Coordinate::new(40.0, -74.0), Some(&viewport), Some(500))
        .await;

    assert_eq!(
        selected.map(|s| s.id),
        Some(SpotId(250)),
        "The real nearest marker wins, not the decoy"
    );
    let metrics = engine.selection_metrics();
    assert_eq!(metrics.get(SPATIAL_STRATEGY).unwrap().uses, 1);
    assert!(
        !metrics.contains_key(NATIVE_STRATEGY),
        "The native surface must not have been consulted"
    );
}

// ============================================================================
// Invalid Coordinates
// ============================================================================

/// An out-of-range latitude is excluded and counted without disturbing
/// the valid spots around it.
#[tokio::test]
async fn test_invalid_latitude_is_excluded() {
    let engine = engine_with(test_config(), Vec::new());
    let spots = vec![
        spot(1, 40.7, -74.0),
        spot(2, 1000.0, -74.0),
        spot(3, 40.9, -74.2),
    ];

    let outcome = engine.process_spots(spots).await;

    assert_eq!(outcome.valid, 2);
    assert_eq!(outcome.invalid, 1);
    assert_eq!(outcome.markers.len(), 2);
    assert!(outcome.markers.iter().all(|m| m.coordinate().is_valid()));
}

// ============================================================================
// Clear
// ============================================================================

/// After `clear_caches` the engine behaves exactly as if freshly built.
#[tokio::test]
async fn test_clear_restores_fresh_state() {
    let engine = engine_with(test_config(), Vec::new());
    let spots = spot_row(5, 40.7, -74.0);

    let first = engine.process_spots(spots.clone()).await;
    assert_eq!(first.cache_misses, 5);

    engine.clear_caches();
    assert_eq!(engine.store_stats().cached, 0);
    assert_eq!(engine.store_stats().hits, 0);

    let again = engine.process_spots(spots).await;
    assert_eq!(again.cache_misses, 5, "No hits against a cleared cache");
    assert_eq!(again.valid, 5);
    assert_eq!(engine.store_stats().created, 5, "All markers freshly created");
}

// ============================================================================
// Shutdown
// ============================================================================

/// Shutdown stops the debounce worker and rejects further viewport
/// requests while leaving reads intact.
#[tokio::test]
async fn test_shutdown_is_clean() {
    let engine = engine_with(test_config(), spot_row(3, 40.7, -74.0));
    let viewport = Viewport::new(Coordinate::new(40.7, -73.999), 1.0, 1.0);
    engine.optimize_viewport(&viewport);

    engine.shutdown().await;

    assert!(engine.request_viewport(viewport).is_err());
    assert_eq!(engine.visible().len(), 3, "Visible set still readable");
    assert_eq!(engine.store_stats().cached, 3);
}
