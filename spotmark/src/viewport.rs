//! Viewport-driven culling and admission of markers.
//!
//! Derives a bounding box from the viewport, drops visible markers that
//! fell outside it (returning their instances to the pool), and admits
//! spots that moved inside it. Running the pass twice with unchanged input
//! yields the same visible key set.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::debug;

use crate::config::EngineConfig;
use crate::coord::Viewport;
use crate::marker::{Marker, MarkerKey};
use crate::spot::Spot;
use crate::store::MarkerStore;

pub struct ViewportOptimizer {
    store: Arc<MarkerStore>,
    culling_enabled: bool,
}

impl ViewportOptimizer {
    pub fn new(store: Arc<MarkerStore>, config: &EngineConfig) -> Self {
        Self {
            store,
            culling_enabled: config.viewport_culling_enabled,
        }
    }

    /// Computes the new visible set for `viewport`.
    ///
    /// Markers in `current` that left the bounds are evicted; spots in
    /// `all_spots` that lie within the bounds and are not yet represented
    /// are created or recycled and admitted. With culling disabled, every
    /// valid spot is admitted and nothing is evicted on geometry grounds.
    pub fn optimize(
        &self,
        current: Vec<Arc<Marker>>,
        viewport: &Viewport,
        all_spots: &[Spot],
    ) -> Vec<Arc<Marker>> {
        let bounds = viewport.bounds();
        let mut represented: HashSet<MarkerKey> = HashSet::new();
        let mut visible = Vec::new();
        let mut culled = 0usize;
        let mut admitted = 0usize;

        for marker in current {
            if !self.culling_enabled || bounds.contains(marker.coordinate()) {
                if represented.insert(marker.key()) {
                    visible.push(marker);
                }
            } else {
                self.store.evict(&marker);
                culled += 1;
            }
        }

        for spot in all_spots {
            if self.culling_enabled && !bounds.contains(spot.coordinate) {
                continue;
            }
            let key = MarkerKey::for_spot(spot);
            if represented.contains(&key) {
                continue;
            }
            // None means the coordinate failed validation; skip silently
            if let Some(marker) = self.store.get_or_create(spot) {
                represented.insert(key);
                visible.push(marker);
                admitted += 1;
            }
        }

        debug!(
            viewport = %viewport,
            culled,
            admitted,
            visible = visible.len(),
            "viewport optimization pass"
        );
        visible
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::Coordinate;
    use crate::spot::SpotId;

    fn spot(id: u64, lat: f64, lon: f64) -> Spot {
        Spot::new(id, format!("spot-{}", id), Coordinate::new(lat, lon))
    }

    fn key_set(markers: &[Arc<Marker>]) -> HashSet<MarkerKey> {
        markers.iter().map(|m| m.key()).collect()
    }

    fn setup() -> (Arc<MarkerStore>, ViewportOptimizer) {
        let config = EngineConfig::default();
        let store = Arc::new(MarkerStore::new(&config));
        let optimizer = ViewportOptimizer::new(Arc::clone(&store), &config);
        (store, optimizer)
    }

    #[test]
    fn test_culls_outside_and_admits_inside() {
        let (store, optimizer) = setup();
        let viewport = Viewport::new(Coordinate::new(10.0, 10.0), 2.0, 2.0);

        let inside = spot(1, 10.5, 10.5);
        let outside = spot(2, 50.0, 50.0);
        let newcomer = spot(3, 9.5, 9.5);

        let current = vec![
            store.get_or_create(&inside).unwrap(),
            store.get_or_create(&outside).unwrap(),
        ];

        let visible = optimizer.optimize(
            current,
            &viewport,
            &[inside.clone(), outside.clone(), newcomer.clone()],
        );

        let keys = key_set(&visible);
        assert_eq!(visible.len(), 2);
        assert!(keys.contains(&MarkerKey::for_spot(&inside)));
        assert!(keys.contains(&MarkerKey::for_spot(&newcomer)));
        assert!(!keys.contains(&MarkerKey::for_spot(&outside)));

        // The culled marker went back to the pool and left the cache
        assert_eq!(store.pooled_len(), 1);
        assert!(!store.contains_key(&MarkerKey::for_spot(&outside)));
    }

    #[test]
    fn test_idempotent_for_unchanged_input() {
        let (_store, optimizer) = setup();
        let viewport = Viewport::new(Coordinate::new(10.0, 10.0), 2.0, 2.0);
        let spots = vec![spot(1, 10.5, 10.5), spot(2, 9.5, 10.0), spot(3, 50.0, 50.0)];

        let first = optimizer.optimize(Vec::new(), &viewport, &spots);
        let second = optimizer.optimize(first.clone(), &viewport, &spots);

        assert_eq!(key_set(&first), key_set(&second));
        assert_eq!(first.len(), second.len());
    }

    #[test]
    fn test_culling_disabled_admits_everything_valid() {
        let config = EngineConfig {
            viewport_culling_enabled: false,
            ..Default::default()
        };
        let store = Arc::new(MarkerStore::new(&config));
        let optimizer = ViewportOptimizer::new(Arc::clone(&store), &config);
        let viewport = Viewport::new(Coordinate::new(10.0, 10.0), 2.0, 2.0);

        let far_away = spot(1, -60.0, 120.0);
        let invalid = spot(2, 1000.0, 0.0);

        let visible = optimizer.optimize(Vec::new(), &viewport, &[far_away.clone(), invalid]);

        assert_eq!(visible.len(), 1, "invalid spots stay excluded");
        assert_eq!(visible[0].spot_id(), SpotId(1));
        assert!(bounds_excludes(&viewport, &far_away));
        assert_eq!(store.pooled_len(), 0, "nothing culled with the toggle off");
    }

    fn bounds_excludes(viewport: &Viewport, spot: &Spot) -> bool {
        !viewport.bounds().contains(spot.coordinate)
    }

    #[test]
    fn test_duplicate_current_markers_deduped() {
        let (store, optimizer) = setup();
        let viewport = Viewport::new(Coordinate::new(10.0, 10.0), 2.0, 2.0);
        let s = spot(1, 10.2, 10.2);

        let marker = store.get_or_create(&s).unwrap();
        let current = vec![Arc::clone(&marker), marker];

        let visible = optimizer.optimize(current, &viewport, &[s]);
        assert_eq!(visible.len(), 1);
    }

    #[test]
    fn test_everything_culled_when_viewport_elsewhere() {
        let (store, optimizer) = setup();
        let viewport = Viewport::new(Coordinate::new(-40.0, -40.0), 1.0, 1.0);
        let spots = vec![spot(1, 10.0, 10.0), spot(2, 11.0, 11.0)];

        let current: Vec<_> = spots
            .iter()
            .map(|s| store.get_or_create(s).unwrap())
            .collect();

        let visible = optimizer.optimize(current, &viewport, &spots);
        assert!(visible.is_empty());
        assert_eq!(store.pooled_len(), 2);
    }
}
