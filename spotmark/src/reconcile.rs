//! Incremental reconciliation of the visible marker set against a new
//! spot collection.
//!
//! Diffing is keyed by stable spot id: markers whose spot still exists are
//! rewritten in place when the content changed, markers whose id vanished
//! are evicted to the pool, and unseen spots get a created or recycled
//! marker. The result's id set always equals the id set of the valid new
//! spots, whatever the starting state.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::debug;

use crate::marker::{Marker, MarkerKey};
use crate::spot::{Spot, SpotId};
use crate::store::MarkerStore;

pub struct Reconciler {
    store: Arc<MarkerStore>,
}

impl Reconciler {
    pub fn new(store: Arc<MarkerStore>) -> Self {
        Self { store }
    }

    /// Converges `current` onto `new_spots` without a full rebuild.
    ///
    /// Spots with invalid coordinates are skipped; an existing marker for
    /// such a spot is removed like any vanished id. Duplicate ids on either
    /// side collapse to their first occurrence.
    pub fn reconcile(&self, current: Vec<Arc<Marker>>, new_spots: &[Spot]) -> Vec<Arc<Marker>> {
        let mut by_id: HashMap<SpotId, Arc<Marker>> = HashMap::new();
        for marker in current {
            match by_id.entry(marker.spot_id()) {
                Entry::Vacant(slot) => {
                    slot.insert(marker);
                }
                Entry::Occupied(existing) => {
                    // A second handle to the same instance is just dropped;
                    // a distinct instance with the same id is retired.
                    if !Arc::ptr_eq(existing.get(), &marker) {
                        self.store.evict(&marker);
                    }
                }
            }
        }

        let mut result = Vec::with_capacity(new_spots.len());
        let mut seen: HashSet<SpotId> = HashSet::with_capacity(new_spots.len());
        let mut added = 0usize;
        let mut updated = 0usize;
        let mut skipped_invalid = 0usize;

        for spot in new_spots {
            if !seen.insert(spot.id) {
                continue;
            }
            match by_id.remove(&spot.id) {
                Some(marker) => {
                    if marker.key() == MarkerKey::for_spot(spot) {
                        // Content unchanged; keep the marker as it is
                        result.push(marker);
                    } else if self.store.rewrite_marker(&marker, spot) {
                        updated += 1;
                        result.push(marker);
                    } else {
                        // The new snapshot is invalid; retire the marker
                        self.store.evict(&marker);
                        skipped_invalid += 1;
                    }
                }
                None => {
                    if let Some(marker) = self.store.get_or_create(spot) {
                        added += 1;
                        result.push(marker);
                    } else {
                        skipped_invalid += 1;
                    }
                }
            }
        }

        let removed = by_id.len();
        for marker in by_id.into_values() {
            self.store.evict(&marker);
        }

        debug!(
            added,
            updated,
            removed,
            skipped_invalid,
            visible = result.len(),
            "reconcile pass"
        );
        result
    }
}
