//! Renderable marker instances and their content-addressed keys.
//!
//! A marker is mutable in place so that pooled instances can be rewritten
//! for a new spot instead of reallocated. Construction and rewriting happen
//! inside the store, after the spot's coordinate has passed validation.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::coord::Coordinate;
use crate::spot::{Spot, SpotId};

/// Composite cache key over spot id, display name, and coordinate bits.
///
/// Any change to a spot's name or position yields a different key, so stale
/// cache entries are never served for edited content.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MarkerKey {
    pub spot_id: SpotId,
    pub name: String,
    lat_bits: u64,
    lon_bits: u64,
}

impl MarkerKey {
    pub fn for_spot(spot: &Spot) -> Self {
        Self {
            spot_id: spot.id,
            name: spot.name.clone(),
            lat_bits: spot.coordinate.lat.to_bits(),
            lon_bits: spot.coordinate.lon.to_bits(),
        }
    }
}

impl fmt::Display for MarkerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:'{}'", self.spot_id, self.name)
    }
}

/// The rewritable content of a marker.
#[derive(Debug, Clone)]
pub struct MarkerState {
    pub label: String,
    pub coordinate: Coordinate,
    /// Association back to the originating spot snapshot.
    pub spot: Arc<Spot>,
}

impl MarkerState {
    fn from_spot(spot: Arc<Spot>) -> Self {
        Self {
            label: spot.name.clone(),
            coordinate: spot.coordinate,
            spot,
        }
    }
}

/// A map annotation derived from a spot.
///
/// Shared as `Arc<Marker>` between the cache, the visible set, and the
/// rendering surface; the interior lock lets the pool rewrite an instance
/// without invalidating outstanding handles.
#[derive(Debug)]
pub struct Marker {
    state: RwLock<MarkerState>,
}

impl Marker {
    pub(crate) fn new(spot: Arc<Spot>) -> Self {
        Self {
            state: RwLock::new(MarkerState::from_spot(spot)),
        }
    }

    /// Overwrites this instance's content from a new spot snapshot.
    pub(crate) fn rewrite(&self, spot: Arc<Spot>) {
        *self.state.write() = MarkerState::from_spot(spot);
    }

    pub fn label(&self) -> String {
        self.state.read().label.clone()
    }

    pub fn coordinate(&self) -> Coordinate {
        self.state.read().coordinate
    }

    pub fn spot(&self) -> Arc<Spot> {
        Arc::clone(&self.state.read().spot)
    }

    pub fn spot_id(&self) -> SpotId {
        self.state.read().spot.id
    }

    /// The content key this marker is currently cached under.
    pub fn key(&self) -> MarkerKey {
        let state = self.state.read();
        MarkerKey {
            spot_id: state.spot.id,
            name: state.label.clone(),
            lat_bits: state.coordinate.lat.to_bits(),
            lon_bits: state.coordinate.lon.to_bits(),
        }
    }

    /// Clones the current content for display or assertions.
    pub fn snapshot(&self) -> MarkerState {
        self.state.read().clone()
    }
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.read();
        write!(f, "'{}' {}", state.label, state.coordinate)
    }
}
