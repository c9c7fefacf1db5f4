//! Spot domain model and the read-only source seam.
//!
//! Spots are owned and mutated by an external collaborator; the engine only
//! ever sees immutable snapshots pulled through [`SpotSource`].

use std::fmt;

use parking_lot::RwLock;

use crate::coord::{BoundingBox, Coordinate};

/// Stable identity of a spot, assigned by the external source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SpotId(pub u64);

impl From<u64> for SpotId {
    fn from(id: u64) -> Self {
        SpotId(id)
    }
}

impl fmt::Display for SpotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "spot#{}", self.0)
    }
}

/// An immutable snapshot of a point of interest.
#[derive(Debug, Clone, PartialEq)]
pub struct Spot {
    pub id: SpotId,
    pub name: String,
    pub coordinate: Coordinate,
    /// Free-text notes carried along for display; never interpreted.
    pub notes: String,
}

impl Spot {
    pub fn new(id: impl Into<SpotId>, name: impl Into<String>, coordinate: Coordinate) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            coordinate,
            notes: String::new(),
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }
}

impl fmt::Display for Spot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} '{}' {}", self.id, self.name, self.coordinate)
    }
}

/// Read-only provider of spot snapshots.
///
/// The engine never mutates the source. Implementations return owned
/// snapshots; staleness between calls is acceptable and expected.
pub trait SpotSource: Send + Sync {
    /// Returns the spot with the given id, if present.
    fn spot(&self, id: SpotId) -> Option<Spot>;

    /// Returns snapshots of all spots whose coordinate lies within `bounds`.
    fn spots_in(&self, bounds: &BoundingBox) -> Vec<Spot>;

    /// Returns snapshots of every spot the source knows about.
    fn all_spots(&self) -> Vec<Spot>;
}

/// In-memory spot source for embedders and tests.
#[derive(Debug, Default)]
pub struct StaticSpotSource {
    spots: RwLock<Vec<Spot>>,
}

impl StaticSpotSource {
    pub fn new(spots: Vec<Spot>) -> Self {
        Self {
            spots: RwLock::new(spots),
        }
    }

    /// Replaces the full spot list, simulating an upstream refresh.
    pub fn replace(&self, spots: Vec<Spot>) {
        *self.spots.write() = spots;
    }

    pub fn push(&self, spot: Spot) {
        self.spots.write().push(spot);
    }

    pub fn len(&self) -> usize {
        self.spots.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.spots.read().is_empty()
    }
}

impl SpotSource for StaticSpotSource {
    fn spot(&self, id: SpotId) -> Option<Spot> {
        self.spots.read().iter().find(|s| s.id == id).cloned()
    }

    fn spots_in(&self, bounds: &BoundingBox) -> Vec<Spot> {
        self.spots
            .read()
            .iter()
            .filter(|s| bounds.contains(s.coordinate))
            .cloned()
            .collect()
    }

    fn all_spots(&self) -> Vec<Spot> {
        self.spots.read().clone()
    }
}
