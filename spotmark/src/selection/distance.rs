//! Linear-scan distance selection.
//!
//! The baseline strategy and the unconditional fallback: scan every visible
//! marker, keep the nearest one within the click tolerance. Correct for any
//! marker count, cheap for the small sets that dominate real sessions.

use std::sync::Arc;

use crate::coord::{distance_km, Coordinate, Viewport};
use crate::marker::Marker;
use crate::selection::strategy::{BoxFuture, SelectionStrategy, DISTANCE_STRATEGY};
use crate::selection::{Platform, SelectionContext};
use crate::spot::Spot;

/// Index of the nearest marker within `tolerance_km` of the click.
///
/// Ties on exact distance keep the first marker encountered. Returns `None`
/// when no marker qualifies.
pub(crate) fn nearest_within(
    click: Coordinate,
    markers: &[Arc<Marker>],
    tolerance_km: f64,
) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (index, marker) in markers.iter().enumerate() {
        let distance = distance_km(click, marker.coordinate());
        if distance > tolerance_km {
            continue;
        }
        match best {
            Some((_, best_distance)) if distance >= best_distance => {}
            _ => best = Some((index, distance)),
        }
    }
    best.map(|(index, _)| index)
}

/// Selects the nearest marker within a fixed tolerance radius.
pub struct DistanceSelection {
    tolerance_km: f64,
}

impl DistanceSelection {
    pub fn new(tolerance_km: f64) -> Self {
        DistanceSelection { tolerance_km }
    }
}

impl SelectionStrategy for DistanceSelection {
    fn name(&self) -> &'static str {
        DISTANCE_STRATEGY
    }

    fn is_applicable(&self, _platform: Platform, _context: &SelectionContext) -> bool {
        true
    }

    fn select<'a>(
        &'a self,
        click: Coordinate,
        markers: &'a [Arc<Marker>],
        _viewport: Option<&'a Viewport>,
    ) -> BoxFuture<'a, Option<Arc<Spot>>> {
        Box::pin(async move {
            nearest_within(click, markers, self.tolerance_km).map(|index| markers[index].spot())
        })
    }
}
