//! Spatial-index selection over an ephemeral uniform grid.
//!
//! For dense viewports a linear scan touches every marker on each click.
//! This strategy buckets the visible markers into fixed-size grid cells and
//! only measures distance to markers in cells the tolerance radius can
//! reach. The grid is rebuilt per call; at the marker counts where this
//! strategy applies, the build is cheap next to the scan it avoids, and an
//! ephemeral grid can never go stale against the visible set.
//!
//! The cell walk is sized so that every marker the linear scan would accept
//! is visited, so both strategies resolve any click to the same marker.

use std::collections::HashMap;
use std::f64::consts::PI;
use std::sync::Arc;

use crate::coord::{
    distance_km, Coordinate, Viewport, EARTH_RADIUS_KM, KM_PER_DEGREE, MAX_LAT, MAX_LON,
};
use crate::marker::Marker;
use crate::selection::strategy::{BoxFuture, SelectionStrategy, SPATIAL_STRATEGY};
use crate::selection::{Platform, SelectionContext};
use crate::spot::Spot;

/// Lower bound on the grid cell edge, in degrees.
const MIN_CELL_DEG: f64 = 1e-6;

/// Maps a coordinate to a grid cell index along one axis.
///
/// Rounds toward negative infinity and saturates outside the `i32` range.
#[inline]
fn cell_coord(value: f64, cell_deg: f64) -> i32 {
    let t = value / cell_deg;
    if t >= i32::MAX as f64 {
        return i32::MAX;
    }
    if t <= i32::MIN as f64 {
        return i32::MIN;
    }
    let coord = t as i32;
    // The cast truncated; shift down when the value was negative.
    if t < 0.0 && (coord as f64) > t {
        coord - 1
    } else {
        coord
    }
}

/// Longitude reach, in degrees, that covers every point within
/// `tolerance_km` of a click at `click_lat`.
///
/// Longitude degrees shrink toward the poles, so the reach is computed at
/// the most poleward latitude the tolerance can touch. When the tolerance
/// circle can wrap the pole the reach degrades to the full longitude range.
fn lon_reach_degrees(click_lat: f64, lat_reach: f64, tolerance_km: f64) -> f64 {
    let far_lat = (click_lat.abs() + lat_reach).min(MAX_LAT);
    let cos_far = far_lat.to_radians().cos();
    let half_chord = (tolerance_km.min(PI * EARTH_RADIUS_KM) / (2.0 * EARTH_RADIUS_KM)).sin();
    if half_chord >= cos_far {
        return 2.0 * MAX_LON;
    }
    2.0 * (half_chord / cos_far).asin().to_degrees()
}

/// Per-click uniform grid over marker positions.
struct ClickGrid<'a> {
    cell_deg: f64,
    cells: HashMap<(i32, i32), Vec<usize>>,
    markers: &'a [Arc<Marker>],
}

impl<'a> ClickGrid<'a> {
    /// Buckets every marker into its cell. Each marker is a point, so it
    /// lands in exactly one cell.
    fn build(markers: &'a [Arc<Marker>], tolerance_km: f64) -> Self {
        let cell_deg = (tolerance_km / KM_PER_DEGREE).max(MIN_CELL_DEG);
        let mut cells: HashMap<(i32, i32), Vec<usize>> = HashMap::new();
        for (index, marker) in markers.iter().enumerate() {
            let at = marker.coordinate();
            let cell = (cell_coord(at.lat, cell_deg), cell_coord(at.lon, cell_deg));
            cells.entry(cell).or_default().push(index);
        }
        ClickGrid {
            cell_deg,
            cells,
            markers,
        }
    }

    /// Index of the nearest marker within `tolerance_km` of the click.
    ///
    /// Visits only the cells the tolerance radius can reach. Ties on exact
    /// distance resolve to the lowest marker index, matching a scan in
    /// input order.
    fn nearest_within(&self, click: Coordinate, tolerance_km: f64) -> Option<usize> {
        let lat_reach = tolerance_km / KM_PER_DEGREE;
        let lon_reach = lon_reach_degrees(click.lat, lat_reach, tolerance_km);

        let lat_lo = cell_coord(click.lat - lat_reach, self.cell_deg);
        let lat_hi = cell_coord(click.lat + lat_reach, self.cell_deg);
        let lon_lo = cell_coord(click.lon - lon_reach, self.cell_deg);
        let lon_hi = cell_coord(click.lon + lon_reach, self.cell_deg);

        let mut best: Option<(usize, f64)> = None;
        for lat_cell in lat_lo..=lat_hi {
            for lon_cell in lon_lo..=lon_hi {
                let Some(bucket) = self.cells.get(&(lat_cell, lon_cell)) else {
                    continue;
                };
                for &index in bucket {
                    let distance = distance_km(click, self.markers[index].coordinate());
                    if distance > tolerance_km {
                        continue;
                    }
                    let better = match best {
                        None => true,
                        Some((best_index, best_distance)) => {
                            distance < best_distance
                                || (distance == best_distance && index < best_index)
                        }
                    };
                    if better {
                        best = Some((index, distance));
                    }
                }
            }
        }
        best.map(|(index, _)| index)
    }
}

/// Selects via a per-click uniform grid instead of a full scan.
pub struct SpatialSelection {
    tolerance_km: f64,
    min_markers: usize,
}

impl SpatialSelection {
    pub fn new(tolerance_km: f64, min_markers: usize) -> Self {
        SpatialSelection {
            tolerance_km,
            min_markers,
        }
    }
}

impl SelectionStrategy for SpatialSelection {
    fn name(&self) -> &'static str {
        SPATIAL_STRATEGY
    }

    /// The grid build only pays off past a minimum marker count.
    fn is_applicable(&self, _platform: Platform, context: &SelectionContext) -> bool {
        context.visible_count >= self.min_markers
    }

    fn select<'a>(
        &'a self,
        click: Coordinate,
        markers: &'a [Arc<Marker>],
        _viewport: Option<&'a Viewport>,
    ) -> BoxFuture<'a, Option<Arc<Spot>>> {
        Box::pin(async move {
            let grid = ClickGrid::build(markers, self.tolerance_km);
            grid.nearest_within(click, self.tolerance_km)
                .map(|index| markers[index].spot())
        })
    }
}
