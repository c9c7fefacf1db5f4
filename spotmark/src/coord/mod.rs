//! Geographic coordinate module
//!
//! Provides the coordinate, viewport, and bounding-box types used throughout
//! the marker engine, plus great-circle distance for click resolution.

mod types;

pub use types::{BoundingBox, Coordinate, Viewport, KM_PER_DEGREE, MAX_LAT, MAX_LON};

/// Earth's mean radius in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

const DEG_TO_RAD: f64 = std::f64::consts::PI / 180.0;

/// Calculates the great-circle distance between two coordinates in kilometers.
///
/// Uses the haversine formula, accurate to well under marker-selection
/// tolerance at any distance the engine cares about.
///
/// # Arguments
///
/// * `from` - Starting coordinate
/// * `to` - Ending coordinate
///
/// # Returns
///
/// Distance in kilometers along the great circle.
#[inline]
pub fn distance_km(from: Coordinate, to: Coordinate) -> f64 {
    let lat1 = from.lat * DEG_TO_RAD;
    let lat2 = to.lat * DEG_TO_RAD;
    let dlat = (to.lat - from.lat) * DEG_TO_RAD;
    let dlon = (to.lon - from.lon) * DEG_TO_RAD;

    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().min(1.0).asin();

    EARTH_RADIUS_KM * c
}
