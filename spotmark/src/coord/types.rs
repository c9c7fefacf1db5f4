//! Geographic primitive types shared across the engine.

use std::fmt;

/// Maximum valid latitude in degrees.
pub const MAX_LAT: f64 = 90.0;
/// Maximum valid longitude in degrees.
pub const MAX_LON: f64 = 180.0;

/// Approximate surface distance covered by one degree of latitude, in km.
///
/// The area heuristic applies it to longitude as well, without the
/// cos(latitude) correction.
pub const KM_PER_DEGREE: f64 = 111.0;

/// A geographic point in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Validity predicate applied before any spot becomes a marker.
    ///
    /// A coordinate is valid when `|lat| <= 90`, `|lon| <= 180`, and it is
    /// not exactly (0, 0); the origin is treated as an unset placeholder.
    /// NaN and infinite components fail the range comparisons and are
    /// therefore invalid.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.lat.abs() <= MAX_LAT
            && self.lon.abs() <= MAX_LON
            && !(self.lat == 0.0 && self.lon == 0.0)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.4}, {:.4})", self.lat, self.lon)
    }
}

/// Axis-aligned geographic bounds derived from a viewport.
///
/// Spans that would cross the ±180° meridian are not handled: a box whose
/// west edge is numerically greater than its east edge matches nothing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

impl BoundingBox {
    /// Returns true when the coordinate lies within the box (edges inclusive).
    #[inline]
    pub fn contains(&self, coord: Coordinate) -> bool {
        coord.lat <= self.north
            && coord.lat >= self.south
            && coord.lon <= self.east
            && coord.lon >= self.west
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[N {:.4} S {:.4} E {:.4} W {:.4}]",
            self.north, self.south, self.east, self.west
        )
    }
}

/// The visible map region: a center point plus angular spans.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub center: Coordinate,
    /// Latitude span in degrees (total height of the visible region).
    pub lat_span: f64,
    /// Longitude span in degrees (total width of the visible region).
    pub lon_span: f64,
}

impl Viewport {
    pub fn new(center: Coordinate, lat_span: f64, lon_span: f64) -> Self {
        Self {
            center,
            lat_span,
            lon_span,
        }
    }

    /// Derives the bounding box: center ± span/2 on each axis.
    #[inline]
    pub fn bounds(&self) -> BoundingBox {
        BoundingBox {
            north: self.center.lat + self.lat_span / 2.0,
            south: self.center.lat - self.lat_span / 2.0,
            east: self.center.lon + self.lon_span / 2.0,
            west: self.center.lon - self.lon_span / 2.0,
        }
    }

    /// Mean of the two angular spans, the input to zoom bucketing.
    #[inline]
    pub fn average_span(&self) -> f64 {
        (self.lat_span + self.lon_span) / 2.0
    }

    /// Approximate visible area in km², using the flat 111 km/degree factor
    /// on both axes.
    #[inline]
    pub fn area_km2(&self) -> f64 {
        self.lat_span * self.lon_span * KM_PER_DEGREE * KM_PER_DEGREE
    }
}

impl fmt::Display for Viewport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} span {:.4}x{:.4}",
            self.center, self.lat_span, self.lon_span
        )
    }
}
