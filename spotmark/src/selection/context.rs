//! Click context derivation.
//!
//! Selection preferences depend on how zoomed-in the user is and how
//! crowded the viewport is. Both signals are derived here, once per click,
//! so every strategy and the coordinator see the same numbers.

use crate::coord::Viewport;

/// Zoom bucket assumed when no viewport is supplied.
pub const DEFAULT_ZOOM_BUCKET: u8 = 12;

/// Pins per square kilometer above which a viewport counts as dense.
pub const DENSE_PINS_PER_KM2: f64 = 1.0;

/// Pin count that must also be exceeded before density prefers the
/// spatial-index strategy.
pub const DENSE_PIN_COUNT: usize = 100;

/// Coarse-grained precision demand derived from the zoom bucket.
///
/// Finer tiers mean the user can distinguish nearby markers on screen, so
/// selection should resolve to exactly what was clicked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PrecisionTier {
    Coarse,
    Standard,
    High,
    Maximum,
}

impl PrecisionTier {
    /// Maps a zoom bucket to its precision tier.
    pub fn for_zoom_bucket(bucket: u8) -> Self {
        if bucket >= 15 {
            PrecisionTier::Maximum
        } else if bucket >= 13 {
            PrecisionTier::High
        } else if bucket >= 10 {
            PrecisionTier::Standard
        } else {
            PrecisionTier::Coarse
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PrecisionTier::Coarse => "coarse",
            PrecisionTier::Standard => "standard",
            PrecisionTier::High => "high",
            PrecisionTier::Maximum => "maximum",
        }
    }
}

/// Buckets the viewport's average angular span into a discrete zoom level.
///
/// Wider spans mean the camera is further out. The bucket scale mirrors
/// common slippy-map zoom levels: continental views land near 8, street
/// level near 16.
pub fn zoom_bucket_for_span(average_span: f64) -> u8 {
    if average_span > 1.0 {
        8
    } else if average_span > 0.5 {
        10
    } else if average_span > 0.1 {
        12
    } else if average_span > 0.05 {
        14
    } else {
        16
    }
}

/// Everything the coordinator needs to pick a strategy for one click.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionContext {
    /// Number of markers currently visible.
    pub visible_count: usize,
    /// Total pin count reported by the embedder, or the visible count when
    /// not reported.
    pub pin_count: usize,
    /// Discrete zoom level derived from the viewport span.
    pub zoom_bucket: u8,
    /// True when pin density exceeds [`DENSE_PINS_PER_KM2`].
    pub dense: bool,
    /// Precision demand derived from the zoom bucket.
    pub precision: PrecisionTier,
}

impl SelectionContext {
    /// Derives the context for one click.
    ///
    /// Without a viewport the zoom bucket falls back to
    /// [`DEFAULT_ZOOM_BUCKET`] and density is false, since neither can be
    /// computed.
    pub fn derive(
        visible_count: usize,
        viewport: Option<&Viewport>,
        pin_count: Option<usize>,
    ) -> Self {
        let pin_count = pin_count.unwrap_or(visible_count);
        let (zoom_bucket, dense) = match viewport {
            Some(viewport) => {
                let bucket = zoom_bucket_for_span(viewport.average_span());
                let area = viewport.area_km2();
                let dense = area > 0.0 && pin_count as f64 / area > DENSE_PINS_PER_KM2;
                (bucket, dense)
            }
            None => (DEFAULT_ZOOM_BUCKET, false),
        };
        SelectionContext {
            visible_count,
            pin_count,
            zoom_bucket,
            dense,
            precision: PrecisionTier::for_zoom_bucket(zoom_bucket),
        }
    }
}
