//! Native hit-test selection.
//!
//! Mobile map controls already know which annotation view a touch landed
//! on, and their answer accounts for screen-space concerns (pin artwork,
//! touch slop) that coordinate math cannot see. When the embedder provides
//! a [`HitTestSurface`], this strategy delegates the click to it instead of
//! measuring distances.

use std::sync::Arc;

use crate::coord::{Coordinate, Viewport};
use crate::marker::Marker;
use crate::selection::strategy::{BoxFuture, SelectionStrategy, NATIVE_STRATEGY};
use crate::selection::{Platform, SelectionContext};
use crate::spot::Spot;

/// Bridge to a platform map control's own hit-testing.
///
/// Implementations resolve a click to the spot whose annotation was hit,
/// or `None` when the touch landed on empty map.
pub trait HitTestSurface: Send + Sync {
    fn resolve<'a>(
        &'a self,
        click: Coordinate,
        viewport: Option<&'a Viewport>,
    ) -> BoxFuture<'a, Option<Arc<Spot>>>;
}

/// Surface that always resolves to the same answer. Useful as a stand-in
/// where no real map control is wired up.
pub struct StaticHitTest {
    answer: Option<Arc<Spot>>,
}

impl StaticHitTest {
    pub fn hit(spot: Arc<Spot>) -> Self {
        StaticHitTest { answer: Some(spot) }
    }

    pub fn miss() -> Self {
        StaticHitTest { answer: None }
    }
}

impl HitTestSurface for StaticHitTest {
    fn resolve<'a>(
        &'a self,
        _click: Coordinate,
        _viewport: Option<&'a Viewport>,
    ) -> BoxFuture<'a, Option<Arc<Spot>>> {
        let answer = self.answer.clone();
        Box::pin(async move { answer })
    }
}

/// Delegates selection to the platform's own hit-testing.
pub struct NativeHitTestSelection {
    surface: Option<Arc<dyn HitTestSurface>>,
}

impl NativeHitTestSelection {
    pub fn new(surface: Option<Arc<dyn HitTestSurface>>) -> Self {
        NativeHitTestSelection { surface }
    }
}

impl SelectionStrategy for NativeHitTestSelection {
    fn name(&self) -> &'static str {
        NATIVE_STRATEGY
    }

    /// Only mobile platforms expose native hit-testing, and only when the
    /// embedder actually wired a surface in.
    fn is_applicable(&self, platform: Platform, _context: &SelectionContext) -> bool {
        platform.supports_native_hit_testing() && self.surface.is_some()
    }

    fn select<'a>(
        &'a self,
        click: Coordinate,
        _markers: &'a [Arc<Marker>],
        viewport: Option<&'a Viewport>,
    ) -> BoxFuture<'a, Option<Arc<Spot>>> {
        match &self.surface {
            Some(surface) => surface.resolve(click, viewport),
            None => Box::pin(async { None }),
        }
    }
}
