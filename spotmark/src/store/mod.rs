//! Marker cache and instance pool
//!
//! Owns the content-addressed marker cache, the recycled-instance pool, and
//! their statistics. All higher layers (batch processing, viewport
//! optimization, reconciliation) go through [`MarkerStore`].

mod cache;
mod stats;

pub use cache::{MarkerOrigin, MarkerStore};
pub use stats::StoreStats;
