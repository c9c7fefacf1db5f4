//! Spotmark - Marker lifecycle and spatial selection for map surfaces
//!
//! This library turns a feed of geographic spots into a bounded set of
//! renderable map markers: content-addressed caching with instance
//! pooling, bounded-concurrency batch transformation, viewport culling,
//! id-keyed incremental reconciliation, debounced viewport recomputation,
//! and context-driven click selection.
//!
//! # High-Level API
//!
//! For most use cases, the [`engine`] module provides a simplified facade:
//!
//! ```ignore
//! use std::sync::Arc;
//! use spotmark::config::EngineConfig;
//! use spotmark::engine::MarkerEngine;
//! use spotmark::selection::Platform;
//! use spotmark::spot::StaticSpotSource;
//!
//! let source = Arc::new(StaticSpotSource::new(spots));
//! let engine = MarkerEngine::new(EngineConfig::default(), source, Platform::Desktop, None)?;
//!
//! // Follow the visible set from the rendering surface.
//! let mut visible = engine.subscribe();
//!
//! // Feed viewport changes; recomputation is debounced.
//! engine.request_viewport(viewport)?;
//!
//! // Resolve a click against what is on screen.
//! let selected = engine.select_at(click, Some(&viewport), None).await;
//! ```

pub mod batch;
pub mod config;
pub mod coord;
pub mod debounce;
pub mod engine;
pub mod error;
pub mod logging;
pub mod marker;
pub mod reconcile;
pub mod selection;
pub mod spot;
pub mod store;
pub mod viewport;

/// Version of the spotmark library.
///
/// Defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
