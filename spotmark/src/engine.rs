//! Engine facade.
//!
//! `MarkerEngine` wires the store, batch processor, viewport optimizer,
//! reconciler, debouncer, and selection coordinator into one embeddable
//! unit. It owns the visible marker set and publishes every change on a
//! watch channel, so a rendering surface can follow along by holding a
//! receiver.
//!
//! Fault policy at the public boundary: a panic inside a visible-set pass
//! is caught and logged, and the caller gets the last good visible set
//! back. A panic inside selection resolves the click to `None`. Neither
//! poisons engine state.

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use futures::FutureExt;
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::batch::{BatchOutcome, BatchProcessor};
use crate::config::EngineConfig;
use crate::coord::{Coordinate, Viewport};
use crate::debounce::Debouncer;
use crate::error::EngineError;
use crate::marker::Marker;
use crate::reconcile::Reconciler;
use crate::selection::{HitTestSurface, Platform, SelectionCoordinator, StrategyStats};
use crate::spot::{Spot, SpotSource};
use crate::store::{MarkerStore, StoreStats};
use crate::viewport::ViewportOptimizer;

/// The assembled marker engine.
///
/// All methods take `&self`; the engine is usually held in an `Arc` and
/// shared between the embedder's UI thread and async tasks.
pub struct MarkerEngine {
    store: Arc<MarkerStore>,
    source: Arc<dyn SpotSource>,
    batch: BatchProcessor,
    optimizer: Arc<ViewportOptimizer>,
    reconciler: Reconciler,
    coordinator: SelectionCoordinator,
    /// Current visible set lives in the watch channel; `borrow` reads it,
    /// `send_replace` publishes the next one.
    visible_tx: Arc<watch::Sender<Vec<Arc<Marker>>>>,
    /// Serializes visible-set writers. Readers go straight to the channel.
    visible_lock: Arc<Mutex<()>>,
    /// Taken on shutdown so the worker can be awaited.
    debouncer: Mutex<Option<Debouncer<Viewport>>>,
    cancel: CancellationToken,
}

impl MarkerEngine {
    /// Builds an engine from a validated configuration.
    ///
    /// `source` supplies spot snapshots for viewport and reconcile passes.
    /// `hit_test` is the optional platform hit-testing bridge; passing
    /// `None` simply leaves the native strategy inapplicable.
    pub fn new(
        config: EngineConfig,
        source: Arc<dyn SpotSource>,
        platform: Platform,
        hit_test: Option<Arc<dyn HitTestSurface>>,
    ) -> Result<Self, EngineError> {
        config.validate()?;

        let store = Arc::new(MarkerStore::new(&config));
        let batch = BatchProcessor::new(Arc::clone(&store), &config);
        let optimizer = Arc::new(ViewportOptimizer::new(Arc::clone(&store), &config));
        let reconciler = Reconciler::new(Arc::clone(&store));
        let coordinator = SelectionCoordinator::new(platform, &config, hit_test);

        let (visible_tx, _) = watch::channel(Vec::new());
        let visible_tx = Arc::new(visible_tx);
        let visible_lock = Arc::new(Mutex::new(()));

        let worker_source = Arc::clone(&source);
        let worker_optimizer = Arc::clone(&optimizer);
        let worker_tx = Arc::clone(&visible_tx);
        let worker_lock = Arc::clone(&visible_lock);
        let debouncer = Debouncer::new(config.debounce_delay, move |viewport: Viewport| {
            let spots = worker_source.all_spots();
            run_optimize_pass(&worker_optimizer, &worker_tx, &worker_lock, &viewport, &spots);
        });

        info!(
            platform = platform.as_str(),
            debounce_ms = config.debounce_delay.as_millis() as u64,
            "marker engine initialized"
        );

        Ok(MarkerEngine {
            store,
            source,
            batch,
            optimizer,
            reconciler,
            coordinator,
            visible_tx,
            visible_lock,
            debouncer: Mutex::new(Some(debouncer)),
            cancel: CancellationToken::new(),
        })
    }

    /// Transforms a list of spots into markers through the batch path.
    ///
    /// Warms the cache; it does not touch the visible set. After
    /// [`shutdown`](Self::shutdown) the call degrades to an empty outcome.
    pub async fn process_spots(&self, spots: Vec<Spot>) -> BatchOutcome {
        self.batch.process(spots, self.cancel.clone()).await
    }

    /// Runs one viewport optimization pass immediately and publishes the
    /// resulting visible set.
    pub fn optimize_viewport(&self, viewport: &Viewport) -> Vec<Arc<Marker>> {
        let spots = self.source.all_spots();
        run_optimize_pass(
            &self.optimizer,
            &self.visible_tx,
            &self.visible_lock,
            viewport,
            &spots,
        )
    }

    /// Registers a viewport change for debounced recomputation.
    ///
    /// Rapid successive calls coalesce; only the latest viewport is
    /// recomputed once the configured delay elapses without another call.
    pub fn request_viewport(&self, viewport: Viewport) -> Result<(), EngineError> {
        let accepted = match &*self.debouncer.lock() {
            Some(debouncer) => debouncer.request(viewport),
            None => false,
        };
        if accepted {
            Ok(())
        } else {
            Err(EngineError::ShutDown)
        }
    }

    /// Reconciles the visible set against the source's current spot list
    /// and publishes the result.
    pub fn reconcile_with_source(&self) -> Vec<Arc<Marker>> {
        let spots = self.source.all_spots();
        let _guard = self.visible_lock.lock();
        let current = self.visible_tx.borrow().clone();
        match catch_unwind(AssertUnwindSafe(|| {
            self.reconciler.reconcile(current, &spots)
        })) {
            Ok(next) => {
                self.visible_tx.send_replace(next.clone());
                next
            }
            Err(_) => {
                error!("reconcile pass panicked, keeping previous visible set");
                self.visible_tx.borrow().clone()
            }
        }
    }

    /// Resolves a click against the current visible set.
    pub async fn select_at(
        &self,
        click: Coordinate,
        viewport: Option<&Viewport>,
        pin_count: Option<usize>,
    ) -> Option<Arc<Spot>> {
        let markers = self.visible_tx.borrow().clone();
        let attempt = self
            .coordinator
            .select(click, &markers, viewport, pin_count);
        match AssertUnwindSafe(attempt).catch_unwind().await {
            Ok(selected) => selected,
            Err(_) => {
                error!("selection panicked, treating click as a miss");
                None
            }
        }
    }

    /// Snapshot of the current visible set.
    pub fn visible(&self) -> Vec<Arc<Marker>> {
        self.visible_tx.borrow().clone()
    }

    /// Receiver that observes every published visible set.
    pub fn subscribe(&self) -> watch::Receiver<Vec<Arc<Marker>>> {
        self.visible_tx.subscribe()
    }

    /// Empties the cache and pool and resets store statistics. The visible
    /// set is left untouched; markers already on screen stay valid.
    pub fn clear_caches(&self) {
        self.store.clear();
    }

    /// Store statistics snapshot.
    pub fn store_stats(&self) -> StoreStats {
        self.store.stats()
    }

    /// Per-strategy selection statistics snapshot.
    pub fn selection_metrics(&self) -> HashMap<&'static str, StrategyStats> {
        self.coordinator.metrics().snapshot()
    }

    /// Stops the debounce worker and cancels pending batch dispatch.
    ///
    /// Queued viewport recomputations are abandoned. Subsequent
    /// `request_viewport` calls return [`EngineError::ShutDown`] and batch
    /// processing degrades to empty outcomes.
    pub async fn shutdown(&self) {
        self.cancel.cancel();
        let debouncer = self.debouncer.lock().take();
        if let Some(debouncer) = debouncer {
            debouncer.shutdown().await;
        }
        info!("marker engine shut down");
    }
}

/// One guarded optimize pass: read the current visible set, optimize,
/// publish. On panic the previous set stays published and is returned.
fn run_optimize_pass(
    optimizer: &ViewportOptimizer,
    visible_tx: &watch::Sender<Vec<Arc<Marker>>>,
    visible_lock: &Mutex<()>,
    viewport: &Viewport,
    spots: &[Spot],
) -> Vec<Arc<Marker>> {
    let _guard = visible_lock.lock();
    let current = visible_tx.borrow().clone();
    match catch_unwind(AssertUnwindSafe(|| {
        optimizer.optimize(current, viewport, spots)
    })) {
        Ok(next) => {
            visible_tx.send_replace(next.clone());
            next
        }
        Err(_) => {
            error!("viewport optimization panicked, keeping previous visible set");
            visible_tx.borrow().clone()
        }
    }
}
