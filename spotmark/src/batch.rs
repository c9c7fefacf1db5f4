//! Bounded-concurrency batch transformation of spots into markers.
//!
//! Spots are partitioned in input order into fixed-size batches. A counting
//! permit caps how many batches run their inner loop at once; within a
//! batch, spots are processed sequentially. Per-batch marker lists are
//! concatenated in completion order, so the output preserves batch
//! contiguity but not input order.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::Semaphore;
use tokio::task::JoinError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use crate::config::EngineConfig;
use crate::marker::Marker;
use crate::spot::Spot;
use crate::store::{MarkerOrigin, MarkerStore};

/// Aggregated result of one batch-processing call.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    /// Markers in completion order of their batches.
    pub markers: Vec<Arc<Marker>>,
    pub valid: usize,
    pub invalid: usize,
    pub cache_hits: usize,
    pub cache_misses: usize,
}

impl BatchOutcome {
    /// Folds another outcome into this one, appending its markers.
    pub fn merge(&mut self, other: BatchOutcome) {
        self.markers.extend(other.markers);
        self.valid += other.valid;
        self.invalid += other.invalid;
        self.cache_hits += other.cache_hits;
        self.cache_misses += other.cache_misses;
    }
}

/// Transforms spot collections through the store under a concurrency cap.
pub struct BatchProcessor {
    store: Arc<MarkerStore>,
    batch_size: usize,
    max_concurrent: usize,
}

impl BatchProcessor {
    pub fn new(store: Arc<MarkerStore>, config: &EngineConfig) -> Self {
        debug!(
            batch_size = config.batch_size,
            max_concurrent = config.max_concurrent_batches,
            "batch processor created"
        );
        Self {
            store,
            batch_size: config.batch_size,
            max_concurrent: config.max_concurrent_batches,
        }
    }

    /// Processes `spots` in bounded-concurrency batches.
    ///
    /// The cancellation token is checked before each batch is dispatched;
    /// batches already running finish normally. A failure of the call as a
    /// whole is logged and degrades to an empty outcome.
    pub async fn process(&self, spots: Vec<Spot>, cancel: CancellationToken) -> BatchOutcome {
        match self.run(spots, cancel).await {
            Ok(outcome) => outcome,
            Err(err) => {
                error!(error = %err, "batch processing failed, returning empty outcome");
                BatchOutcome::default()
            }
        }
    }

    async fn run(
        &self,
        spots: Vec<Spot>,
        cancel: CancellationToken,
    ) -> Result<BatchOutcome, JoinError> {
        let started = Instant::now();
        let total = spots.len();
        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));

        let mut tasks = FuturesUnordered::new();
        let mut dispatched = 0usize;

        for chunk in spots.chunks(self.batch_size) {
            if cancel.is_cancelled() {
                debug!(
                    dispatched,
                    remaining = total.saturating_sub(dispatched * self.batch_size),
                    "batch processing cancelled between batches"
                );
                break;
            }

            let permit = Arc::clone(&semaphore)
                .acquire_owned()
                .await
                .expect("batch semaphore closed");

            let store = Arc::clone(&self.store);
            let batch: Vec<Spot> = chunk.to_vec();
            dispatched += 1;

            tasks.push(tokio::spawn(async move {
                let outcome = transform_batch(&store, &batch);
                drop(permit);
                outcome
            }));
        }

        let mut outcome = BatchOutcome::default();
        while let Some(joined) = tasks.next().await {
            outcome.merge(joined?);
        }

        debug!(
            total,
            batches = dispatched,
            valid = outcome.valid,
            invalid = outcome.invalid,
            cache_hits = outcome.cache_hits,
            cache_misses = outcome.cache_misses,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "batch processing complete"
        );
        Ok(outcome)
    }
}

/// Sequentially transforms one batch, containing per-spot faults.
fn transform_batch(store: &MarkerStore, spots: &[Spot]) -> BatchOutcome {
    let mut outcome = BatchOutcome::default();

    for spot in spots {
        match catch_unwind(AssertUnwindSafe(|| store.acquire(spot))) {
            Ok(Some((marker, origin))) => {
                outcome.valid += 1;
                if origin == MarkerOrigin::Cache {
                    outcome.cache_hits += 1;
                } else {
                    outcome.cache_misses += 1;
                }
                outcome.markers.push(marker);
            }
            Ok(None) => {
                outcome.invalid += 1;
            }
            Err(_) => {
                warn!(spot = %spot, "transform panicked, counting spot as invalid");
                outcome.invalid += 1;
            }
        }
    }

    outcome
}
