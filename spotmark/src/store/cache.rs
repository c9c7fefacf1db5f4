//! Content-addressed marker cache with an instance pool.
//!
//! The cache maps [`MarkerKey`]s to live markers so repeated transforms of
//! an unchanged spot are free. The pool is a free-list of evicted instances
//! that get rewritten in place for new spots, trading a lock push/pop for an
//! allocation.
//!
//! Both structures are shared across batch workers, the viewport optimizer,
//! and the reconciler. Reads and writes interleave without snapshot
//! isolation; callers must not assume a stable iteration order, and cache
//! occupancy may transiently overshoot the maximum between cleanup passes.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;
use tracing::{debug, info};

use crate::config::EngineConfig;
use crate::marker::{Marker, MarkerKey};
use crate::spot::Spot;
use crate::store::StoreStats;

/// Where an acquired marker came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerOrigin {
    /// Cache hit; content untouched.
    Cache,
    /// Cache miss; a pooled instance was rewritten.
    Pool,
    /// Cache miss with an empty pool; newly allocated.
    Fresh,
}

impl MarkerOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            MarkerOrigin::Cache => "cache",
            MarkerOrigin::Pool => "pool",
            MarkerOrigin::Fresh => "fresh",
        }
    }
}

struct CacheSlot {
    marker: Arc<Marker>,
    /// Logical touch stamp; larger is more recent.
    touched: AtomicU64,
}

/// Thread-safe marker cache and pool with bounded occupancy.
pub struct MarkerStore {
    entries: DashMap<MarkerKey, CacheSlot>,
    pool: Mutex<Vec<Arc<Marker>>>,
    /// Monotone logical clock driving eviction recency.
    clock: AtomicU64,
    /// Serializes cleanup passes; contenders skip rather than queue.
    cleanup_gate: Mutex<()>,

    max_cached: usize,
    max_pooled: usize,
    cleanup_threshold: usize,
    caching_enabled: bool,
    pooling_enabled: bool,

    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
    cleanup_passes: AtomicU64,
    created: AtomicU64,
    reused: AtomicU64,
}

impl MarkerStore {
    pub fn new(config: &EngineConfig) -> Self {
        info!(
            max_cached = config.max_cached_markers,
            max_pooled = config.max_pooled_markers,
            cleanup_threshold = config.cleanup_threshold(),
            caching = config.caching_enabled,
            pooling = config.pooling_enabled,
            "marker store created"
        );

        Self {
            entries: DashMap::new(),
            pool: Mutex::new(Vec::new()),
            clock: AtomicU64::new(0),
            cleanup_gate: Mutex::new(()),
            max_cached: config.max_cached_markers,
            max_pooled: config.max_pooled_markers,
            cleanup_threshold: config.cleanup_threshold(),
            caching_enabled: config.caching_enabled,
            pooling_enabled: config.pooling_enabled,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
            cleanup_passes: AtomicU64::new(0),
            created: AtomicU64::new(0),
            reused: AtomicU64::new(0),
        }
    }

    /// Returns the marker for `spot`, creating or recycling one on a miss.
    ///
    /// Returns `None` when the spot's coordinate fails validation; the
    /// caller decides whether that needs counting.
    pub fn get_or_create(&self, spot: &Spot) -> Option<Arc<Marker>> {
        self.acquire(spot).map(|(marker, _)| marker)
    }

    /// [`get_or_create`](Self::get_or_create) plus the origin of the
    /// returned instance, for callers that track hit/miss counts.
    pub fn acquire(&self, spot: &Spot) -> Option<(Arc<Marker>, MarkerOrigin)> {
        if !spot.coordinate.is_valid() {
            return None;
        }

        let key = MarkerKey::for_spot(spot);

        if self.caching_enabled {
            if let Some(slot) = self.entries.get(&key) {
                slot.touched.store(self.tick(), Ordering::Relaxed);
                self.hits.fetch_add(1, Ordering::Relaxed);
                return Some((Arc::clone(&slot.marker), MarkerOrigin::Cache));
            }
        }

        self.misses.fetch_add(1, Ordering::Relaxed);

        let snapshot = Arc::new(spot.clone());
        let (marker, origin) = match self.take_pooled() {
            Some(recycled) => {
                recycled.rewrite(snapshot);
                self.reused.fetch_add(1, Ordering::Relaxed);
                (recycled, MarkerOrigin::Pool)
            }
            None => {
                self.created.fetch_add(1, Ordering::Relaxed);
                (Arc::new(Marker::new(snapshot)), MarkerOrigin::Fresh)
            }
        };

        if self.caching_enabled {
            self.entries.insert(
                key,
                CacheSlot {
                    marker: Arc::clone(&marker),
                    touched: AtomicU64::new(self.tick()),
                },
            );
            if self.entries.len() > self.cleanup_threshold {
                self.run_cleanup();
            }
        }

        Some((marker, origin))
    }

    /// Rewrites a live marker in place from a new snapshot of its spot,
    /// moving its cache entry to the new content key.
    ///
    /// Returns false (leaving the marker untouched) when the new coordinate
    /// fails validation.
    pub fn rewrite_marker(&self, marker: &Arc<Marker>, spot: &Spot) -> bool {
        if !spot.coordinate.is_valid() {
            return false;
        }

        let old_key = marker.key();
        marker.rewrite(Arc::new(spot.clone()));

        if self.caching_enabled {
            let stamp = self.tick();
            if self.entries.remove(&old_key).is_some() {
                self.entries.insert(
                    marker.key(),
                    CacheSlot {
                        marker: Arc::clone(marker),
                        touched: AtomicU64::new(stamp),
                    },
                );
            }
        }
        true
    }

    /// Removes the marker from the cache and offers the instance to the
    /// pool, dropping it when the pool is full or pooling is disabled.
    ///
    /// Ownership transfer to the pool happens only here. Callers must evict
    /// a marker only while removing it from the visible set they own;
    /// pooled instances are rewritten on reuse.
    pub fn evict(&self, marker: &Arc<Marker>) {
        self.entries.remove(&marker.key());
        self.evictions.fetch_add(1, Ordering::Relaxed);
        self.offer_to_pool(Arc::clone(marker));
    }

    /// Trims the cache back to its maximum, oldest touch stamps first.
    ///
    /// Runs automatically when occupancy passes the cleanup threshold; also
    /// callable directly as explicit maintenance. Returns the number of
    /// entries removed. Trimmed entries leave the cache only; their
    /// instances stay alive for whoever holds them in a visible set.
    pub fn run_cleanup(&self) -> usize {
        // Another pass already trimming is good enough.
        let Some(_guard) = self.cleanup_gate.try_lock() else {
            return 0;
        };

        let len = self.entries.len();
        if len <= self.max_cached {
            return 0;
        }
        let excess = len - self.max_cached;

        let mut candidates: Vec<(MarkerKey, u64)> = self
            .entries
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().touched.load(Ordering::Relaxed)))
            .collect();
        candidates.sort_by_key(|(_, touched)| *touched);

        let mut removed = 0;
        for (key, _) in candidates {
            if removed >= excess {
                break;
            }
            if self.entries.remove(&key).is_some() {
                removed += 1;
            }
        }

        self.evictions.fetch_add(removed as u64, Ordering::Relaxed);
        self.cleanup_passes.fetch_add(1, Ordering::Relaxed);
        debug!(
            removed,
            remaining = self.entries.len(),
            max = self.max_cached,
            "cache cleanup pass"
        );
        removed
    }

    pub fn contains_key(&self, key: &MarkerKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn cached_len(&self) -> usize {
        self.entries.len()
    }

    pub fn pooled_len(&self) -> usize {
        self.pool.lock().len()
    }

    /// Empties the cache and the pool and resets all statistics.
    pub fn clear(&self) {
        self.entries.clear();
        self.pool.lock().clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        self.evictions.store(0, Ordering::Relaxed);
        self.cleanup_passes.store(0, Ordering::Relaxed);
        self.created.store(0, Ordering::Relaxed);
        self.reused.store(0, Ordering::Relaxed);
        debug!("marker store cleared");
    }

    pub fn stats(&self) -> StoreStats {
        StoreStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            cleanup_passes: self.cleanup_passes.load(Ordering::Relaxed),
            created: self.created.load(Ordering::Relaxed),
            reused_from_pool: self.reused.load(Ordering::Relaxed),
            cached: self.cached_len(),
            pooled: self.pooled_len(),
        }
    }

    fn tick(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::Relaxed)
    }

    fn take_pooled(&self) -> Option<Arc<Marker>> {
        self.pool.lock().pop()
    }

    fn offer_to_pool(&self, marker: Arc<Marker>) {
        if !self.pooling_enabled {
            return;
        }
        let mut pool = self.pool.lock();
        if pool.len() < self.max_pooled {
            pool.push(marker);
        }
    }
}
