//! Bounded LRU frame cache.
//!
//! Two eviction pressures apply at once: entry count and an approximate
//! memory budget. Keys are quantized timestamps plus a render quality, so
//! two times that round to the same millisecond share one entry.

use clipforge_core::{defaults, quantize, SharedFrameBuffer};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::future::Future;
use tracing::{debug, warn};

/// Render quality a frame was produced at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    Preview,
    #[default]
    Standard,
    Export,
}

/// Cache bounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub max_frames: usize,
    pub max_memory_mb: f64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_frames: defaults::MAX_CACHED_FRAMES,
            max_memory_mb: defaults::MAX_CACHE_MEMORY_MB,
        }
    }
}

/// Snapshot of cache occupancy and effectiveness.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub max_entries: usize,
    pub memory_mb: f64,
    pub max_memory_mb: f64,
    pub hits: u64,
    pub misses: u64,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct CacheKey {
    bucket: i64,
    quality: Quality,
}

impl CacheKey {
    fn new(timestamp: f64, quality: Quality) -> Self {
        Self {
            bucket: quantize(timestamp),
            quality,
        }
    }
}

struct Entry {
    frame: SharedFrameBuffer,
    size_mb: f64,
    /// Last access tick; key into `order`.
    tick: u64,
}

/// LRU frame cache owned by one editing session.
pub struct FrameCache {
    config: CacheConfig,
    entries: HashMap<CacheKey, Entry>,
    /// Access tick -> key, oldest first.
    order: BTreeMap<u64, CacheKey>,
    next_tick: u64,
    used_mb: f64,
    hits: u64,
    misses: u64,
}

impl FrameCache {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            config,
            entries: HashMap::new(),
            order: BTreeMap::new(),
            next_tick: 0,
            used_mb: 0.0,
            hits: 0,
            misses: 0,
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Look up a frame and mark it most recently used.
    pub fn get(&mut self, timestamp: f64, quality: Quality) -> Option<SharedFrameBuffer> {
        if !timestamp.is_finite() {
            self.misses += 1;
            return None;
        }
        let key = CacheKey::new(timestamp, quality);
        let tick = self.bump_tick();
        match self.entries.get_mut(&key) {
            Some(entry) => {
                self.order.remove(&entry.tick);
                entry.tick = tick;
                self.order.insert(tick, key);
                self.hits += 1;
                Some(entry.frame.clone())
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    /// Presence check; does not affect recency or statistics.
    pub fn has(&self, timestamp: f64, quality: Quality) -> bool {
        timestamp.is_finite() && self.entries.contains_key(&CacheKey::new(timestamp, quality))
    }

    /// Insert a frame, evicting least recently used entries until it fits.
    ///
    /// A frame larger than the whole memory budget, or stamped with a
    /// non-finite time, is not cached.
    pub fn set(&mut self, timestamp: f64, frame: SharedFrameBuffer, quality: Quality) {
        if !timestamp.is_finite() {
            debug!(timestamp, "non-finite timestamp, not cached");
            return;
        }
        let key = CacheKey::new(timestamp, quality);
        self.remove(key);

        let size_mb = frame.size_mb();
        if self.config.max_frames == 0 || size_mb > self.config.max_memory_mb {
            debug!(
                timestamp,
                size_mb,
                budget_mb = self.config.max_memory_mb,
                "frame exceeds cache budget, not cached"
            );
            return;
        }

        while (self.entries.len() >= self.config.max_frames
            || self.used_mb + size_mb > self.config.max_memory_mb)
            && self.evict_oldest()
        {}

        let tick = self.bump_tick();
        self.order.insert(tick, key);
        self.entries.insert(
            key,
            Entry {
                frame,
                size_mb,
                tick,
            },
        );
        self.used_mb += size_mb;
    }

    /// Drop every entry. Statistics counters are kept.
    pub fn clear(&mut self) {
        if !self.entries.is_empty() {
            debug!(entries = self.entries.len(), "frame cache cleared");
        }
        self.entries.clear();
        self.order.clear();
        self.used_mb = 0.0;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Approximate memory held by cached frames.
    pub fn memory_mb(&self) -> f64 {
        self.used_mb
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.len(),
            max_entries: self.config.max_frames,
            memory_mb: self.used_mb,
            max_memory_mb: self.config.max_memory_mb,
            hits: self.hits,
            misses: self.misses,
        }
    }

    /// Render and cache every `step` from `start` to `end` inclusive that is
    /// not already cached. At most `max_frames` points are considered, since
    /// more could not stay cached. Renders run concurrently; returns how many
    /// frames were rendered.
    pub async fn preload<F, Fut>(
        &mut self,
        start: f64,
        end: f64,
        step: f64,
        quality: Quality,
        render_fn: F,
    ) -> usize
    where
        F: Fn(f64) -> Fut,
        Fut: Future<Output = SharedFrameBuffer>,
    {
        if !(step.is_finite() && step > 0.0) || !start.is_finite() || !end.is_finite() {
            warn!(start, end, step, "invalid preload range");
            return 0;
        }

        let count = ((end - start) / step + 1e-9).floor();
        if count < 0.0 {
            return 0;
        }

        let requested = (count as u64).saturating_add(1);
        let points = requested.min(self.config.max_frames as u64);
        if points < requested {
            debug!(requested, points, "preload truncated to cache capacity");
        }

        let mut scheduled = HashSet::new();
        let times: Vec<f64> = (0..points)
            .map(|i| start + i as f64 * step)
            .filter(|&t| !self.has(t, quality) && scheduled.insert(quantize(t)))
            .collect();

        let frames = join_all(times.iter().map(|&t| render_fn(t))).await;
        let rendered = frames.len();
        for (t, frame) in times.into_iter().zip(frames) {
            self.set(t, frame, quality);
        }
        debug!(start, end, step, rendered, "preload finished");
        rendered
    }

    fn remove(&mut self, key: CacheKey) {
        if let Some(entry) = self.entries.remove(&key) {
            self.order.remove(&entry.tick);
            self.release(entry.size_mb);
        }
    }

    fn evict_oldest(&mut self) -> bool {
        let Some((_, key)) = self.order.pop_first() else {
            return false;
        };
        if let Some(entry) = self.entries.remove(&key) {
            self.release(entry.size_mb);
        }
        true
    }

    fn release(&mut self, size_mb: f64) {
        self.used_mb -= size_mb;
        if self.entries.is_empty() || self.used_mb < 0.0 {
            self.used_mb = 0.0;
        }
    }

    fn bump_tick(&mut self) -> u64 {
        self.next_tick += 1;
        self.next_tick
    }
}

impl Default for FrameCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}
