//! Admission and Eviction Engine
//!
//! [`ImageCacheSegment`] holds the whole cache state: the recency list, the
//! key map pointing into it and the memory accountant. Every method takes
//! `&mut self`; [`ImageCache`](crate::ImageCache) provides the locking.
//!
//! # Algorithm
//!
//! On a miss the caller probes the image size and asks [`reserve`] for room:
//!
//! 1. **Fast admission**: the image fits the soft budget as is.
//! 2. **Single victim**: the least recently used reclaimable entry that alone
//!    frees enough space is evicted.
//! 3. **Incremental reclamation**: reclaimable entries are evicted from the
//!    LRU end until the image fits the soft budget or none is left.
//! 4. **Hard budget**: the image is admitted if it fits under `max_size`,
//!    otherwise the request fails. Evictions made in step 3 are kept.
//!
//! An entry is reclaimable when the cache holds the only handle to its
//! buffer. Entries held by a consumer are skipped and keep their position.
//!
//! [`reserve`]: ImageCacheSegment::reserve

use tracing::{debug, warn};

use crate::error::CacheError;
use crate::key::CacheKey;
use crate::list::{Entry, List};
use crate::memory::MemoryUsage;
use crate::metrics::ImageCacheMetrics;
use crate::value::CacheValue;

#[cfg(feature = "hashbrown")]
use hashbrown::HashMap;

#[cfg(not(feature = "hashbrown"))]
use std::collections::HashMap;

/// How [`ImageCacheSegment::reserve`] made room for a new image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Admission {
    Fast,
    SingleVictim,
    HardBudget,
}

/// Internal image cache state containing the admission algorithm.
///
/// # Safety
///
/// This struct contains raw pointers in the `map` field.
/// These pointers are always valid as long as:
/// - The pointer was obtained from a `list` entry's `add()` call
/// - The node has not been removed from the list
/// - The segment has not been dropped
pub(crate) struct ImageCacheSegment {
    list: List<(CacheKey, CacheValue)>,
    map: HashMap<CacheKey, *mut Entry<(CacheKey, CacheValue)>>,
    memory: MemoryUsage,
    metrics: ImageCacheMetrics,
}

// SAFETY: ImageCacheSegment owns all data and raw pointers point only to nodes owned by `list`.
// Concurrent access is safe when wrapped in proper synchronization primitives.
unsafe impl Send for ImageCacheSegment {}

// SAFETY: All mutation requires &mut self; shared references cannot cause data races.
unsafe impl Sync for ImageCacheSegment {}

impl ImageCacheSegment {
    pub(crate) fn new(memory: MemoryUsage) -> Self {
        ImageCacheSegment {
            list: List::new(),
            map: HashMap::new(),
            memory,
            metrics: ImageCacheMetrics::new(memory),
        }
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.map.len()
    }

    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    #[inline]
    pub(crate) fn memory_usage(&self) -> MemoryUsage {
        self.memory
    }

    /// Snapshot of the counters together with the current accountant state.
    pub(crate) fn metrics(&self) -> ImageCacheMetrics {
        let mut metrics = self.metrics.clone();
        metrics.memory = self.memory;
        metrics
    }

    /// Entries from least to most recently used.
    pub(crate) fn iter(&self) -> impl Iterator<Item = (&CacheKey, &CacheValue)> {
        self.list.iter().map(|(key, value)| (key, value))
    }

    pub(crate) fn contains(&self, key: &CacheKey) -> bool {
        self.map.contains_key(key)
    }

    /// Looks `key` up and marks it most recently used.
    pub(crate) fn get(&mut self, key: &CacheKey) -> Option<&CacheValue> {
        let node = self.map.get(key).copied()?;
        unsafe {
            // SAFETY: node comes from our map
            self.list.move_to_front(node);
            let (_, value) = (*node).get_value();
            self.metrics.core.record_hit(value.memory_size());
            Some(value)
        }
    }

    #[inline]
    pub(crate) fn record_miss(&mut self, object_size: u64) {
        self.metrics.core.record_miss(object_size);
    }

    #[inline]
    pub(crate) fn record_load_failure(&mut self) {
        self.metrics.load_failures += 1;
    }

    /// Makes room for an image of `size` bytes to be stored under `key`.
    ///
    /// On success the caller may insert up to `size` bytes without exceeding
    /// `max_size`. On failure the evictions already performed are kept.
    pub(crate) fn reserve(&mut self, key: &CacheKey, size: u64) -> Result<Admission, CacheError> {
        if self.memory.fits_capacity(size) {
            self.metrics.fast_admissions += 1;
            return Ok(Admission::Fast);
        }

        let missing = self.memory.missing_capacity(size);
        if let Some(victim) = self.find_single_victim(missing) {
            self.evict(&victim);
            self.metrics.single_victim_admissions += 1;
            return Ok(Admission::SingleVictim);
        }

        while self.memory.missing_capacity(size) > 0 {
            let Some(victim) = self.find_reclaimable() else {
                break;
            };
            self.evict(&victim);
        }

        if self.memory.fits_max_size(size) {
            self.metrics.overflow_admissions += 1;
            return Ok(Admission::HardBudget);
        }

        self.metrics.rejections += 1;
        warn!(
            key = %key,
            requested = size,
            content_size = self.memory.content_size,
            max_size = self.memory.max_size,
            "image does not fit the cache"
        );
        Err(CacheError::OutOfCapacity {
            path: key.path().to_path_buf(),
            requested: size,
            content_size: self.memory.content_size,
            max_size: self.memory.max_size,
        })
    }

    /// Inserts `value` as the most recently used entry and accounts for it.
    pub(crate) fn insert(&mut self, key: CacheKey, value: CacheValue) {
        self.unlink(&key);

        let size = value.memory_size();
        let node = self.list.add((key.clone(), value));
        self.map.insert(key, node);
        debug_assert_eq!(self.map.len(), self.list.len());
        self.memory.record_insertion(size);
        self.metrics.core.record_insertion(size);
    }

    /// Evicts every reclaimable entry and returns how many were removed.
    pub(crate) fn purge_unused(&mut self) -> usize {
        let victims: Vec<CacheKey> = self
            .list
            .iter()
            .filter(|(_, value)| value.is_reclaimable())
            .map(|(key, _)| key.clone())
            .collect();
        for victim in &victims {
            self.evict(victim);
        }
        victims.len()
    }

    pub(crate) fn clear(&mut self) {
        self.map.clear();
        self.list.clear();
        self.memory.reset();
    }

    /// Least recently used reclaimable entry holding at least `missing` bytes.
    fn find_single_victim(&self, missing: u64) -> Option<CacheKey> {
        self.list
            .iter()
            .find(|(_, value)| value.is_reclaimable() && value.memory_size() >= missing)
            .map(|(key, _)| key.clone())
    }

    fn find_reclaimable(&self) -> Option<CacheKey> {
        self.list
            .iter()
            .find(|(_, value)| value.is_reclaimable())
            .map(|(key, _)| key.clone())
    }

    fn evict(&mut self, key: &CacheKey) {
        if let Some(value) = self.unlink(key) {
            let size = value.memory_size();
            self.metrics.core.record_eviction(size);
            debug!(key = %key, size, "evicted image");
        }
    }

    /// Removes `key` from map, list and accountant, returning the cache's share.
    fn unlink(&mut self, key: &CacheKey) -> Option<CacheValue> {
        let node = self.map.remove(key)?;
        // SAFETY: node comes from our map and was linked into our list
        let (_, value) = unsafe { self.list.remove(node) }?;
        self.memory.record_eviction(value.memory_size());
        Some(value)
    }
}

impl core::fmt::Debug for ImageCacheSegment {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ImageCacheSegment")
            .field("len", &self.map.len())
            .field("memory", &self.memory)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pixel::Image;
    use image::Luma;
    use std::sync::Arc;

    fn key(name: &str) -> CacheKey {
        CacheKey::for_pixel::<Luma<u8>>(name, 0)
    }

    // A Luma<u8> buffer of `size` bytes.
    fn value(size: u32) -> CacheValue {
        CacheValue::wrap(Arc::new(Image::<Luma<u8>>::new(size, 1)))
    }

    fn admit(segment: &mut ImageCacheSegment, name: &str, size: u32) -> Admission {
        let key = key(name);
        let admission = segment.reserve(&key, u64::from(size)).unwrap();
        segment.insert(key, value(size));
        admission
    }

    fn names(segment: &ImageCacheSegment) -> Vec<String> {
        segment
            .iter()
            .map(|(key, _)| key.path().display().to_string())
            .collect()
    }

    fn hold(segment: &mut ImageCacheSegment, name: &str) -> Arc<Image<Luma<u8>>> {
        segment.get(&key(name)).unwrap().get::<Luma<u8>>().unwrap()
    }

    fn assert_accounting(segment: &ImageCacheSegment) {
        let total: u64 = segment.iter().map(|(_, value)| value.memory_size()).sum();
        let usage = segment.memory_usage();
        assert_eq!(usage.content_size, total);
        assert_eq!(usage.image_count, segment.len());
        assert!(usage.content_size <= usage.max_size);
    }

    #[test]
    fn test_fast_admission_accounts_entry() {
        let mut segment = ImageCacheSegment::new(MemoryUsage::new(100, 200));
        assert_eq!(admit(&mut segment, "a", 40), Admission::Fast);
        assert_eq!(admit(&mut segment, "b", 60), Admission::Fast);

        assert_eq!(segment.len(), 2);
        assert_eq!(segment.memory_usage().content_size, 100);
        assert_eq!(segment.metrics().fast_admissions, 2);
        assert_accounting(&segment);
    }

    #[test]
    fn test_hit_promotes_to_mru() {
        let mut segment = ImageCacheSegment::new(MemoryUsage::new(100, 200));
        admit(&mut segment, "a", 10);
        admit(&mut segment, "b", 10);
        admit(&mut segment, "c", 10);
        assert_eq!(names(&segment), ["a", "b", "c"]);

        assert!(segment.get(&key("a")).is_some());
        assert_eq!(names(&segment), ["b", "c", "a"]);
        assert!(segment.get(&key("missing")).is_none());
        assert_eq!(segment.metrics().core.cache_hits, 1);
    }

    #[test]
    fn test_contains_does_not_promote() {
        let mut segment = ImageCacheSegment::new(MemoryUsage::new(100, 200));
        admit(&mut segment, "a", 10);
        admit(&mut segment, "b", 10);

        assert!(segment.contains(&key("a")));
        assert!(!segment.contains(&key("z")));
        assert_eq!(names(&segment), ["a", "b"]);
    }

    #[test]
    fn test_single_victim_preferred_over_small_entries() {
        let mut segment = ImageCacheSegment::new(MemoryUsage::new(100, 200));
        admit(&mut segment, "small1", 20);
        admit(&mut segment, "small2", 20);
        admit(&mut segment, "large", 50);

        // missing = 90 + 40 - 100 = 30: only "large" frees enough alone
        assert_eq!(admit(&mut segment, "new", 40), Admission::SingleVictim);
        assert_eq!(names(&segment), ["small1", "small2", "new"]);
        assert_eq!(segment.metrics().core.evictions, 1);
        assert_accounting(&segment);
    }

    #[test]
    fn test_single_victim_picks_least_recent_candidate() {
        let mut segment = ImageCacheSegment::new(MemoryUsage::new(100, 200));
        admit(&mut segment, "first", 45);
        admit(&mut segment, "second", 45);
        segment.get(&key("first"));

        assert_eq!(admit(&mut segment, "new", 40), Admission::SingleVictim);
        assert_eq!(names(&segment), ["first", "new"]);
    }

    #[test]
    fn test_incremental_reclamation_stops_once_it_fits() {
        let mut segment = ImageCacheSegment::new(MemoryUsage::new(100, 200));
        admit(&mut segment, "a", 30);
        admit(&mut segment, "b", 30);
        admit(&mut segment, "c", 30);

        // missing = 35: no single entry suffices, evicting a then b does
        assert_eq!(admit(&mut segment, "d", 45), Admission::HardBudget);
        assert_eq!(names(&segment), ["c", "d"]);
        assert_eq!(segment.memory_usage().content_size, 75);
        assert_eq!(segment.metrics().core.evictions, 2);
        assert_accounting(&segment);
    }

    #[test]
    fn test_held_entries_are_never_evicted() {
        let mut segment = ImageCacheSegment::new(MemoryUsage::new(100, 200));
        admit(&mut segment, "a", 30);
        admit(&mut segment, "b", 30);
        admit(&mut segment, "c", 30);
        let held = hold(&mut segment, "a");
        segment.get(&key("b"));
        segment.get(&key("c"));

        assert_eq!(admit(&mut segment, "d", 45), Admission::HardBudget);
        assert_eq!(names(&segment), ["a", "d"]);
        assert_eq!(Arc::strong_count(&held), 2);
        assert_accounting(&segment);
    }

    #[test]
    fn test_exhaustion_fails_without_evicting() {
        let mut segment = ImageCacheSegment::new(MemoryUsage::new(100, 150));
        admit(&mut segment, "a", 60);
        let _a = hold(&mut segment, "a");
        assert_eq!(admit(&mut segment, "b", 60), Admission::HardBudget);
        let _b = hold(&mut segment, "b");

        let err = segment.reserve(&key("c"), 60).unwrap_err();
        assert!(err.is_out_of_capacity());
        assert_eq!(names(&segment), ["a", "b"]);
        assert_eq!(segment.memory_usage().content_size, 120);

        let metrics = segment.metrics();
        assert_eq!(metrics.rejections, 1);
        assert_eq!(metrics.overflow_admissions, 1);
        assert_eq!(metrics.core.evictions, 0);
    }

    #[test]
    fn test_partial_reclamation_is_kept_on_failure() {
        let mut segment = ImageCacheSegment::new(MemoryUsage::new(100, 120));
        admit(&mut segment, "held", 70);
        let _held = hold(&mut segment, "held");
        admit(&mut segment, "free", 20);

        assert!(segment.reserve(&key("big"), 60).is_err());
        assert_eq!(names(&segment), ["held"]);
        assert_eq!(segment.memory_usage().content_size, 70);
    }

    #[test]
    fn test_max_size_below_capacity_bounds_admission() {
        let mut segment = ImageCacheSegment::new(MemoryUsage::new(100, 50));
        assert_eq!(admit(&mut segment, "a", 40), Admission::Fast);
        assert_eq!(admit(&mut segment, "b", 40), Admission::SingleVictim);
        assert_eq!(names(&segment), ["b"]);
        assert!(segment.reserve(&key("c"), 60).is_err());
        assert_accounting(&segment);
    }

    #[test]
    fn test_reinsert_replaces_entry() {
        let mut segment = ImageCacheSegment::new(MemoryUsage::new(100, 200));
        admit(&mut segment, "a", 10);
        segment.insert(key("a"), value(30));

        assert_eq!(segment.len(), 1);
        assert_eq!(segment.memory_usage().content_size, 30);
        assert_accounting(&segment);
    }

    #[test]
    fn test_purge_unused_and_clear() {
        let mut segment = ImageCacheSegment::new(MemoryUsage::new(100, 200));
        admit(&mut segment, "a", 10);
        admit(&mut segment, "b", 20);
        admit(&mut segment, "c", 30);
        let held = hold(&mut segment, "b");

        assert_eq!(segment.purge_unused(), 2);
        assert_eq!(names(&segment), ["b"]);
        assert_eq!(segment.memory_usage().content_size, 20);

        segment.clear();
        assert!(segment.is_empty());
        assert_eq!(segment.memory_usage().content_size, 0);
        assert_eq!(segment.memory_usage().image_count, 0);
        assert_eq!(Arc::strong_count(&held), 1);
    }
}
