//! Image Cache Metrics
//!
//! Extends [`CoreCacheMetrics`] with one counter per admission path of the
//! two-tier budget, plus the accountant's current state.

use std::collections::BTreeMap;

use super::{CacheMetrics, CoreCacheMetrics};
use crate::memory::MemoryUsage;

/// Metrics of an [`ImageCache`](crate::ImageCache).
#[derive(Debug, Clone)]
pub struct ImageCacheMetrics {
    /// Core metrics common to all caches
    pub core: CoreCacheMetrics,

    /// Misses admitted under the soft budget without eviction
    pub fast_admissions: u64,

    /// Misses admitted after evicting a single large enough entry
    pub single_victim_admissions: u64,

    /// Misses admitted under the hard budget after incremental reclamation
    pub overflow_admissions: u64,

    /// Misses refused because they did not fit the hard budget
    pub rejections: u64,

    /// Misses whose probe or decode failed
    pub load_failures: u64,

    /// Accountant state at the time of the last update
    pub memory: MemoryUsage,
}

impl ImageCacheMetrics {
    /// Creates zeroed metrics for a cache with the given budgets.
    pub fn new(memory: MemoryUsage) -> Self {
        Self {
            core: CoreCacheMetrics::new(),
            fast_admissions: 0,
            single_victim_admissions: 0,
            overflow_admissions: 0,
            rejections: 0,
            load_failures: 0,
            memory,
        }
    }

    /// Converts the metrics to a deterministic map.
    pub fn to_btreemap(&self) -> BTreeMap<String, f64> {
        let mut metrics = self.core.to_btreemap();

        metrics.insert("fast_admissions".to_string(), self.fast_admissions as f64);
        metrics.insert(
            "single_victim_admissions".to_string(),
            self.single_victim_admissions as f64,
        );
        metrics.insert(
            "overflow_admissions".to_string(),
            self.overflow_admissions as f64,
        );
        metrics.insert("rejections".to_string(), self.rejections as f64);
        metrics.insert("load_failures".to_string(), self.load_failures as f64);

        metrics.insert(
            "cache_size_bytes".to_string(),
            self.memory.content_size as f64,
        );
        metrics.insert("capacity_bytes".to_string(), self.memory.capacity as f64);
        metrics.insert(
            "max_cache_size_bytes".to_string(),
            self.memory.max_size as f64,
        );
        metrics.insert("image_count".to_string(), self.memory.image_count as f64);
        metrics.insert(
            "cache_utilization".to_string(),
            self.memory.utilization(),
        );

        metrics
    }
}

impl CacheMetrics for ImageCacheMetrics {
    fn metrics(&self) -> BTreeMap<String, f64> {
        self.to_btreemap()
    }

    fn algorithm_name(&self) -> &'static str {
        "ImageLRU"
    }
}
