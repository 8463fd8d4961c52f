//! Cache Metrics System
//!
//! Metrics are reported as a `BTreeMap<String, f64>` so they always come out
//! in the same order, which keeps logs and test assertions reproducible.
//! [`CoreCacheMetrics`] holds the request-side counters any cache tracks;
//! [`ImageCacheMetrics`] adds counters for the admission paths of the image
//! cache's two-tier budget.

use std::collections::BTreeMap;

pub mod image;

pub use self::image::ImageCacheMetrics;

/// Common request and traffic counters.
#[derive(Debug, Default, Clone)]
pub struct CoreCacheMetrics {
    /// Total number of `get` requests
    pub requests: u64,

    /// Requests served from an existing entry
    pub cache_hits: u64,

    /// Total bytes of data requested (hits + misses)
    pub total_bytes_requested: u64,

    /// Bytes served directly from cache (hits only)
    pub bytes_served_from_cache: u64,

    /// Bytes loaded into the cache
    pub bytes_written_to_cache: u64,

    /// Entries evicted to make room for new ones
    pub evictions: u64,
}

impl CoreCacheMetrics {
    /// Creates zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a hit on an entry of `object_size` bytes.
    pub fn record_hit(&mut self, object_size: u64) {
        self.requests += 1;
        self.cache_hits += 1;
        self.total_bytes_requested += object_size;
        self.bytes_served_from_cache += object_size;
    }

    /// Records a miss for an image estimated at `object_size` bytes.
    ///
    /// Misses are derived as `requests - cache_hits`.
    pub fn record_miss(&mut self, object_size: u64) {
        self.requests += 1;
        self.total_bytes_requested += object_size;
    }

    /// Records an entry of `evicted_size` bytes leaving the cache.
    pub fn record_eviction(&mut self, _evicted_size: u64) {
        self.evictions += 1;
    }

    /// Records `object_size` bytes being loaded into the cache.
    pub fn record_insertion(&mut self, object_size: u64) {
        self.bytes_written_to_cache += object_size;
    }

    /// Number of requests that were not hits.
    pub fn cache_misses(&self) -> u64 {
        self.requests - self.cache_hits
    }

    /// Hit ratio between 0.0 and 1.0, 0.0 before any request.
    pub fn hit_rate(&self) -> f64 {
        if self.requests > 0 {
            self.cache_hits as f64 / self.requests as f64
        } else {
            0.0
        }
    }

    /// Miss ratio between 0.0 and 1.0, 0.0 before any request.
    pub fn miss_rate(&self) -> f64 {
        if self.requests > 0 {
            self.cache_misses() as f64 / self.requests as f64
        } else {
            0.0
        }
    }

    /// Share of requested bytes served from cache.
    pub fn byte_hit_rate(&self) -> f64 {
        if self.total_bytes_requested > 0 {
            self.bytes_served_from_cache as f64 / self.total_bytes_requested as f64
        } else {
            0.0
        }
    }

    /// Converts the counters to a deterministic map.
    pub fn to_btreemap(&self) -> BTreeMap<String, f64> {
        let mut metrics = BTreeMap::new();

        metrics.insert("cache_hits".to_string(), self.cache_hits as f64);
        metrics.insert("cache_misses".to_string(), self.cache_misses() as f64);
        metrics.insert("evictions".to_string(), self.evictions as f64);
        metrics.insert("requests".to_string(), self.requests as f64);

        metrics.insert("hit_rate".to_string(), self.hit_rate());
        metrics.insert("miss_rate".to_string(), self.miss_rate());
        metrics.insert("byte_hit_rate".to_string(), self.byte_hit_rate());

        metrics.insert(
            "bytes_served_from_cache".to_string(),
            self.bytes_served_from_cache as f64,
        );
        metrics.insert(
            "bytes_written_to_cache".to_string(),
            self.bytes_written_to_cache as f64,
        );
        metrics.insert(
            "total_bytes_requested".to_string(),
            self.total_bytes_requested as f64,
        );

        metrics
    }
}

/// Uniform metrics reporting interface.
pub trait CacheMetrics {
    /// Returns all metrics as key-value pairs in deterministic order.
    fn metrics(&self) -> BTreeMap<String, f64>;

    /// Name of the eviction algorithm, for identification in reports.
    fn algorithm_name(&self) -> &'static str;
}
