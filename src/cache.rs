//! Thread-safe Image Cache
//!
//! [`ImageCache`] wraps the admission and eviction engine in a single
//! `parking_lot::Mutex` and drives it from [`ImageCache::get`]. The lock is
//! held for the whole request, including the size probe and the decode:
//!
//! ```text
//! get::<P>(path, level)
//!   │
//!   ├─ lock ──▶ hit? ── yes ──▶ promote to MRU ──▶ return shared buffer
//!   │              │
//!   │              no
//!   │              ▼
//!   │         probe dimensions ──▶ size = (w >> level) × (h >> level) × sizeof(P)
//!   │              ▼
//!   │         reserve(size) ── out of capacity ──▶ Err
//!   │              ▼
//!   │         decode ──▶ convert to P ──▶ half-sample ──▶ insert as MRU
//!   └─ unlock ◀────────────────────────────────────────────── return shared buffer
//! ```
//!
//! Requests for different images therefore block each other while one of
//! them decodes, but two threads missing on the same key never decode it
//! twice: the second one finds the first one's entry.
//!
//! # Thread Safety
//!
//! `ImageCache` is `Send + Sync` and can be shared via `Arc`.

use core::fmt;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::config::{ImageCacheConfig, ImageReadOptions};
use crate::error::CacheError;
use crate::key::CacheKey;
use crate::memory::MemoryUsage;
use crate::metrics::CacheMetrics;
use crate::pixel::{buffer_size, Image, PixelType};
use crate::resample::half_sample_in_place;
use crate::segment::ImageCacheSegment;
use crate::source::{FsImageSource, ImageSource};
use crate::value::CacheValue;

/// In-memory cache of decoded images under a two-tier memory budget.
///
/// Images are cached per path, pixel type and half-sample level. Callers get
/// an `Arc` to the decoded buffer; while they hold it the entry is never
/// evicted.
///
/// # Examples
///
/// ```no_run
/// use image::Rgb;
/// use image_cache::{ImageCache, ImageReadOptions};
///
/// let cache = ImageCache::new(512, 1024, ImageReadOptions::default());
///
/// // Decoded once, at half resolution
/// let preview = cache.get::<Rgb<u8>>("photo.jpg", 1)?;
/// let again = cache.get::<Rgb<u8>>("photo.jpg", 1)?;
/// assert!(std::sync::Arc::ptr_eq(&preview, &again));
/// # Ok::<(), image_cache::CacheError>(())
/// ```
pub struct ImageCache<S: ImageSource = FsImageSource> {
    segment: Mutex<ImageCacheSegment>,
    source: S,
    read_options: ImageReadOptions,
}

impl ImageCache<FsImageSource> {
    /// Creates a cache reading images from disk.
    ///
    /// Budgets are in decimal megabytes (1 MB = 1,000,000 bytes).
    pub fn new(capacity_mb: u64, max_size_mb: u64, read_options: ImageReadOptions) -> Self {
        Self::init(ImageCacheConfig {
            capacity_mb,
            max_size_mb,
            read_options,
        })
    }

    /// Creates a cache reading images from disk from a configuration.
    pub fn init(config: ImageCacheConfig) -> Self {
        Self::with_source(config, FsImageSource)
    }
}

impl<S: ImageSource> ImageCache<S> {
    /// Creates a cache loading images through `source`.
    pub fn with_source(config: ImageCacheConfig, source: S) -> Self {
        let memory = MemoryUsage::from_megabytes(config.capacity_mb, config.max_size_mb);
        Self {
            segment: Mutex::new(ImageCacheSegment::new(memory)),
            source,
            read_options: config.read_options,
        }
    }

    /// Returns the image at `path` as `P` pixels, half-sampled
    /// `half_sample_level` times.
    ///
    /// On a hit the cached buffer is returned and marked most recently used.
    /// On a miss the image is probed, room is made for it and it is decoded.
    ///
    /// # Errors
    ///
    /// - [`CacheError::Io`] / [`CacheError::Decode`] if the image cannot be
    ///   read. Nothing is inserted.
    /// - [`CacheError::OutOfCapacity`] if the image does not fit under
    ///   `max_size` even after evicting every entry no caller holds.
    pub fn get<P: PixelType>(
        &self,
        path: impl AsRef<Path>,
        half_sample_level: u32,
    ) -> Result<Arc<Image<P>>, CacheError> {
        let path = path.as_ref();
        let key = CacheKey::for_pixel::<P>(path, half_sample_level);
        let mut segment = self.segment.lock();

        if let Some(value) = segment.get(&key) {
            trace!(key = %key, "image cache hit");
            return value.get::<P>().ok_or_else(|| CacheError::PixelTypeMismatch {
                path: path.to_path_buf(),
                expected: P::FORMAT,
            });
        }

        let (width, height) = match self.source.probe_dimensions(path) {
            Ok(dimensions) => dimensions,
            Err(err) => {
                segment.record_miss(0);
                segment.record_load_failure();
                return Err(err);
            }
        };
        let (width, height) = key.scaled_dimensions(width, height);
        let size = buffer_size::<P>(width, height);
        segment.record_miss(size);
        debug!(key = %key, width, height, size, "image cache miss");

        let admission = segment.reserve(&key, size)?;
        debug!(key = %key, size, ?admission, "admitting image");

        let image = match self.load::<P>(path, half_sample_level) {
            Ok(image) => image,
            Err(err) => {
                segment.record_load_failure();
                return Err(err);
            }
        };
        segment.insert(key, CacheValue::wrap(Arc::clone(&image)));
        Ok(image)
    }

    fn load<P: PixelType>(
        &self,
        path: &Path,
        half_sample_level: u32,
    ) -> Result<Arc<Image<P>>, CacheError> {
        let decoded = self.source.decode(path, &self.read_options)?;
        let mut image = P::from_dynamic(decoded);
        half_sample_in_place(&mut image, half_sample_level);
        Ok(Arc::new(image))
    }

    /// True if `P` pixels of `path` at `half_sample_level` are cached.
    ///
    /// Does not change recency order.
    pub fn contains<P: PixelType>(&self, path: impl AsRef<Path>, half_sample_level: u32) -> bool {
        let key = CacheKey::for_pixel::<P>(path.as_ref(), half_sample_level);
        self.segment.lock().contains(&key)
    }

    /// Snapshot of the budgets and current content.
    pub fn memory_usage(&self) -> MemoryUsage {
        self.segment.lock().memory_usage()
    }

    /// Options handed to the source on every decode.
    #[inline]
    pub fn read_options(&self) -> &ImageReadOptions {
        &self.read_options
    }

    #[inline]
    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn len(&self) -> usize {
        self.segment.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.segment.lock().is_empty()
    }

    /// Evicts every entry no caller holds. Returns the number evicted.
    pub fn purge_unused(&self) -> usize {
        let evicted = self.segment.lock().purge_unused();
        debug!(evicted, "purged unused images");
        evicted
    }

    /// Drops the cache's share of every entry and resets the accountant.
    ///
    /// Buffers still held by callers stay alive but are no longer counted.
    pub fn clear(&self) {
        self.segment.lock().clear();
    }

    /// Human readable listing of the content, least recently used first,
    /// followed by the memory usage.
    pub fn describe(&self) -> String {
        self.to_string()
    }
}

impl<S: ImageSource> fmt::Display for ImageCache<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let segment = self.segment.lock();
        writeln!(f, "Image cache content (LRU to MRU):")?;
        for (key, value) in segment.iter() {
            writeln!(
                f,
                " * {key}, usages: {}, size: {}",
                value.use_count(),
                value.memory_size()
            )?;
        }
        write!(f, "{}", segment.memory_usage())
    }
}

impl<S: ImageSource> CacheMetrics for ImageCache<S> {
    fn metrics(&self) -> BTreeMap<String, f64> {
        self.segment.lock().metrics().metrics()
    }

    fn algorithm_name(&self) -> &'static str {
        "ImageLRU"
    }
}

impl<S: ImageSource> fmt::Debug for ImageCache<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let segment = self.segment.lock();
        f.debug_struct("ImageCache")
            .field("len", &segment.len())
            .field("memory", &segment.memory_usage())
            .field("read_options", &self.read_options)
            .finish()
    }
}
