//! Cache Configuration Module
//!
//! Configuration structs have all public fields for simple instantiation:
//! just create the struct with all fields set, no builder needed.
//!
//! # Sizing Guidelines
//!
//! ## Understanding `capacity_mb` and `max_size_mb`
//!
//! - **`capacity_mb`**: the soft budget. Images are admitted without eviction
//!   while the total content stays below it. Past it, the cache evicts images
//!   that no consumer holds any more.
//! - **`max_size_mb`**: the hard budget. When eviction cannot bring the
//!   content back under `capacity_mb` (because consumers still hold images),
//!   new images are admitted up to `max_size_mb`; beyond it `get` fails.
//!
//! Both are decimal megabytes (1 MB = 1,000,000 bytes). A decoded image takes
//! `width × height × bytes_per_pixel` at its half-sampled resolution:
//!
//! ```text
//! 24MP photo, Rgb<f32>, level 0  ≈ 6000 × 4000 × 12 = 288 MB
//! 24MP photo, Rgb<f32>, level 1  ≈ 3000 × 2000 × 12 =  72 MB
//! 24MP photo, Luma<u8>, level 2  ≈ 1500 × 1000 × 1  = 1.5 MB
//! ```
//!
//! Leave headroom between the two budgets for the images pipeline stages hold
//! concurrently. `max_size_mb < capacity_mb` is accepted but makes the hard
//! budget the effective limit.
//!
//! # Examples
//!
//! ```
//! use image_cache::config::{ImageCacheConfig, ImageReadOptions};
//! use image_cache::ImageCache;
//!
//! let config = ImageCacheConfig {
//!     capacity_mb: 256,
//!     max_size_mb: 1024,
//!     read_options: ImageReadOptions::default(),
//! };
//! let cache = ImageCache::init(config);
//! assert_eq!(cache.memory_usage().capacity, 256_000_000);
//! ```

use core::fmt;

/// Options applied when decoding images from disk.
///
/// Opaque to the cache engine: they are handed to the
/// [`ImageSource`](crate::ImageSource) on every decode.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct ImageReadOptions {
    /// Rotate/flip the decoded image according to its EXIF orientation.
    pub apply_orientation: bool,
    /// Upper bound on decoder allocations in bytes. `None` keeps the decoder's defaults.
    pub max_alloc: Option<u64>,
}

impl Default for ImageReadOptions {
    fn default() -> Self {
        Self {
            apply_orientation: true,
            max_alloc: None,
        }
    }
}

impl fmt::Debug for ImageReadOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageReadOptions")
            .field("apply_orientation", &self.apply_orientation)
            .field("max_alloc", &self.max_alloc)
            .finish()
    }
}

/// Configuration for an [`ImageCache`](crate::ImageCache).
///
/// # Fields
///
/// - `capacity_mb`: soft memory budget in megabytes.
/// - `max_size_mb`: hard memory budget in megabytes. Should be at least
///   `capacity_mb`, but this is not enforced.
/// - `read_options`: decode options used for every image loaded by the cache.
#[derive(Clone, Copy)]
pub struct ImageCacheConfig {
    /// Soft budget: eviction is attempted before content exceeds it.
    pub capacity_mb: u64,
    /// Hard budget: content never exceeds it.
    pub max_size_mb: u64,
    /// Options passed to the image source on decode.
    pub read_options: ImageReadOptions,
}

impl fmt::Debug for ImageCacheConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageCacheConfig")
            .field("capacity_mb", &self.capacity_mb)
            .field("max_size_mb", &self.max_size_mb)
            .field("read_options", &self.read_options)
            .finish()
    }
}
