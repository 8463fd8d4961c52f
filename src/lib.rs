#![doc = include_str!("../README.md")]
//!
//! ---
//!
//! # Code Reference
//!
//! ## Requesting Images
//!
//! The pixel type selects both the cached format and the conversion applied
//! after decode. The half-sample level selects the resolution: level `n`
//! halves both sides `n` times, rounding down.
//!
//! ```rust,no_run
//! use image::{Rgb, Rgba};
//! use image_cache::{ImageCache, ImageCacheConfig, ImageReadOptions};
//!
//! let cache = ImageCache::init(ImageCacheConfig {
//!     capacity_mb: 512,
//!     max_size_mb: 2048,
//!     read_options: ImageReadOptions::default(),
//! });
//!
//! let preview = cache.get::<Rgb<u8>>("photo.jpg", 2)?;
//! let working = cache.get::<Rgba<f32>>("photo.jpg", 0)?;
//! # Ok::<(), image_cache::CacheError>(())
//! ```
//!
//! ## Handling Exhaustion
//!
//! `get` fails with [`CacheError::OutOfCapacity`] when the image does not fit
//! under the hard budget even after evicting every unheld image. Dropping
//! held buffers and retrying is the usual answer.
//!
//! ```rust,no_run
//! use image::Luma;
//! use image_cache::ImageCache;
//!
//! # let cache = ImageCache::new(10, 20, Default::default());
//! match cache.get::<Luma<u8>>("huge.png", 0) {
//!     Ok(image) => println!("{:?}", image.dimensions()),
//!     Err(err) if err.is_out_of_capacity() => eprintln!("cache full: {err}"),
//!     Err(err) => return Err(err),
//! }
//! # Ok::<(), image_cache::CacheError>(())
//! ```
//!
//! ## Custom Sources
//!
//! Implement [`ImageSource`] to serve images from somewhere other than the
//! filesystem, then build the cache with [`ImageCache::with_source`].
//!
//! ## Modules
//!
//! - [`cache`]: the thread-safe [`ImageCache`]
//! - [`key`] / [`value`]: cache keys and format-erased cached buffers
//! - [`pixel`]: supported pixel types
//! - [`memory`]: the memory accountant
//! - [`source`]: image sources
//! - [`resample`]: half-sampling of decoded buffers
//! - [`config`]: configuration structures
//! - [`metrics`]: metrics collection for cache performance monitoring

#[cfg(test)]
extern crate scoped_threadpool;

/// Doubly linked list implementation with in-place editing capabilities.
///
/// **Note**: This module is internal infrastructure. It exposes unsafe raw
/// pointer operations that require careful invariant maintenance.
pub(crate) mod list;

/// Single-threaded admission and eviction engine.
pub(crate) mod segment;

/// Cache configuration structures.
pub mod config;

/// Errors returned by the cache.
pub mod error;

/// Cache keys.
pub mod key;

/// Supported pixel types and formats.
pub mod pixel;

/// Format-erased cached buffers.
pub mod value;

/// Memory accountant for the two-tier budget.
pub mod memory;

/// Image sources: dimension probing and decoding.
pub mod source;

/// Half-sampling of decoded buffers.
pub mod resample;

/// Cache metrics system.
///
/// Provides a metrics collection and reporting system with deterministic
/// ordering of the reported values.
pub mod metrics;

/// The thread-safe image cache.
pub mod cache;

pub use cache::ImageCache;
pub use config::{ImageCacheConfig, ImageReadOptions};
pub use error::CacheError;
pub use key::CacheKey;
pub use memory::MemoryUsage;
pub use metrics::CacheMetrics;
pub use pixel::{BaseType, Image, PixelFormat, PixelType};
pub use resample::{downscale_in_place, half_sample_in_place};
pub use source::{FsImageSource, ImageSource};
pub use value::CacheValue;
