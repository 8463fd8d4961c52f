//! Cache Value
//!
//! [`CacheValue`] owns one share of exactly one decoded buffer. It is a sum
//! type with one variant per supported pixel format, so "exactly one slot is
//! populated" holds by construction. Values are created through
//! [`CacheValue::wrap`] and read back with [`CacheValue::get`].
//!
//! The cache keeps its own `Arc` inside the value. A [`use_count`] of 1
//! therefore means nobody outside the cache holds the buffer and the entry
//! can be evicted without invalidating a consumer.
//!
//! [`use_count`]: CacheValue::use_count

use std::sync::Arc;

use image::{Luma, Rgb, Rgba};

use crate::pixel::{buffer_size, Image, PixelFormat, PixelType};

/// Format-erased shared handle to a decoded image.
#[derive(Debug, Clone)]
pub enum CacheValue {
    /// Single channel, 8-bit.
    Gray8(Arc<Image<Luma<u8>>>),
    /// Single channel, 32-bit float.
    Gray32F(Arc<Image<Luma<f32>>>),
    /// RGB, 8-bit.
    Rgb8(Arc<Image<Rgb<u8>>>),
    /// RGB, 32-bit float.
    Rgb32F(Arc<Image<Rgb<f32>>>),
    /// RGBA, 8-bit.
    Rgba8(Arc<Image<Rgba<u8>>>),
    /// RGBA, 32-bit float.
    Rgba32F(Arc<Image<Rgba<f32>>>),
}

impl CacheValue {
    /// Wraps a shared buffer, selecting the variant from its pixel type.
    pub fn wrap<P: PixelType>(image: Arc<Image<P>>) -> Self {
        P::wrap(image)
    }

    /// Returns the buffer if this value holds `P` pixels, `None` otherwise.
    pub fn get<P: PixelType>(&self) -> Option<Arc<Image<P>>> {
        P::unwrap(self)
    }

    /// Pixel format of the held buffer.
    pub fn format(&self) -> PixelFormat {
        match self {
            CacheValue::Gray8(_) => <Luma<u8>>::FORMAT,
            CacheValue::Gray32F(_) => <Luma<f32>>::FORMAT,
            CacheValue::Rgb8(_) => <Rgb<u8>>::FORMAT,
            CacheValue::Rgb32F(_) => <Rgb<f32>>::FORMAT,
            CacheValue::Rgba8(_) => <Rgba<u8>>::FORMAT,
            CacheValue::Rgba32F(_) => <Rgba<f32>>::FORMAT,
        }
    }

    /// Number of `Arc` handles currently referencing the buffer, this value's included.
    pub fn use_count(&self) -> usize {
        match self {
            CacheValue::Gray8(image) => Arc::strong_count(image),
            CacheValue::Gray32F(image) => Arc::strong_count(image),
            CacheValue::Rgb8(image) => Arc::strong_count(image),
            CacheValue::Rgb32F(image) => Arc::strong_count(image),
            CacheValue::Rgba8(image) => Arc::strong_count(image),
            CacheValue::Rgba32F(image) => Arc::strong_count(image),
        }
    }

    /// True when this value holds the only handle to its buffer.
    #[inline]
    pub fn is_reclaimable(&self) -> bool {
        self.use_count() == 1
    }

    /// Width and height of the held buffer.
    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            CacheValue::Gray8(image) => image.dimensions(),
            CacheValue::Gray32F(image) => image.dimensions(),
            CacheValue::Rgb8(image) => image.dimensions(),
            CacheValue::Rgb32F(image) => image.dimensions(),
            CacheValue::Rgba8(image) => image.dimensions(),
            CacheValue::Rgba32F(image) => image.dimensions(),
        }
    }

    /// Bytes occupied by the held buffer: width × height × bytes per pixel.
    pub fn memory_size(&self) -> u64 {
        let (width, height) = self.dimensions();
        match self {
            CacheValue::Gray8(_) => buffer_size::<Luma<u8>>(width, height),
            CacheValue::Gray32F(_) => buffer_size::<Luma<f32>>(width, height),
            CacheValue::Rgb8(_) => buffer_size::<Rgb<u8>>(width, height),
            CacheValue::Rgb32F(_) => buffer_size::<Rgb<f32>>(width, height),
            CacheValue::Rgba8(_) => buffer_size::<Rgba<u8>>(width, height),
            CacheValue::Rgba32F(_) => buffer_size::<Rgba<f32>>(width, height),
        }
    }
}
