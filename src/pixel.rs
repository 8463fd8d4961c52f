//! Supported Pixel Formats
//!
//! The cache stores decoded images in one of six pixel formats, each an
//! [`image`] crate pixel type:
//!
//! | Pixel type | Channels | Base type | Bytes per pixel |
//! |------------|----------|-----------|-----------------|
//! | `Luma<u8>` | 1 | [`BaseType::U8`] | 1 |
//! | `Luma<f32>` | 1 | [`BaseType::F32`] | 4 |
//! | `Rgb<u8>` | 3 | [`BaseType::U8`] | 3 |
//! | `Rgb<f32>` | 3 | [`BaseType::F32`] | 12 |
//! | `Rgba<u8>` | 4 | [`BaseType::U8`] | 4 |
//! | `Rgba<f32>` | 4 | [`BaseType::F32`] | 16 |
//!
//! The pair (channel count, base type) identifies the format uniquely. It is
//! part of every [`CacheKey`](crate::CacheKey), which is how a typed
//! `get::<P>()` always finds a value stored with the same `P`.

use core::fmt;
use core::mem;
use std::sync::Arc;

use image::{DynamicImage, ImageBuffer, Luma, Rgb, Rgba};

use crate::value::CacheValue;

/// Decoded image buffer holding pixels of type `P`.
pub type Image<P> = ImageBuffer<P, Vec<<P as image::Pixel>::Subpixel>>;

/// Scalar storage type of a single pixel component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BaseType {
    /// 8-bit unsigned integer component.
    U8,
    /// 32-bit floating point component.
    F32,
}

impl BaseType {
    /// Size in bytes of one component.
    pub const fn size(self) -> usize {
        match self {
            BaseType::U8 => 1,
            BaseType::F32 => 4,
        }
    }
}

impl fmt::Display for BaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BaseType::U8 => f.write_str("u8"),
            BaseType::F32 => f.write_str("f32"),
        }
    }
}

/// Runtime description of a pixel format: channel count plus base type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PixelFormat {
    /// Number of color channels.
    pub channels: u8,
    /// Scalar type of each channel.
    pub base_type: BaseType,
}

impl PixelFormat {
    /// Bytes occupied by one pixel of this format.
    pub const fn bytes_per_pixel(self) -> usize {
        self.channels as usize * self.base_type.size()
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.channels, self.base_type)
    }
}

mod sealed {
    pub trait Sealed {}
}

/// A pixel type the cache can store.
///
/// Implemented for the six formats listed in the [module docs](self) and
/// sealed against further implementations, since [`CacheValue`] has exactly
/// one slot per format.
pub trait PixelType: image::Pixel + Send + Sync + sealed::Sealed + 'static {
    /// Channel count and base type of this pixel.
    const FORMAT: PixelFormat;

    /// Wraps a shared buffer of this pixel type into a [`CacheValue`].
    fn wrap(image: Arc<Image<Self>>) -> CacheValue;

    /// Returns the buffer held by `value` if it was wrapped with this pixel type.
    fn unwrap(value: &CacheValue) -> Option<Arc<Image<Self>>>;

    /// Converts a freshly decoded image into this pixel format.
    fn from_dynamic(image: DynamicImage) -> Image<Self>;

    /// Bytes occupied by one pixel, i.e. `size_of::<Self>()`.
    fn bytes_per_pixel() -> u64 {
        mem::size_of::<Self>() as u64
    }
}

/// Byte size of a `width × height` buffer of `P` pixels.
pub(crate) fn buffer_size<P: PixelType>(width: u32, height: u32) -> u64 {
    u64::from(width) * u64::from(height) * P::bytes_per_pixel()
}

macro_rules! impl_pixel_type {
    ($pixel:ty, $variant:ident, $channels:expr, $base:expr, $convert:ident) => {
        impl sealed::Sealed for $pixel {}

        impl PixelType for $pixel {
            const FORMAT: PixelFormat = PixelFormat {
                channels: $channels,
                base_type: $base,
            };

            fn wrap(image: Arc<Image<Self>>) -> CacheValue {
                CacheValue::$variant(image)
            }

            fn unwrap(value: &CacheValue) -> Option<Arc<Image<Self>>> {
                match value {
                    CacheValue::$variant(image) => Some(Arc::clone(image)),
                    _ => None,
                }
            }

            fn from_dynamic(image: DynamicImage) -> Image<Self> {
                image.$convert()
            }
        }
    };
}

impl_pixel_type!(Luma<u8>, Gray8, 1, BaseType::U8, into_luma8);
impl_pixel_type!(Luma<f32>, Gray32F, 1, BaseType::F32, to_luma32f);
impl_pixel_type!(Rgb<u8>, Rgb8, 3, BaseType::U8, into_rgb8);
impl_pixel_type!(Rgb<f32>, Rgb32F, 3, BaseType::F32, into_rgb32f);
impl_pixel_type!(Rgba<u8>, Rgba8, 4, BaseType::U8, into_rgba8);
impl_pixel_type!(Rgba<f32>, Rgba32F, 4, BaseType::F32, into_rgba32f);
