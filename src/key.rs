//! Cache Key
//!
//! A [`CacheKey`] identifies one cached variant of a source image: the file
//! it was read from, the pixel format it was converted to and how many times
//! it was half-sampled. Equality and hashing are structural over all four
//! fields. Paths are compared as given; callers that want two spellings of
//! the same file to share an entry must canonicalize them first.

use core::fmt;
use std::path::{Path, PathBuf};

use crate::pixel::{BaseType, PixelFormat, PixelType};

/// Composite identifier of a cached image variant.
///
/// # Examples
///
/// ```
/// use image::Rgb;
/// use image_cache::CacheKey;
///
/// let full = CacheKey::for_pixel::<Rgb<u8>>("photo.jpg", 0);
/// let half = CacheKey::for_pixel::<Rgb<u8>>("photo.jpg", 1);
/// assert_ne!(full, half);
/// assert_eq!(full, CacheKey::for_pixel::<Rgb<u8>>("photo.jpg", 0));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    path: PathBuf,
    channels: u8,
    base_type: BaseType,
    half_sample_level: u32,
}

impl CacheKey {
    /// Creates a key from its four components.
    pub fn new(
        path: impl Into<PathBuf>,
        channels: u8,
        base_type: BaseType,
        half_sample_level: u32,
    ) -> Self {
        Self {
            path: path.into(),
            channels,
            base_type,
            half_sample_level,
        }
    }

    /// Creates the key under which pixel type `P` of `path` is cached.
    pub fn for_pixel<P: PixelType>(path: impl Into<PathBuf>, half_sample_level: u32) -> Self {
        Self::new(
            path,
            P::FORMAT.channels,
            P::FORMAT.base_type,
            half_sample_level,
        )
    }

    /// Source image path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of color channels.
    pub fn channels(&self) -> u8 {
        self.channels
    }

    /// Scalar component type.
    pub fn base_type(&self) -> BaseType {
        self.base_type
    }

    /// Pixel format selected by the channel count and base type.
    pub fn format(&self) -> PixelFormat {
        PixelFormat {
            channels: self.channels,
            base_type: self.base_type,
        }
    }

    /// Number of halving passes; 0 is full resolution.
    pub fn half_sample_level(&self) -> u32 {
        self.half_sample_level
    }

    /// Dimensions of a `width × height` source after this key's half-sampling.
    ///
    /// Each level halves both sides, rounding down.
    pub fn scaled_dimensions(&self, width: u32, height: u32) -> (u32, u32) {
        let level = self.half_sample_level;
        (
            width.checked_shr(level).unwrap_or(0),
            height.checked_shr(level).unwrap_or(0),
        )
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}, channels: {}, type: {}, half sample level: {}",
            self.path.display(),
            self.channels,
            self.base_type,
            self.half_sample_level
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Luma, Rgb, Rgba};
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    fn hash_of(key: &CacheKey) -> u64 {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn test_equal_keys_hash_identically() {
        let a = CacheKey::new("a.png", 3, BaseType::F32, 2);
        let b = CacheKey::new(String::from("a.png"), 3, BaseType::F32, 2);
        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));
    }

    #[test]
    fn test_every_field_participates_in_equality() {
        let base = CacheKey::new("a.png", 3, BaseType::U8, 0);
        assert_ne!(base, CacheKey::new("b.png", 3, BaseType::U8, 0));
        assert_ne!(base, CacheKey::new("a.png", 4, BaseType::U8, 0));
        assert_ne!(base, CacheKey::new("a.png", 3, BaseType::F32, 0));
        assert_ne!(base, CacheKey::new("a.png", 3, BaseType::U8, 1));
    }

    #[test]
    fn test_paths_are_not_normalized() {
        let plain = CacheKey::new("dir/a.png", 1, BaseType::U8, 0);
        let dotted = CacheKey::new("dir/./a.png", 1, BaseType::U8, 0);
        assert_ne!(plain, dotted);
    }

    #[test]
    fn test_for_pixel_uses_pixel_format() {
        let key = CacheKey::for_pixel::<Rgba<f32>>("x.exr", 1);
        assert_eq!(key.channels(), 4);
        assert_eq!(key.base_type(), BaseType::F32);
        assert_eq!(key.format(), <Rgba<f32>>::FORMAT);
        assert_ne!(
            CacheKey::for_pixel::<Luma<u8>>("x.exr", 0),
            CacheKey::for_pixel::<Rgb<u8>>("x.exr", 0)
        );
    }

    #[test]
    fn test_scaled_dimensions_floor() {
        let key = CacheKey::new("a.png", 1, BaseType::U8, 2);
        assert_eq!(key.scaled_dimensions(101, 7), (25, 1));
        let key = CacheKey::new("a.png", 1, BaseType::U8, 0);
        assert_eq!(key.scaled_dimensions(101, 7), (101, 7));
        let key = CacheKey::new("a.png", 1, BaseType::U8, 40);
        assert_eq!(key.scaled_dimensions(u32::MAX, 7), (0, 0));
    }

    #[test]
    fn test_display_lists_fields() {
        let key = CacheKey::new("a.png", 3, BaseType::U8, 1);
        assert_eq!(
            key.to_string(),
            "a.png, channels: 3, type: u8, half sample level: 1"
        );
    }
}
