//! Image Sources
//!
//! The cache does not decode images itself. On a miss it asks an
//! [`ImageSource`] for two things:
//!
//! 1. the image's dimensions, read cheaply from its header, so the admission
//!    decision can be made before any pixel is decoded;
//! 2. the fully decoded image, once the cache has made room for it.
//!
//! [`FsImageSource`] reads files from disk with the `image` crate. Other
//! implementations can serve images from memory, an archive or a test fixture.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use image::{DynamicImage, ImageDecoder, ImageReader, Limits};

use crate::config::ImageReadOptions;
use crate::error::CacheError;

/// Provider of image dimensions and decoded pixels.
///
/// Called while the cache lock is held, so implementations must not call
/// back into the same cache.
pub trait ImageSource: Send + Sync {
    /// Returns `(width, height)` of the image at `path` without decoding its pixels.
    fn probe_dimensions(&self, path: &Path) -> Result<(u32, u32), CacheError>;

    /// Fully decodes the image at `path` at its native resolution.
    fn decode(&self, path: &Path, options: &ImageReadOptions) -> Result<DynamicImage, CacheError>;
}

/// Reads images from the filesystem, guessing the format from file contents.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsImageSource;

impl FsImageSource {
    fn open(path: &Path) -> Result<ImageReader<BufReader<File>>, CacheError> {
        ImageReader::open(path)
            .and_then(|reader| reader.with_guessed_format())
            .map_err(|source| CacheError::io(path, source))
    }
}

impl ImageSource for FsImageSource {
    fn probe_dimensions(&self, path: &Path) -> Result<(u32, u32), CacheError> {
        Self::open(path)?
            .into_dimensions()
            .map_err(|source| CacheError::decode(path, source))
    }

    fn decode(&self, path: &Path, options: &ImageReadOptions) -> Result<DynamicImage, CacheError> {
        let mut limits = Limits::default();
        if let Some(max_alloc) = options.max_alloc {
            limits.max_alloc = Some(max_alloc);
        }
        let mut reader = Self::open(path)?;
        reader.limits(limits.clone());

        let mut decoder = reader
            .into_decoder()
            .map_err(|source| CacheError::decode(path, source))?;
        limits
            .reserve(decoder.total_bytes())
            .map_err(|source| CacheError::decode(path, source))?;
        let orientation = if options.apply_orientation {
            Some(
                decoder
                    .orientation()
                    .map_err(|source| CacheError::decode(path, source))?,
            )
        } else {
            None
        };

        let mut image =
            DynamicImage::from_decoder(decoder).map_err(|source| CacheError::decode(path, source))?;
        if let Some(orientation) = orientation {
            image.apply_orientation(orientation);
        }
        Ok(image)
    }
}
