//! Error types returned by the image cache.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::pixel::PixelFormat;

/// Errors surfaced by [`ImageCache::get`](crate::ImageCache::get).
#[derive(Debug, Error)]
pub enum CacheError {
    /// The image file could not be opened or read.
    #[error("failed to read image {}: {source}", .path.display())]
    Io {
        /// File that failed to open.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// The image header or pixel data could not be decoded.
    #[error("failed to decode image {}: {source}", .path.display())]
    Decode {
        /// File that failed to decode.
        path: PathBuf,
        /// Underlying decoder error.
        source: image::ImageError,
    },

    /// Even after evicting every reclaimable entry the image does not fit the hard budget.
    #[error(
        "not enough space to load image {}: {requested} bytes requested, \
         {content_size} bytes in use, max size is {max_size} bytes",
        .path.display()
    )]
    OutOfCapacity {
        /// Image that was requested.
        path: PathBuf,
        /// Bytes the image would occupy.
        requested: u64,
        /// Bytes held by the cache after reclamation.
        content_size: u64,
        /// Hard budget in bytes.
        max_size: u64,
    },

    /// A cached entry does not hold the pixel format its key names.
    #[error("cached image {} does not hold {expected} pixels", .path.display())]
    PixelTypeMismatch {
        /// Image that was requested.
        path: PathBuf,
        /// Format implied by the requested pixel type.
        expected: PixelFormat,
    },
}

impl CacheError {
    pub(crate) fn io(path: &Path, source: io::Error) -> Self {
        CacheError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn decode(path: &Path, source: image::ImageError) -> Self {
        CacheError::Decode {
            path: path.to_path_buf(),
            source,
        }
    }

    /// True for [`CacheError::OutOfCapacity`].
    pub fn is_out_of_capacity(&self) -> bool {
        matches!(self, CacheError::OutOfCapacity { .. })
    }
}
