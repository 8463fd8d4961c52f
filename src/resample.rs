//! Half-sampling of decoded buffers.
//!
//! Each halving maps a `w × h` buffer to `floor(w / 2) × floor(h / 2)`, the
//! same rounding the cache uses when it estimates an image's size from its
//! header, so estimate and decoded size agree.

use image::imageops::{self, FilterType};

use crate::pixel::{Image, PixelType};

/// Halves the resolution of `image` `log2(factor)` times, in place.
///
/// A factor of 0 or 1 leaves the image untouched; non power of two factors
/// round down to the previous power of two.
pub fn downscale_in_place<P: PixelType>(image: &mut Image<P>, factor: u32) {
    if factor > 1 {
        half_sample_in_place(image, factor.ilog2());
    }
}

/// Halves the resolution of `image` `levels` times, in place.
pub fn half_sample_in_place<P: PixelType>(image: &mut Image<P>, levels: u32) {
    for _ in 0..levels {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            break;
        }
        let (half_width, half_height) = (width / 2, height / 2);
        *image = if half_width == 0 || half_height == 0 {
            Image::<P>::new(half_width, half_height)
        } else {
            imageops::resize(&*image, half_width, half_height, FilterType::Triangle)
        };
    }
}
