//! Synthetic raster generators.
//!
//! These generators create predictable, verifiable raster patterns that can
//! be used across the test suite.

use image::RgbImage;
use map_common::Rgb;

/// Single-color raster.
pub fn solid_image(width: u32, height: u32, color: Rgb) -> RgbImage {
    RgbImage::from_pixel(width, height, image::Rgb(color.channels()))
}

/// Raster where every pixel encodes its own position.
///
/// Pixel `(x, y)` is `(x % 256, y % 256, (x / 256) * 16 + y / 256)`, so any
/// misplaced pixel is detectable.
pub fn coordinate_image(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([
            (x % 256) as u8,
            (y % 256) as u8,
            ((x / 256) * 16 + y / 256) as u8,
        ])
    })
}

/// Checkerboard of `square`-pixel squares cycling through `colors`.
pub fn checkerboard(width: u32, height: u32, square: u32, colors: &[Rgb]) -> RgbImage {
    let square = square.max(1);
    let n = colors.len().max(1) as u32;
    RgbImage::from_fn(width, height, |x, y| {
        let idx = ((x / square) + (y / square)) % n;
        let color = colors.get(idx as usize).copied().unwrap_or(Rgb::BLACK);
        image::Rgb(color.channels())
    })
}

/// Smooth gradient with far more than 256 distinct colors.
pub fn gradient_image(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([
            (x * 255 / width.max(1)) as u8,
            (y * 255 / height.max(1)) as u8,
            ((x + y) % 256) as u8,
        ])
    })
}
