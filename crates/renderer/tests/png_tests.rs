//! Tests for PNG encoding functionality.
//!
//! Tests the indexed PNG and RGB PNG encoders, including:
//! - PNG format selection (auto mode)
//! - Lossless decoding through the `image` crate
//! - File round trips

use image::RgbImage;
use renderer::png::{create_png, create_png_auto, create_png_indexed, read_png, write_png};
use renderer::style::palette;
use test_utils::{checkerboard, gradient_image, temp_test_dir};

const PNG_SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

// ============================================================================
// Helper functions
// ============================================================================

/// Color type byte from the IHDR chunk
fn color_type(png: &[u8]) -> u8 {
    // signature (8) + length (4) + "IHDR" (4) + width (4) + height (4) + depth (1)
    png[25]
}

fn decode(png: &[u8]) -> RgbImage {
    image::load_from_memory(png).unwrap().to_rgb8()
}

fn painted_map(width: u32, height: u32) -> RgbImage {
    checkerboard(width, height, 7, &palette::ALL)
}

// ============================================================================
// Basic PNG creation tests
// ============================================================================

#[test]
fn test_create_png_simple() {
    let img = checkerboard(2, 2, 1, &[palette::WATER, palette::SAND]);
    let png = create_png_auto(&img).unwrap();
    assert_eq!(&png[0..8], &PNG_SIGNATURE);
    assert_eq!(decode(&png), img);
}

#[test]
fn test_create_png_rgb() {
    let img = gradient_image(3, 2);
    let png = create_png(&img).unwrap();
    assert_eq!(&png[0..8], &PNG_SIGNATURE);
    assert_eq!(color_type(&png), 2);
    assert_eq!(decode(&png), img);
}

#[test]
fn test_indexed_rejects_wrong_index_count() {
    let palette = [[0, 0, 0], [255, 255, 255]];
    assert!(create_png_indexed(2, 2, &palette, &[0, 1, 1]).is_err());
}

// ============================================================================
// Format selection tests
// ============================================================================

#[test]
fn test_painted_map_is_indexed() {
    let img = painted_map(64, 64);
    let png = create_png_auto(&img).unwrap();
    assert_eq!(color_type(&png), 3);
    assert_eq!(decode(&png), img);
}

#[test]
fn test_many_colors_fall_back_to_rgb() {
    let img = gradient_image(300, 20);
    let png = create_png_auto(&img).unwrap();
    assert_eq!(color_type(&png), 2);
    assert_eq!(decode(&png), img);
}

#[test]
fn test_indexed_smaller_than_rgb() {
    let img = painted_map(256, 256);
    let indexed = create_png_auto(&img).unwrap();
    let rgb = create_png(&img).unwrap();
    assert!(
        indexed.len() < rgb.len(),
        "Indexed PNG ({} bytes) should be smaller than RGB ({} bytes)",
        indexed.len(),
        rgb.len()
    );
}

// ============================================================================
// Large image tests (parallel processing)
// ============================================================================

#[test]
fn test_large_image_parallel_extraction() {
    // 300x300 is above the parallel threshold
    let img = painted_map(300, 300);
    let png = create_png_auto(&img).unwrap();
    assert_eq!(color_type(&png), 3);
    assert_eq!(decode(&png), img);
}

// ============================================================================
// File round trips
// ============================================================================

#[test]
fn test_write_then_read() {
    let dir = temp_test_dir();
    let path = dir.path().join("complete_map.png");
    let img = painted_map(90, 60);

    write_png(&path, &img).unwrap();
    assert!(path.exists());
    assert_eq!(read_png(&path).unwrap(), img);
}

#[test]
fn test_read_missing_file() {
    let dir = temp_test_dir();
    assert!(read_png(&dir.path().join("nope.png")).is_err());
}
