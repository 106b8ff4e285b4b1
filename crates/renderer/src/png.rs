//! PNG encoding for RGB rasters.
//!
//! Supports two encoding modes:
//! - **Indexed PNG (color type 3)**: used when the image has ≤256 unique
//!   colors, which is always the case for painted maps and vegetation masks.
//! - **RGB PNG (color type 2)**: fallback for images with more colors.
//!
//! Use `create_png_auto` for automatic mode selection, or `create_png` for
//! explicit RGB encoding. Decoding goes through the `image` crate.

use image::RgbImage;
use map_common::MapError;
use rayon::prelude::*;
use std::collections::HashMap;
use std::io::Write;
use std::path::Path;

/// Maximum colors for indexed PNG (PNG8)
const MAX_PALETTE_SIZE: usize = 256;

/// Minimum pixels to benefit from parallel palette extraction
const PARALLEL_THRESHOLD: usize = 4096; // 64x64 or larger

/// Create a PNG image with automatic format selection.
///
/// - If ≤256 unique colors: indexed PNG
/// - Otherwise: RGB PNG
pub fn create_png_auto(image: &RgbImage) -> Result<Vec<u8>, MapError> {
    let pixels = image.as_raw();
    let (width, height) = (image.width() as usize, image.height() as usize);

    let palette_result = if pixels.len() / 3 >= PARALLEL_THRESHOLD {
        extract_palette_parallel(pixels)
    } else {
        extract_palette_sequential(pixels)
    };

    match palette_result {
        Some((palette, indices)) => create_png_indexed(width, height, &palette, &indices),
        None => create_png(image),
    }
}

/// Pack RGB bytes into a u32 for faster hashing
#[inline(always)]
fn pack_color(r: u8, g: u8, b: u8) -> u32 {
    (r as u32) | ((g as u32) << 8) | ((b as u32) << 16)
}

#[inline(always)]
fn unpack_color(packed: u32) -> [u8; 3] {
    [packed as u8, (packed >> 8) as u8, (packed >> 16) as u8]
}

/// Sequential palette extraction for small images.
fn extract_palette_sequential(pixels: &[u8]) -> Option<(Vec<[u8; 3]>, Vec<u8>)> {
    let mut color_to_index: HashMap<u32, u8> = HashMap::with_capacity(MAX_PALETTE_SIZE);
    let mut palette: Vec<[u8; 3]> = Vec::with_capacity(MAX_PALETTE_SIZE);
    let mut indices: Vec<u8> = Vec::with_capacity(pixels.len() / 3);

    for px in pixels.chunks_exact(3) {
        let packed = pack_color(px[0], px[1], px[2]);

        let index = match color_to_index.get(&packed) {
            Some(&idx) => idx,
            None => {
                if palette.len() >= MAX_PALETTE_SIZE {
                    return None;
                }
                let idx = palette.len() as u8;
                palette.push([px[0], px[1], px[2]]);
                color_to_index.insert(packed, idx);
                idx
            }
        };
        indices.push(index);
    }

    Some((palette, indices))
}

/// Parallel palette extraction for larger images.
///
/// 1. Collect unique colors per chunk in parallel
/// 2. Merge them and give up above 256
/// 3. Map every pixel to its palette index in parallel
fn extract_palette_parallel(pixels: &[u8]) -> Option<(Vec<[u8; 3]>, Vec<u8>)> {
    let chunk_pixels = (pixels.len() / 3 / rayon::current_num_threads()).max(256);

    let unique_colors: Vec<u32> = pixels
        .par_chunks(chunk_pixels * 3)
        .flat_map(|chunk| {
            let mut local: HashMap<u32, ()> = HashMap::with_capacity(MAX_PALETTE_SIZE);
            for px in chunk.chunks_exact(3) {
                local.insert(pack_color(px[0], px[1], px[2]), ());
                if local.len() > MAX_PALETTE_SIZE {
                    break;
                }
            }
            local.into_keys().collect::<Vec<_>>()
        })
        .collect();

    let mut global: HashMap<u32, u8> = HashMap::with_capacity(MAX_PALETTE_SIZE);
    let mut palette: Vec<[u8; 3]> = Vec::with_capacity(MAX_PALETTE_SIZE);
    for packed in unique_colors {
        if !global.contains_key(&packed) {
            if palette.len() >= MAX_PALETTE_SIZE {
                return None;
            }
            global.insert(packed, palette.len() as u8);
            palette.push(unpack_color(packed));
        }
    }

    let indices: Vec<u8> = pixels
        .par_chunks_exact(3)
        .map(|px| *global.get(&pack_color(px[0], px[1], px[2])).unwrap_or(&0))
        .collect();

    Some((palette, indices))
}

/// Create an indexed PNG (color type 3) from palette and indices.
pub fn create_png_indexed(
    width: usize,
    height: usize,
    palette: &[[u8; 3]],
    indices: &[u8],
) -> Result<Vec<u8>, MapError> {
    if indices.len() != width * height {
        return Err(MapError::Encode(format!(
            "expected {} indices, got {}",
            width * height,
            indices.len()
        )));
    }

    let mut png = Vec::new();
    png.extend_from_slice(&PNG_SIGNATURE);

    write_chunk(&mut png, b"IHDR", &ihdr(width, height, 3));

    let plte_data: Vec<u8> = palette.iter().flatten().copied().collect();
    write_chunk(&mut png, b"PLTE", &plte_data);

    let idat_data = deflate_scanlines(indices, width, height)?;
    write_chunk(&mut png, b"IDAT", &idat_data);

    write_chunk(&mut png, b"IEND", &[]);

    Ok(png)
}

/// Create a PNG from RGB pixel data (color type 2).
pub fn create_png(image: &RgbImage) -> Result<Vec<u8>, MapError> {
    let (width, height) = (image.width() as usize, image.height() as usize);

    let mut png = Vec::new();
    png.extend_from_slice(&PNG_SIGNATURE);

    write_chunk(&mut png, b"IHDR", &ihdr(width, height, 2));

    let idat_data = deflate_scanlines(image.as_raw(), width * 3, height)?;
    write_chunk(&mut png, b"IDAT", &idat_data);

    write_chunk(&mut png, b"IEND", &[]);

    Ok(png)
}

const PNG_SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

fn ihdr(width: usize, height: usize, color_type: u8) -> Vec<u8> {
    let mut data = Vec::with_capacity(13);
    data.extend_from_slice(&(width as u32).to_be_bytes());
    data.extend_from_slice(&(height as u32).to_be_bytes());
    data.push(8); // bit depth
    data.push(color_type);
    data.push(0); // compression method
    data.push(0); // filter method
    data.push(0); // interlace method
    data
}

/// Write a PNG chunk
fn write_chunk(png: &mut Vec<u8>, chunk_type: &[u8; 4], data: &[u8]) {
    png.extend_from_slice(&(data.len() as u32).to_be_bytes());
    png.extend_from_slice(chunk_type);
    png.extend_from_slice(data);

    let mut hasher = crc32fast::Hasher::new();
    hasher.update(chunk_type);
    hasher.update(data);
    png.extend_from_slice(&hasher.finalize().to_be_bytes());
}

/// Prefix every `row_bytes` scanline with filter 0 and deflate.
fn deflate_scanlines(data: &[u8], row_bytes: usize, height: usize) -> Result<Vec<u8>, MapError> {
    let mut uncompressed = Vec::with_capacity(height * (1 + row_bytes));
    for row in data.chunks_exact(row_bytes.max(1)).take(height) {
        uncompressed.push(0); // filter type: none
        uncompressed.extend_from_slice(row);
    }

    let mut encoder = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::fast());
    encoder
        .write_all(&uncompressed)
        .map_err(|e| MapError::Encode(format!("IDAT compression failed: {}", e)))?;
    encoder
        .finish()
        .map_err(|e| MapError::Encode(format!("IDAT compression failed: {}", e)))
}

/// Encode and write `image` to `path`.
pub fn write_png(path: &Path, image: &RgbImage) -> Result<(), MapError> {
    let bytes = create_png_auto(image)?;
    std::fs::write(path, bytes)?;
    Ok(())
}

/// Read any PNG as an RGB raster.
pub fn read_png(path: &Path) -> Result<RgbImage, MapError> {
    let img = image::open(path)
        .map_err(|e| MapError::Encode(format!("{}: {}", path.display(), e)))?;
    Ok(img.to_rgb8())
}
