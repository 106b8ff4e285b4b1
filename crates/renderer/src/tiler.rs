//! Grid partition of full rasters into equally sized tiles.

use std::collections::BTreeMap;

use image::{imageops, GenericImage, RgbImage};
use map_common::{MapError, TileCoord, TileGrid};
use rayon::prelude::*;

/// Tiles addressed by `(column, row)`.
pub type TileSet = BTreeMap<TileCoord, RgbImage>;

fn check_grid(grid: &TileGrid) -> Result<(), MapError> {
    if grid.cell_px == 0 {
        return Err(MapError::invalid_config("cell_px", "must be >= 1"));
    }
    if grid.nb_cells == 0 {
        return Err(MapError::invalid_config("nb_cells", "must be >= 1"));
    }
    Ok(())
}

/// Fail unless `raster` is exactly `cell_px * nb_cells` on both sides.
pub fn check_dimensions(raster: &RgbImage, grid: &TileGrid) -> Result<(), MapError> {
    check_grid(grid)?;
    let expected = grid.raster_px();
    let (w, h) = raster.dimensions();
    if w != expected || h != expected {
        return Err(MapError::DimensionMismatch {
            expected_w: expected,
            expected_h: expected,
            actual_w: w,
            actual_h: h,
        });
    }
    Ok(())
}

/// Slice `raster` into `nb_cells x nb_cells` tiles of `cell_px` pixels.
///
/// Tile `(c, r)` covers columns `[c*cell_px, (c+1)*cell_px)` and rows
/// `[r*cell_px, (r+1)*cell_px)`.
pub fn slice(raster: &RgbImage, cell_px: u32, nb_cells: u32) -> Result<TileSet, MapError> {
    let grid = TileGrid::new(cell_px, nb_cells);
    check_dimensions(raster, &grid)?;

    let coords: Vec<TileCoord> = grid.coords().collect();
    Ok(coords
        .into_par_iter()
        .map(|coord| (coord, cut(raster, &grid, &coord)))
        .collect())
}

fn cut(raster: &RgbImage, grid: &TileGrid, coord: &TileCoord) -> RgbImage {
    let rect = grid.pixel_rect(coord);
    imageops::crop_imm(raster, rect.x, rect.y, rect.width, rect.height).to_image()
}

/// Slice a styled raster and its vegetation raster on the same grid.
///
/// Both rasters are checked before any tile is cut.
pub fn slice_pair(
    map: &RgbImage,
    vegetation: &RgbImage,
    cell_px: u32,
    nb_cells: u32,
) -> Result<BTreeMap<TileCoord, (RgbImage, RgbImage)>, MapError> {
    let grid = TileGrid::new(cell_px, nb_cells);
    check_dimensions(map, &grid)?;
    check_dimensions(vegetation, &grid)?;

    let coords: Vec<TileCoord> = grid.coords().collect();
    Ok(coords
        .into_par_iter()
        .map(|coord| {
            let pair = (cut(map, &grid, &coord), cut(vegetation, &grid, &coord));
            (coord, pair)
        })
        .collect())
}

/// Place tiles back at their offsets.
pub fn reassemble(tiles: &TileSet, cell_px: u32, nb_cells: u32) -> Result<RgbImage, MapError> {
    let grid = TileGrid::new(cell_px, nb_cells);
    check_grid(&grid)?;
    if tiles.len() != grid.len() {
        return Err(MapError::invalid_config(
            "tiles",
            format!("expected {} tiles, got {}", grid.len(), tiles.len()),
        ));
    }

    let size = grid.raster_px();
    let mut out = RgbImage::new(size, size);
    for (coord, tile) in tiles {
        if !grid.contains(coord) || tile.dimensions() != (cell_px, cell_px) {
            return Err(MapError::DimensionMismatch {
                expected_w: cell_px,
                expected_h: cell_px,
                actual_w: tile.width(),
                actual_h: tile.height(),
            });
        }
        let rect = grid.pixel_rect(coord);
        out.copy_from(tile, rect.x, rect.y)
            .map_err(|e| MapError::Encode(e.to_string()))?;
    }
    Ok(out)
}
