//! Tile grid definitions.
//!
//! The full raster is partitioned into an `nb_cells x nb_cells` grid of
//! square cells, each `cell_px` pixels wide. Tiles are addressed by
//! `(column, row)` with row 0 at the top of the image.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A tile coordinate (column/row).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileCoord {
    /// Column (x), counted from the left edge
    pub column: u32,
    /// Row (y), counted from the top edge
    pub row: u32,
}

impl TileCoord {
    pub fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// File stem used for tile artifacts: `"{column},{row}"`.
    pub fn file_stem(&self) -> String {
        format!("{},{}", self.column, self.row)
    }

    /// Parse a `"{column},{row}"` stem back into a coordinate.
    pub fn from_file_stem(stem: &str) -> Option<TileCoord> {
        let (c, r) = stem.split_once(',')?;
        Some(TileCoord {
            column: c.trim().parse().ok()?,
            row: r.trim().parse().ok()?,
        })
    }
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.column, self.row)
    }
}

/// Pixel rectangle covered by one tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// A square grid of equally sized tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileGrid {
    /// Tile edge in pixels
    pub cell_px: u32,
    /// Tiles per side
    pub nb_cells: u32,
}

impl TileGrid {
    pub fn new(cell_px: u32, nb_cells: u32) -> Self {
        Self { cell_px, nb_cells }
    }

    /// Edge length in pixels of the raster this grid partitions.
    pub fn raster_px(&self) -> u32 {
        self.cell_px * self.nb_cells
    }

    /// Total number of tiles.
    pub fn len(&self) -> usize {
        (self.nb_cells as usize) * (self.nb_cells as usize)
    }

    pub fn is_empty(&self) -> bool {
        self.nb_cells == 0 || self.cell_px == 0
    }

    /// Whether a coordinate lies inside the grid.
    pub fn contains(&self, coord: &TileCoord) -> bool {
        coord.column < self.nb_cells && coord.row < self.nb_cells
    }

    /// Pixel rectangle covered by a tile.
    ///
    /// Tile (column, row) covers rows `[row*cell_px, (row+1)*cell_px)` and
    /// columns `[column*cell_px, (column+1)*cell_px)`.
    pub fn pixel_rect(&self, coord: &TileCoord) -> PixelRect {
        PixelRect {
            x: coord.column * self.cell_px,
            y: coord.row * self.cell_px,
            width: self.cell_px,
            height: self.cell_px,
        }
    }

    /// All tile coordinates in row-major order.
    pub fn coords(&self) -> impl Iterator<Item = TileCoord> {
        let n = self.nb_cells;
        (0..n).flat_map(move |row| (0..n).map(move |column| TileCoord { column, row }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_stem_round_trip() {
        let coord = TileCoord::new(3, 11);
        assert_eq!(coord.file_stem(), "3,11");
        assert_eq!(TileCoord::from_file_stem("3,11"), Some(coord));
        assert_eq!(TileCoord::from_file_stem("3_11"), None);
        assert_eq!(TileCoord::from_file_stem("a,1"), None);
    }

    #[test]
    fn test_grid_coords_row_major() {
        let grid = TileGrid::new(300, 2);
        let coords: Vec<String> = grid.coords().map(|c| c.file_stem()).collect();
        assert_eq!(coords, vec!["0,0", "1,0", "0,1", "1,1"]);
        assert_eq!(grid.len(), 4);
        assert_eq!(grid.raster_px(), 600);
    }

    #[test]
    fn test_pixel_rect() {
        let grid = TileGrid::new(300, 2);
        let rect = grid.pixel_rect(&TileCoord::new(1, 0));
        assert_eq!(
            rect,
            PixelRect {
                x: 300,
                y: 0,
                width: 300,
                height: 300
            }
        );
        assert!(grid.contains(&TileCoord::new(1, 1)));
        assert!(!grid.contains(&TileCoord::new(2, 0)));
    }
}
