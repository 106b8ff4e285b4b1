//! Render zone: the ground rectangle that becomes the final raster.

use crate::{Coord, Rect};
use serde::{Deserialize, Serialize};

/// Smallest margin, as a fraction of the zone edge, fetched around the zone.
pub const MIN_MARGIN_FACTOR: f64 = 0.6;

/// Ground extent of the raster in planar coordinates (meters).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RenderZone {
    /// Center easting
    pub center_x: f64,
    /// Center northing
    pub center_y: f64,
    pub half_width_m: f64,
    pub half_height_m: f64,
}

impl RenderZone {
    pub fn new(center_x: f64, center_y: f64, half_width_m: f64, half_height_m: f64) -> Self {
        Self {
            center_x,
            center_y,
            half_width_m,
            half_height_m,
        }
    }

    /// Square zone covering `nb_cells x nb_cells` cells of `cell_size_m`.
    pub fn square(center_x: f64, center_y: f64, cell_size_m: f64, nb_cells: u32) -> Self {
        let half = cell_size_m * nb_cells as f64 / 2.0;
        Self::new(center_x, center_y, half, half)
    }

    pub fn width_m(&self) -> f64 {
        self.half_width_m * 2.0
    }

    pub fn height_m(&self) -> f64 {
        self.half_height_m * 2.0
    }

    pub fn bbox(&self) -> Rect {
        Rect::new(
            Coord {
                x: self.center_x - self.half_width_m,
                y: self.center_y - self.half_height_m,
            },
            Coord {
                x: self.center_x + self.half_width_m,
                y: self.center_y + self.half_height_m,
            },
        )
    }

    /// Ground meters covered by one pixel along x for a raster `pixel_width` wide.
    pub fn meters_per_pixel(&self, pixel_width: u32) -> f64 {
        self.width_m() / pixel_width as f64
    }

    /// Margin in meters fetched beyond each side of the zone.
    ///
    /// `margin_factor` is a fraction of the zone edge and never drops
    /// below [`MIN_MARGIN_FACTOR`].
    pub fn margin_m(&self, margin_factor: f64) -> f64 {
        self.width_m().max(self.height_m()) * margin_factor.max(MIN_MARGIN_FACTOR)
    }

    /// Search radius around the center that covers the zone plus margin.
    pub fn fetch_radius_m(&self, margin_factor: f64) -> f64 {
        self.half_width_m.max(self.half_height_m) + self.margin_m(margin_factor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_square_zone() {
        let zone = RenderZone::square(500_000.0, 5_000_000.0, 300.0, 2);
        assert_eq!(zone.width_m(), 600.0);
        let bbox = zone.bbox();
        assert_eq!(bbox.min(), Coord { x: 499_700.0, y: 4_999_700.0 });
        assert_eq!(bbox.max(), Coord { x: 500_300.0, y: 5_000_300.0 });
        assert_eq!(zone.meters_per_pixel(600), 1.0);
    }

    #[test]
    fn test_margin_has_floor() {
        let zone = RenderZone::square(0.0, 0.0, 300.0, 2);
        assert_eq!(zone.margin_m(0.0), 600.0 * MIN_MARGIN_FACTOR);
        assert_eq!(zone.margin_m(0.8), 480.0);
        // download zone = 600 + 2 * 480 => radius 780
        assert_eq!(zone.fetch_radius_m(0.8), 780.0);
    }
}
