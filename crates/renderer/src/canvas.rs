//! Pixel canvas with a ground-to-pixel transform.
//!
//! The canvas paints onto a pixmap padded by `padding` pixels on every side
//! so features straddling the render zone edge are drawn whole; the padding
//! is cropped away in [`Canvas::finish`].
//!
//! Anti-aliasing is always off: every painted pixel is exactly one palette
//! color, which the vegetation classifier relies on.

use image::RgbImage;
use map_common::{Coord, LineString, MapError, Polygon, RenderZone, Rgb};
use thiserror::Error;
use tiny_skia::{
    FillRule, LineCap, LineJoin, Paint, Path, PathBuilder, Pixmap, Stroke, Transform,
};

/// Stroke widths below this many pixels are painted as hairlines.
pub const HAIRLINE_BELOW_PX: f32 = 1.0;

/// A single geometry could not be drawn.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DrawError {
    #[error("degenerate geometry: {points} points, need {required}")]
    Degenerate { points: usize, required: usize },

    #[error("non-finite coordinate")]
    NonFinite,

    #[error("invalid stroke width {0}")]
    InvalidWidth(f32),

    #[error("{0} cannot be filled")]
    NotAnArea(&'static str),

    #[error("{0} cannot be stroked")]
    NotALine(&'static str),
}

/// Addressable pixel buffer for one rasterization pass.
pub struct Canvas {
    pixmap: Pixmap,
    zone: RenderZone,
    width: u32,
    height: u32,
    padding: u32,
    /// Ground meters per pixel along x and y
    scale_x: f64,
    scale_y: f64,
}

impl Canvas {
    /// Create a canvas mapping `zone` onto `width x height` output pixels.
    pub fn new(zone: RenderZone, width: u32, height: u32, padding: u32) -> Result<Self, MapError> {
        if width == 0 || height == 0 {
            return Err(MapError::invalid_config(
                "canvas",
                format!("canvas must be at least 1x1, got {}x{}", width, height),
            ));
        }
        if !(zone.half_width_m > 0.0 && zone.half_height_m > 0.0) {
            return Err(MapError::invalid_config(
                "canvas",
                "render zone must have a positive extent",
            ));
        }

        let pixmap = Pixmap::new(width + 2 * padding, height + 2 * padding).ok_or_else(|| {
            MapError::invalid_config(
                "canvas",
                format!("cannot allocate {}x{} pixmap", width, height),
            )
        })?;

        Ok(Self {
            pixmap,
            zone,
            width,
            height,
            padding,
            scale_x: zone.width_m() / width as f64,
            scale_y: zone.height_m() / height as f64,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn zone(&self) -> &RenderZone {
        &self.zone
    }

    /// Ground meters covered by one output pixel along x.
    pub fn meters_per_pixel(&self) -> f64 {
        self.scale_x
    }

    /// Map a ground coordinate to pixmap coordinates (y grows downwards).
    pub fn to_pixel(&self, coord: Coord) -> (f32, f32) {
        let left = self.zone.center_x - self.zone.half_width_m;
        let top = self.zone.center_y + self.zone.half_height_m;
        let x = (coord.x - left) / self.scale_x + self.padding as f64;
        let y = (top - coord.y) / self.scale_y + self.padding as f64;
        (x as f32, y as f32)
    }

    /// Fill the whole canvas, padding included.
    pub fn fill(&mut self, color: Rgb) {
        let Rgb(r, g, b) = color;
        self.pixmap.fill(tiny_skia::Color::from_rgba8(r, g, b, 255));
    }

    /// Pixel path of a polygon: the exterior ring and every hole as closed
    /// subpaths. Holes with fewer than three corners are ignored.
    pub fn polygon_path(&self, polygon: &Polygon) -> Result<Path, DrawError> {
        let points = polygon.exterior().0.len();
        // rings are closed, so a triangle takes four coordinates
        if points < 4 {
            return Err(DrawError::Degenerate {
                points,
                required: 4,
            });
        }

        let mut pb = PathBuilder::new();
        self.push_ring(&mut pb, polygon.exterior())?;
        for hole in polygon.interiors().iter().filter(|h| h.0.len() >= 4) {
            self.push_ring(&mut pb, hole)?;
        }

        pb.finish().ok_or(DrawError::Degenerate {
            points,
            required: 4,
        })
    }

    fn push_ring(&self, pb: &mut PathBuilder, ring: &LineString) -> Result<(), DrawError> {
        let mut points = ring.coords();
        let first = points.next().ok_or(DrawError::Degenerate {
            points: 0,
            required: 4,
        })?;
        let (x, y) = self.checked_pixel(*first)?;
        pb.move_to(x, y);
        for coord in points {
            let (x, y) = self.checked_pixel(*coord)?;
            pb.line_to(x, y);
        }
        pb.close();
        Ok(())
    }

    /// Pixel path of a polyline.
    pub fn line_path(&self, line: &LineString) -> Result<Path, DrawError> {
        let coords = &line.0;
        if coords.len() < 2 {
            return Err(DrawError::Degenerate {
                points: coords.len(),
                required: 2,
            });
        }

        let mut pb = PathBuilder::new();
        let (x, y) = self.checked_pixel(coords[0])?;
        pb.move_to(x, y);
        for coord in &coords[1..] {
            let (x, y) = self.checked_pixel(*coord)?;
            pb.line_to(x, y);
        }

        pb.finish().ok_or(DrawError::Degenerate {
            points: coords.len(),
            required: 2,
        })
    }

    /// Fill a path, holes left unpainted (even-odd rule).
    pub fn fill_path(&mut self, path: &Path, color: Rgb) {
        let paint = solid_paint(color);
        self.pixmap
            .fill_path(path, &paint, FillRule::EvenOdd, Transform::identity(), None);
    }

    pub fn stroke_path(&mut self, path: &Path, color: Rgb, stroke: &Stroke) {
        let paint = solid_paint(color);
        self.pixmap
            .stroke_path(path, &paint, stroke, Transform::identity(), None);
    }

    pub fn fill_polygon(&mut self, polygon: &Polygon, color: Rgb) -> Result<(), DrawError> {
        let path = self.polygon_path(polygon)?;
        self.fill_path(&path, color);
        Ok(())
    }

    /// Stroke a polyline with round caps and joins.
    pub fn stroke_line(
        &mut self,
        line: &LineString,
        color: Rgb,
        width_px: f32,
    ) -> Result<(), DrawError> {
        let stroke = line_stroke(width_px)?;
        let path = self.line_path(line)?;
        self.stroke_path(&path, color, &stroke);
        Ok(())
    }

    fn checked_pixel(&self, coord: Coord) -> Result<(f32, f32), DrawError> {
        let (x, y) = self.to_pixel(coord);
        if coord.x.is_finite() && coord.y.is_finite() && x.is_finite() && y.is_finite() {
            Ok((x, y))
        } else {
            Err(DrawError::NonFinite)
        }
    }

    /// Crop the padding away and hand the raster over.
    pub fn finish(self) -> Result<RgbImage, MapError> {
        let stride = self.pixmap.width() as usize * 4;
        let data = self.pixmap.data();
        let pad = self.padding as usize;

        let mut rgb = Vec::with_capacity(self.width as usize * self.height as usize * 3);
        for row in 0..self.height as usize {
            let start = (row + pad) * stride + pad * 4;
            let end = start + self.width as usize * 4;
            for px in data[start..end].chunks_exact(4) {
                rgb.extend_from_slice(&px[..3]);
            }
        }

        RgbImage::from_raw(self.width, self.height, rgb)
            .ok_or_else(|| MapError::Encode("cropped raster has the wrong size".to_string()))
    }
}

/// Round-capped stroke `width_px` wide.
///
/// Strokes thinner than [`HAIRLINE_BELOW_PX`] are drawn as one-pixel
/// hairlines: without anti-aliasing a thinner stroke covers no pixel center
/// and would vanish.
pub fn line_stroke(width_px: f32) -> Result<Stroke, DrawError> {
    if !(width_px.is_finite() && width_px > 0.0) {
        return Err(DrawError::InvalidWidth(width_px));
    }
    Ok(Stroke {
        width: if width_px < HAIRLINE_BELOW_PX {
            0.0
        } else {
            width_px
        },
        line_cap: LineCap::Round,
        line_join: LineJoin::Round,
        ..Stroke::default()
    })
}

fn solid_paint(color: Rgb) -> Paint<'static> {
    let Rgb(r, g, b) = color;
    let mut paint = Paint::default();
    paint.set_color_rgba8(r, g, b, 255);
    paint.anti_alias = false;
    paint
}
