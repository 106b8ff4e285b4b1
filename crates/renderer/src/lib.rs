//! Raster rendering for generated maps.
//!
//! Pipeline pieces, leaves first:
//! - `style`: tag values to colors, widths and draw priority
//! - `draw_list`: features grouped per compositing layer
//! - `canvas` / `rasterizer`: layered painting without anti-aliasing
//! - `vegetation`: nearest-color vegetation mask
//! - `tiler`: grid partition of full rasters
//! - `png`: PNG encoding

pub mod canvas;
pub mod draw_list;
pub mod png;
pub mod rasterizer;
pub mod style;
pub mod tiler;
pub mod vegetation;

pub use canvas::{Canvas, DrawError};
pub use draw_list::{DrawList, Layer, StrokeScale};
pub use rasterizer::{render, RenderStats};
pub use style::{classify_area, classify_road, road_stroke_px, RoadStyle};
pub use tiler::{reassemble, slice, slice_pair, TileSet};
pub use vegetation::{ClassCounts, PaletteEntry, VegetationClass, VegetationClassifier};
