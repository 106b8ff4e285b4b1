//! Common types shared across the map generation crates.

pub mod color;
pub mod crs;
pub mod error;
pub mod feature;
pub mod geometry;
pub mod tile;
pub mod zone;

pub use color::Rgb;
pub use crs::Crs;
pub use error::{MapError, MapResult};
pub use feature::{Feature, TagValue, Tags};
pub use geometry::{
    is_ring, BoundingRect, Contains, Coord, CoordsIter, Geometry, GeometryKind, LineString,
    MapCoords, MultiLineString, MultiPolygon, Polygon, Rect,
};
pub use tile::{TileCoord, TileGrid};
pub use zone::RenderZone;
