//! Vector geometry in ground coordinates.
//!
//! The geometry model is `geo`'s. Coordinates are `(x, y)` pairs:
//! longitude/latitude in degrees before projection, easting/northing in
//! meters afterwards.

pub use geo::{
    BoundingRect, Contains, Coord, CoordsIter, Geometry, LineString, MapCoords,
    MultiLineString, MultiPolygon, Polygon, Rect,
};

/// How a feature's geometry is styled.
pub trait GeometryKind {
    /// Polygon or MultiPolygon: eligible for area fill rules.
    fn is_area(&self) -> bool;

    /// LineString or MultiLineString: eligible for stroke rules.
    fn is_line(&self) -> bool;

    fn kind_name(&self) -> &'static str;
}

impl GeometryKind for Geometry {
    fn is_area(&self) -> bool {
        matches!(self, Geometry::Polygon(_) | Geometry::MultiPolygon(_))
    }

    fn is_line(&self) -> bool {
        matches!(self, Geometry::LineString(_) | Geometry::MultiLineString(_))
    }

    fn kind_name(&self) -> &'static str {
        match self {
            Geometry::Point(_) => "Point",
            Geometry::Line(_) => "Line",
            Geometry::LineString(_) => "LineString",
            Geometry::Polygon(_) => "Polygon",
            Geometry::MultiPoint(_) => "MultiPoint",
            Geometry::MultiLineString(_) => "MultiLineString",
            Geometry::MultiPolygon(_) => "MultiPolygon",
            Geometry::GeometryCollection(_) => "GeometryCollection",
            Geometry::Rect(_) => "Rect",
            Geometry::Triangle(_) => "Triangle",
        }
    }
}

/// Closed and long enough to bound an area.
///
/// `LineString::is_closed` also holds for an empty line, which is never a ring.
pub fn is_ring(line: &LineString) -> bool {
    line.0.len() >= 4 && line.is_closed()
}
