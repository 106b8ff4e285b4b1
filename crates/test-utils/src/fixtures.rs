//! Common feature fixtures for map generator tests.
//!
//! Coordinates are planar meters around [`CENTER`], a point in a UTM-like
//! range, so fixtures can be fed straight to the renderer.

use map_common::{Feature, Geometry, LineString, Polygon, RenderZone, TagValue, Tags};

/// Planar center used by the fixtures.
pub const CENTER: (f64, f64) = (500_000.0, 5_300_000.0);

/// Geographic point the end-to-end fixtures are anchored on.
pub const BRITTANY: (f64, f64) = (47.80328791813283, -3.7209986709586205);

/// Square zone of `nb_cells` cells of `cell_size_m` around [`CENTER`].
pub fn test_zone(cell_size_m: f64, nb_cells: u32) -> RenderZone {
    RenderZone::square(CENTER.0, CENTER.1, cell_size_m, nb_cells)
}

/// Closed square ring of half-size `half` around `(cx, cy)`.
pub fn square_ring(cx: f64, cy: f64, half: f64) -> LineString {
    LineString::from(vec![
        (cx - half, cy - half),
        (cx + half, cy - half),
        (cx + half, cy + half),
        (cx - half, cy + half),
        (cx - half, cy - half),
    ])
}

/// Build a tag map from pairs.
pub fn tags(pairs: &[(&str, &str)]) -> Tags {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), TagValue::parse(v)))
        .collect()
}

/// Square polygon feature centered on `(cx, cy)` (meters).
pub fn square_area(id: i64, cx: f64, cy: f64, half: f64, pairs: &[(&str, &str)]) -> Feature {
    Feature::new(
        id,
        Geometry::Polygon(Polygon::new(square_ring(cx, cy, half), vec![])),
        tags(pairs),
    )
}

/// Square polygon with a square hole, both centered on `(cx, cy)`.
pub fn square_with_hole(
    id: i64,
    cx: f64,
    cy: f64,
    half: f64,
    hole_half: f64,
    pairs: &[(&str, &str)],
) -> Feature {
    Feature::new(
        id,
        Geometry::Polygon(Polygon::new(
            square_ring(cx, cy, half),
            vec![square_ring(cx, cy, hole_half)],
        )),
        tags(pairs),
    )
}

/// Polyline feature through `points` (meters).
pub fn line(id: i64, points: &[(f64, f64)], pairs: &[(&str, &str)]) -> Feature {
    Feature::new(
        id,
        Geometry::LineString(LineString::from(points.to_vec())),
        tags(pairs),
    )
}

/// Road feature of the given highway class.
pub fn road(id: i64, highway: &str, points: &[(f64, f64)]) -> Feature {
    line(id, points, &[("highway", highway)])
}

/// Horizontal motorway crossing `(cx, cy)` with total length `length_m`.
pub fn motorway(id: i64, cx: f64, cy: f64, length_m: f64) -> Feature {
    let half = length_m / 2.0;
    road(id, "motorway", &[(cx - half, cy), (cx + half, cy)])
}

/// A grassland square fully enclosed by a larger water polygon, grass first
/// in fetch order.
pub fn water_enclosing_grass(cx: f64, cy: f64, half: f64) -> Vec<Feature> {
    vec![
        square_area(10, cx, cy, half / 2.0, &[("natural", "grassland")]),
        square_area(11, cx, cy, half, &[("natural", "water")]),
    ]
}
