//! Overpass JSON decoding.
//!
//! Turns an Overpass `[out:json]` document into features:
//! - nodes only provide coordinates (`lon`, `lat`)
//! - ways become a `LineString`, or a `Polygon` when closed and not linear
//! - `type=multipolygon` relations become polygons assembled from their
//!   outer and inner member ways

use std::collections::HashMap;

use map_common::{
    is_ring, Contains, Coord, Crs, Feature, Geometry, GeometryKind, LineString, MultiPolygon,
    Polygon, TagValue, Tags,
};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::{FeatureSet, SourceError};

/// Tag keys that make a feature relevant for land cover and water styling.
pub const FEATURE_KEYS: &[&str] = &[
    "natural",
    "landuse",
    "leisure",
    "tourism",
    "amenity",
    "building",
    "waterway",
    "water",
    "landcover",
];

/// Waterway values drawn as lines even when the way is closed.
const LINEAR_WATERWAYS: &[&str] = &["river", "stream", "canal", "ditch", "drain"];

/// Top-level Overpass response.
#[derive(Debug, Clone, Deserialize)]
pub struct OverpassDocument {
    #[serde(default)]
    pub elements: Vec<OverpassElement>,
}

impl OverpassDocument {
    pub fn from_json(text: &str) -> Result<Self, SourceError> {
        Ok(serde_json::from_str(text)?)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OverpassElement {
    #[serde(rename = "type")]
    pub element_type: String,
    pub id: i64,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    #[serde(default)]
    pub nodes: Vec<i64>,
    #[serde(default)]
    pub members: Vec<OverpassMember>,
    #[serde(default)]
    pub tags: HashMap<String, String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OverpassMember {
    #[serde(rename = "type")]
    pub member_type: String,
    #[serde(rename = "ref")]
    pub reference: i64,
    #[serde(default)]
    pub role: String,
}

/// Decode a document into roads and features, preserving element order.
///
/// Elements without tags (recursed nodes and member ways) only contribute
/// geometry. Missing node references are skipped.
pub fn decode_overpass(doc: &OverpassDocument) -> FeatureSet {
    let mut nodes: HashMap<i64, Coord> = HashMap::new();
    let mut ways: HashMap<i64, &[i64]> = HashMap::new();

    for element in &doc.elements {
        match element.element_type.as_str() {
            "node" => {
                if let (Some(lat), Some(lon)) = (element.lat, element.lon) {
                    nodes.insert(element.id, Coord { x: lon, y: lat });
                }
            }
            "way" => {
                ways.insert(element.id, &element.nodes);
            }
            _ => {}
        }
    }

    let mut set = FeatureSet {
        crs: Crs::Wgs84,
        ..FeatureSet::default()
    };
    let mut skipped = 0usize;

    for element in &doc.elements {
        if element.tags.is_empty() {
            continue;
        }
        let geometry = match element.element_type.as_str() {
            "way" => way_geometry(element, &nodes),
            "relation" => relation_geometry(element, &nodes, &ways),
            _ => continue,
        };
        let Some(geometry) = geometry else {
            skipped += 1;
            continue;
        };

        let tags: Tags = element
            .tags
            .iter()
            .map(|(k, v)| (k.clone(), TagValue::parse(v)))
            .collect();
        let feature = Feature::new(element.id, geometry, tags);

        if feature.tag("highway").is_some() && feature.geometry.is_line() {
            set.roads.push(feature);
        } else if FEATURE_KEYS.iter().any(|k| feature.tag(k).is_some()) {
            set.features.push(feature);
        }
    }

    debug!(
        elements = doc.elements.len(),
        roads = set.roads.len(),
        features = set.features.len(),
        skipped = skipped,
        "Decoded Overpass document"
    );

    set
}

fn resolve(node_ids: &[i64], nodes: &HashMap<i64, Coord>) -> LineString {
    node_ids.iter().filter_map(|id| nodes.get(id).copied()).collect()
}

/// Ways that stay lines even when they form a closed loop.
fn is_linear(tags: &HashMap<String, String>) -> bool {
    let get = |k: &str| tags.get(k).map(|v| v.trim().to_lowercase());

    match get("area").as_deref() {
        Some("no") => return true,
        Some("yes") => return false,
        _ => {}
    }

    tags.contains_key("highway")
        || tags.contains_key("barrier")
        || get("natural").as_deref() == Some("coastline")
        || get("waterway")
            .map(|w| LINEAR_WATERWAYS.contains(&w.as_str()))
            .unwrap_or(false)
}

fn way_geometry(element: &OverpassElement, nodes: &HashMap<i64, Coord>) -> Option<Geometry> {
    let line = resolve(&element.nodes, nodes);
    if line.0.len() < 2 {
        return None;
    }

    if is_ring(&line) && !is_linear(&element.tags) {
        Some(Geometry::Polygon(Polygon::new(line, vec![])))
    } else {
        Some(Geometry::LineString(line))
    }
}

fn relation_geometry(
    element: &OverpassElement,
    nodes: &HashMap<i64, Coord>,
    ways: &HashMap<i64, &[i64]>,
) -> Option<Geometry> {
    if element.tags.get("type").map(String::as_str) != Some("multipolygon") {
        return None;
    }

    let mut outer_parts = Vec::new();
    let mut inner_parts = Vec::new();
    for member in element.members.iter().filter(|m| m.member_type == "way") {
        let Some(node_ids) = ways.get(&member.reference) else {
            continue;
        };
        let part = resolve(node_ids, nodes);
        if part.0.len() < 2 {
            continue;
        }
        match member.role.as_str() {
            "inner" => inner_parts.push(part),
            _ => outer_parts.push(part),
        }
    }

    let (outers, dropped_outer) = assemble_rings(outer_parts);
    let (inners, dropped_inner) = assemble_rings(inner_parts);
    if dropped_outer + dropped_inner > 0 {
        warn!(
            relation = element.id,
            dropped = dropped_outer + dropped_inner,
            "Dropped unclosed multipolygon rings"
        );
    }
    if outers.is_empty() {
        return None;
    }

    let mut polygons = attach_holes(outers, inners);
    if polygons.len() == 1 {
        polygons.pop().map(Geometry::Polygon)
    } else {
        Some(Geometry::MultiPolygon(MultiPolygon(polygons)))
    }
}

/// Build one polygon per outer ring, each inner ring becoming a hole of the
/// first outer ring that contains it. Inner rings outside every outer ring
/// are dropped.
fn attach_holes(outers: Vec<LineString>, inners: Vec<LineString>) -> Vec<Polygon> {
    let shells: Vec<Polygon> = outers
        .iter()
        .map(|ring| Polygon::new(ring.clone(), vec![]))
        .collect();
    let mut holes: Vec<Vec<LineString>> = vec![Vec::new(); shells.len()];

    for inner in inners {
        match shells
            .iter()
            .position(|shell| inner.coords().any(|c| shell.contains(c)))
        {
            Some(i) => holes[i].push(inner),
            None => debug!("Dropped inner ring outside every outer ring"),
        }
    }

    outers
        .into_iter()
        .zip(holes)
        .map(|(exterior, interiors)| Polygon::new(exterior, interiors))
        .collect()
}

/// Join way segments sharing endpoints into closed rings.
///
/// Returns the rings and the number of chains that could not be closed.
pub fn assemble_rings(mut segments: Vec<LineString>) -> (Vec<LineString>, usize) {
    let mut rings = Vec::new();
    let mut dropped = 0;

    while let Some(mut current) = segments.pop() {
        loop {
            if is_ring(&current) {
                rings.push(current);
                break;
            }

            let Some(end) = current.0.last().copied() else {
                break;
            };
            let next = segments
                .iter()
                .position(|s| s.0.first() == Some(&end) || s.0.last() == Some(&end));

            match next {
                Some(i) => {
                    let mut segment = segments.swap_remove(i);
                    if segment.0.first() != Some(&end) {
                        segment.0.reverse();
                    }
                    current.0.extend(segment.0.into_iter().skip(1));
                }
                None => {
                    dropped += 1;
                    break;
                }
            }
        }
    }

    (rings, dropped)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(points: &[(f64, f64)]) -> LineString {
        LineString::from(points.to_vec())
    }

    fn square(min: f64, max: f64) -> LineString {
        line(&[(min, min), (max, min), (max, max), (min, max), (min, min)])
    }

    #[test]
    fn test_assemble_rings_joins_reversed_segments() {
        let segments = vec![
            line(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0)]),
            // reversed orientation
            line(&[(0.0, 0.0), (0.0, 1.0), (1.0, 1.0)]),
        ];
        let (rings, dropped) = assemble_rings(segments);
        assert_eq!(dropped, 0);
        assert_eq!(rings.len(), 1);
        assert!(is_ring(&rings[0]));
        assert_eq!(rings[0].0.len(), 5);
    }

    #[test]
    fn test_assemble_rings_drops_open_chain() {
        let segments = vec![line(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0)])];
        let (rings, dropped) = assemble_rings(segments);
        assert!(rings.is_empty());
        assert_eq!(dropped, 1);
    }

    #[test]
    fn test_holes_go_to_enclosing_outer() {
        let outers = vec![square(0.0, 4.0), square(10.0, 14.0)];
        let inners = vec![square(11.0, 12.0), square(20.0, 21.0)];
        let polygons = attach_holes(outers, inners);
        assert_eq!(polygons.len(), 2);
        assert!(polygons[0].interiors().is_empty());
        assert_eq!(polygons[1].interiors(), &[square(11.0, 12.0)]);
    }

    #[test]
    fn test_linear_tags() {
        let tags = |pairs: &[(&str, &str)]| -> HashMap<String, String> {
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect()
        };
        assert!(is_linear(&tags(&[("highway", "residential")])));
        assert!(is_linear(&tags(&[("natural", "coastline")])));
        assert!(is_linear(&tags(&[("waterway", "river")])));
        assert!(is_linear(&tags(&[("landuse", "grass"), ("area", "no")])));
        assert!(!is_linear(&tags(&[("highway", "pedestrian"), ("area", "yes")])));
        assert!(!is_linear(&tags(&[("natural", "water")])));
    }
}
