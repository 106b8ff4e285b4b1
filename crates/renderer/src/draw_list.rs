//! Ordered draw list: classified features grouped by compositing layer.

use map_common::{Feature, GeometryKind, Rgb};
use serde::Serialize;
use std::fmt;

use crate::style::{
    self, palette, RoadStyle, SAND_VALUES, WATER_LINE_VALUES, WATER_POLYGON_VALUES,
};

/// Compositing layers, in drawing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Layer {
    LandCover,
    Sand,
    Water,
    WaterLines,
    Roads,
}

impl Layer {
    pub const ORDER: [Layer; 5] = [
        Layer::LandCover,
        Layer::Sand,
        Layer::Water,
        Layer::WaterLines,
        Layer::Roads,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Layer::LandCover => "land_cover",
            Layer::Sand => "sand",
            Layer::Water => "water",
            Layer::WaterLines => "water_lines",
            Layer::Roads => "roads",
        }
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A polygon feature with its fill color.
#[derive(Debug, Clone, Copy)]
pub struct AreaItem<'a> {
    pub feature: &'a Feature,
    pub color: Rgb,
}

/// A line feature with its stroke.
#[derive(Debug, Clone, Copy)]
pub struct LineItem<'a> {
    pub feature: &'a Feature,
    pub color: Rgb,
    pub width_px: f32,
}

/// A road with its resolved style.
#[derive(Debug, Clone, Copy)]
pub struct RoadItem<'a> {
    pub feature: &'a Feature,
    pub style: RoadStyle,
    pub width_px: f32,
}

/// Ground-to-pixel scale used to turn road widths into stroke widths.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeScale {
    pub meters_per_pixel: f64,
    /// User emphasis multiplier; 100 keeps the ground width
    pub road_width_scale: f64,
}

/// Features classified and grouped per layer.
///
/// Within each area and water-line layer features keep fetch order. Roads
/// are sorted by ascending priority, fetch order breaking ties.
#[derive(Debug, Default)]
pub struct DrawList<'a> {
    pub land_cover: Vec<AreaItem<'a>>,
    pub sand: Vec<AreaItem<'a>>,
    pub water: Vec<AreaItem<'a>>,
    pub water_lines: Vec<LineItem<'a>>,
    pub roads: Vec<RoadItem<'a>>,
}

impl<'a> DrawList<'a> {
    /// Classify `roads` and `features` into layers.
    ///
    /// Features matching no rule are left out.
    pub fn build(roads: &'a [Feature], features: &'a [Feature], scale: StrokeScale) -> Self {
        let mut list = DrawList::default();

        for feature in features {
            if feature.geometry.is_area() {
                if let Some(color) = land_cover_color(feature) {
                    list.land_cover.push(AreaItem { feature, color });
                }
                if is_sand_polygon(feature) {
                    list.sand.push(AreaItem {
                        feature,
                        color: palette::SAND,
                    });
                }
                if is_water_polygon(feature) {
                    list.water.push(AreaItem {
                        feature,
                        color: palette::WATER,
                    });
                }
            } else if let Some(width_px) = water_line_width(feature) {
                list.water_lines.push(LineItem {
                    feature,
                    color: palette::WATER,
                    width_px,
                });
            }
        }

        list.roads = roads
            .iter()
            .filter(|f| f.geometry.is_line())
            .map(|feature| {
                let style = style::classify_road(feature.tag("highway"), feature.tag("surface"));
                RoadItem {
                    feature,
                    style,
                    width_px: style::road_stroke_px(
                        style.width_m,
                        scale.meters_per_pixel,
                        scale.road_width_scale,
                    ),
                }
            })
            .collect();
        // stable: equal priorities keep fetch order
        list.roads.sort_by_key(|r| r.style.priority);

        list
    }

    pub fn layer_len(&self, layer: Layer) -> usize {
        match layer {
            Layer::LandCover => self.land_cover.len(),
            Layer::Sand => self.sand.len(),
            Layer::Water => self.water.len(),
            Layer::WaterLines => self.water_lines.len(),
            Layer::Roads => self.roads.len(),
        }
    }

    pub fn len(&self) -> usize {
        Layer::ORDER.iter().map(|l| self.layer_len(*l)).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Area color for the generic land cover layer (anything but water).
fn land_cover_color(feature: &Feature) -> Option<Rgb> {
    style::classify_area(feature.tag("natural"), feature.tag("landuse"))
        .filter(|c| *c != palette::WATER)
}

pub fn is_sand_polygon(feature: &Feature) -> bool {
    feature.geometry.is_area()
        && (feature.tag_in("natural", SAND_VALUES) || feature.tag_in("landuse", SAND_VALUES))
}

pub fn is_water_polygon(feature: &Feature) -> bool {
    feature.geometry.is_area()
        && ["natural", "waterway", "landuse"]
            .iter()
            .any(|key| feature.tag_in(key, WATER_POLYGON_VALUES))
}

/// Stroke width of a water line, `None` if the feature is not one.
///
/// `natural` is consulted before `waterway`.
pub fn water_line_width(feature: &Feature) -> Option<f32> {
    if !feature.geometry.is_line() {
        return None;
    }
    ["natural", "waterway"]
        .iter()
        .filter(|key| feature.tag_in(key, WATER_LINE_VALUES))
        .find_map(|key| feature.tag(key).and_then(style::water_line_width_px))
}
