//! Style rules: tag values to paint colors, stroke widths and draw priority.
//!
//! Every function here is pure. Tag values are compared trimmed and
//! lowercased; unrecognized values fall back to documented defaults rather
//! than erroring.

use map_common::Rgb;
use serde::{Deserialize, Serialize};

/// Fixed paint palette (0-255 RGB).
pub mod palette {
    use map_common::Rgb;

    pub const DARK_GRASS: Rgb = Rgb::new(90, 100, 35);
    pub const MEDIUM_GRASS: Rgb = Rgb::new(117, 117, 47);
    pub const LIGHT_GRASS: Rgb = Rgb::new(145, 135, 60);
    pub const SAND: Rgb = Rgb::new(210, 200, 160);
    pub const WATER: Rgb = Rgb::new(0, 138, 255);
    pub const DARK_ASPHALT: Rgb = Rgb::new(100, 100, 100);
    pub const MEDIUM_ASPHALT: Rgb = Rgb::new(120, 120, 120);
    pub const LIGHT_ASPHALT: Rgb = Rgb::new(165, 160, 140);
    pub const GRAVEL_DIRT: Rgb = Rgb::new(140, 70, 15);
    pub const DIRT: Rgb = Rgb::new(120, 70, 20);

    /// Ground cover painted under everything else.
    pub const BACKGROUND: Rgb = LIGHT_GRASS;

    /// Every color the rasterizer can emit.
    pub const ALL: [Rgb; 10] = [
        DARK_GRASS,
        MEDIUM_GRASS,
        LIGHT_GRASS,
        SAND,
        WATER,
        DARK_ASPHALT,
        MEDIUM_ASPHALT,
        LIGHT_ASPHALT,
        GRAVEL_DIRT,
        DIRT,
    ];
}

use palette::*;

/// Road width in ground meters for highway classes not listed below.
pub const DEFAULT_ROAD_WIDTH_M: f64 = 8.0;

/// Draw priority for highway classes not listed below.
pub const DEFAULT_ROAD_PRIORITY: u8 = 5;

/// Thinnest stroke ever emitted, in pixels.
pub const MIN_STROKE_PX: f32 = 0.1;

const PATH_FAMILY: &[&str] = &["path", "track", "bridleway", "cycleway", "footway"];

/// Values that make an area water regardless of any other tag.
pub const WATER_AREA_VALUES: &[&str] = &["water", "wetland", "bay", "coastline", "reservoir"];

/// Values selecting the water polygon layer (natural, waterway or landuse).
pub const WATER_POLYGON_VALUES: &[&str] = &["water", "wetland", "bay", "reservoir"];

/// Values selecting the sand polygon layer (natural or landuse).
pub const SAND_VALUES: &[&str] = &["sand", "beach"];

/// Values selecting the water line layer (natural or waterway).
pub const WATER_LINE_VALUES: &[&str] = &["coastline", "river", "stream", "canal", "ditch"];

/// Style of one road centerline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoadStyle {
    pub color: Rgb,
    /// Road width on the ground, in meters
    pub width_m: f64,
    /// Ascending: drawn first, overdrawn by higher priorities
    pub priority: u8,
}

fn normalize(value: Option<&str>) -> Option<String> {
    value
        .map(|v| v.trim().to_lowercase())
        .filter(|v| !v.is_empty())
}

/// Classify a road by its `highway` and `surface` tags.
///
/// Missing or unknown highway classes get medium asphalt, 8 m and
/// priority 5.
pub fn classify_road(highway: Option<&str>, surface: Option<&str>) -> RoadStyle {
    let highway = normalize(highway);
    let surface = normalize(surface);
    let class = highway.as_deref().unwrap_or("");

    RoadStyle {
        color: road_color(class, surface.as_deref()),
        width_m: road_width_m(class),
        priority: road_priority(class),
    }
}

fn road_color(highway: &str, surface: Option<&str>) -> Rgb {
    match highway {
        "motorway" | "primary" | "trunk" => DARK_ASPHALT,
        "secondary" | "tertiary" => MEDIUM_ASPHALT,
        "residential" | "service" | "unclassified" => MEDIUM_ASPHALT,
        h if PATH_FAMILY.contains(&h) => match surface {
            Some("sand") => SAND,
            Some("gravel") | Some("dirt") | Some("earth") => GRAVEL_DIRT,
            _ => DIRT,
        },
        _ => MEDIUM_ASPHALT,
    }
}

fn road_width_m(highway: &str) -> f64 {
    match highway {
        "motorway" => 20.0,
        "primary" | "trunk" => 15.0,
        "secondary" => 10.0,
        "tertiary" => 8.0,
        "residential" | "service" | "unclassified" => 7.0,
        h if PATH_FAMILY.contains(&h) => 2.0,
        _ => DEFAULT_ROAD_WIDTH_M,
    }
}

fn road_priority(highway: &str) -> u8 {
    match highway {
        "path" => 1,
        "track" => 2,
        "footway" => 3,
        "cycleway" => 4,
        "bridleway" => 5,
        "service" => 6,
        "unclassified" => 7,
        "residential" => 8,
        "tertiary" => 9,
        "secondary" => 10,
        "primary" => 11,
        "trunk" => 12,
        "motorway" => 13,
        _ => DEFAULT_ROAD_PRIORITY,
    }
}

/// Convert a ground width to a stroke width in pixels.
///
/// `scale_factor` is the user emphasis multiplier (100 keeps the ground
/// width). Widths under one pixel are kept as computed; the canvas paints
/// them as hairlines.
pub fn road_stroke_px(width_m: f64, meters_per_pixel: f64, scale_factor: f64) -> f32 {
    let px = width_m / meters_per_pixel * scale_factor * 0.01;
    (px as f32).max(MIN_STROKE_PX)
}

/// Classify an area by its `natural` and `landuse` tags.
///
/// Water on either key wins over everything else. Otherwise `natural` is
/// consulted before `landuse`. Unknown values yield `None` (nothing to
/// draw).
pub fn classify_area(natural: Option<&str>, landuse: Option<&str>) -> Option<Rgb> {
    let natural = normalize(natural);
    let landuse = normalize(landuse);

    let is_water =
        |v: &Option<String>| v.as_deref().map(|v| WATER_AREA_VALUES.contains(&v)).unwrap_or(false);
    if is_water(&natural) || is_water(&landuse) {
        return Some(WATER);
    }

    natural
        .as_deref()
        .and_then(natural_color)
        .or_else(|| landuse.as_deref().and_then(landuse_color))
}

fn natural_color(value: &str) -> Option<Rgb> {
    match value {
        "tree" | "wood" | "shrubbery" | "tree_row" | "forest" => Some(DARK_GRASS),
        "grassland" | "heath" | "scrub" | "meadow" => Some(LIGHT_GRASS),
        "fell" | "tundra" => Some(MEDIUM_GRASS),
        "sand" | "beach" => Some(SAND),
        v if WATER_AREA_VALUES.contains(&v) => Some(WATER),
        _ => None,
    }
}

fn landuse_color(value: &str) -> Option<Rgb> {
    match value {
        "forest" | "wood" => Some(DARK_GRASS),
        "grass" | "meadow" | "farmland" | "recreation_ground" => Some(LIGHT_GRASS),
        _ => None,
    }
}

/// Stroke width in pixels for a water line class, if it is one.
pub fn water_line_width_px(value: &str) -> Option<f32> {
    match value.trim().to_lowercase().as_str() {
        "coastline" => Some(4.0),
        "river" | "canal" => Some(3.0),
        v if WATER_LINE_VALUES.contains(&v) => Some(2.0),
        _ => None,
    }
}
