//! Tests for the style rules.
//!
//! Road classification, area classification precedence and the ground to
//! pixel stroke conversion.

use map_common::Rgb;
use renderer::style::{
    classify_area, classify_road, palette, road_stroke_px, water_line_width_px,
    DEFAULT_ROAD_PRIORITY, DEFAULT_ROAD_WIDTH_M, MIN_STROKE_PX,
};

// ============================================================================
// Road classification
// ============================================================================

#[test]
fn test_major_roads_dark_asphalt() {
    for class in ["motorway", "primary", "trunk"] {
        assert_eq!(classify_road(Some(class), None).color, palette::DARK_ASPHALT);
    }
}

#[test]
fn test_minor_roads_medium_asphalt() {
    for class in ["secondary", "tertiary", "residential", "service", "unclassified"] {
        assert_eq!(
            classify_road(Some(class), None).color,
            palette::MEDIUM_ASPHALT,
            "{}",
            class
        );
    }
}

#[test]
fn test_path_family_depends_on_surface() {
    for class in ["path", "track", "bridleway", "cycleway", "footway"] {
        assert_eq!(classify_road(Some(class), Some("sand")).color, palette::SAND);
        assert_eq!(
            classify_road(Some(class), Some("gravel")).color,
            palette::GRAVEL_DIRT
        );
        assert_eq!(
            classify_road(Some(class), Some("earth")).color,
            palette::GRAVEL_DIRT
        );
        assert_eq!(classify_road(Some(class), Some("dirt")).color, palette::GRAVEL_DIRT);
        assert_eq!(classify_road(Some(class), Some("paved")).color, palette::DIRT);
        assert_eq!(classify_road(Some(class), None).color, palette::DIRT);
    }
}

#[test]
fn test_road_widths() {
    let cases = [
        ("motorway", 20.0),
        ("primary", 15.0),
        ("trunk", 15.0),
        ("secondary", 10.0),
        ("tertiary", 8.0),
        ("residential", 7.0),
        ("service", 7.0),
        ("unclassified", 7.0),
        ("footway", 2.0),
        ("raceway", DEFAULT_ROAD_WIDTH_M),
    ];
    for (class, width) in cases {
        assert_eq!(classify_road(Some(class), None).width_m, width, "{}", class);
    }
}

#[test]
fn test_road_priorities_strictly_ordered() {
    let ordered = [
        "path",
        "track",
        "footway",
        "cycleway",
        "bridleway",
        "service",
        "unclassified",
        "residential",
        "tertiary",
        "secondary",
        "primary",
        "trunk",
        "motorway",
    ];
    let priorities: Vec<u8> = ordered
        .iter()
        .map(|c| classify_road(Some(*c), None).priority)
        .collect();
    assert_eq!(priorities, (1..=13).collect::<Vec<u8>>());
}

#[test]
fn test_unknown_road_defaults() {
    for highway in [None, Some(""), Some("proposed"), Some("construction")] {
        let style = classify_road(highway, Some("asphalt"));
        assert_eq!(style.color, palette::MEDIUM_ASPHALT);
        assert_eq!(style.width_m, DEFAULT_ROAD_WIDTH_M);
        assert_eq!(style.priority, DEFAULT_ROAD_PRIORITY);
    }
}

#[test]
fn test_road_tags_are_normalized() {
    assert_eq!(classify_road(Some(" Motorway "), None), classify_road(Some("motorway"), None));
    assert_eq!(classify_road(Some("track"), Some("SAND")).color, palette::SAND);
}

#[test]
fn test_identical_tags_identical_style() {
    let a = classify_road(Some("tertiary"), Some("asphalt"));
    let b = classify_road(Some("tertiary"), Some("asphalt"));
    assert_eq!(a, b);
}

// ============================================================================
// Area classification
// ============================================================================

#[test]
fn test_natural_classes() {
    let cases: [(&str, Rgb); 8] = [
        ("wood", palette::DARK_GRASS),
        ("tree_row", palette::DARK_GRASS),
        ("grassland", palette::LIGHT_GRASS),
        ("heath", palette::LIGHT_GRASS),
        ("tundra", palette::MEDIUM_GRASS),
        ("beach", palette::SAND),
        ("wetland", palette::WATER),
        ("bay", palette::WATER),
    ];
    for (value, color) in cases {
        assert_eq!(classify_area(Some(value), None), Some(color), "{}", value);
    }
}

#[test]
fn test_landuse_classes() {
    assert_eq!(classify_area(None, Some("forest")), Some(palette::DARK_GRASS));
    assert_eq!(classify_area(None, Some("farmland")), Some(palette::LIGHT_GRASS));
    assert_eq!(
        classify_area(None, Some("recreation_ground")),
        Some(palette::LIGHT_GRASS)
    );
}

#[test]
fn test_unknown_area_is_no_fill() {
    assert_eq!(classify_area(None, None), None);
    assert_eq!(classify_area(Some("peak"), Some("industrial")), None);
    assert_eq!(classify_area(Some(""), Some("")), None);
}

#[test]
fn test_water_overrides_vegetation_and_sand() {
    assert_eq!(classify_area(Some("water"), Some("forest")), Some(palette::WATER));
    assert_eq!(classify_area(Some("wood"), Some("reservoir")), Some(palette::WATER));
    assert_eq!(classify_area(Some("beach"), Some("reservoir")), Some(palette::WATER));
    assert_eq!(classify_area(Some("coastline"), Some("meadow")), Some(palette::WATER));
}

// ============================================================================
// Stroke widths
// ============================================================================

#[test]
fn test_road_stroke_px_formula() {
    // 20 m at 1 m/px, scale 100 => 20 px
    assert!((road_stroke_px(20.0, 1.0, 100.0) - 20.0).abs() < 1e-4);
    // 20 m at 2 m/px, scale 50 => 5 px
    assert!((road_stroke_px(20.0, 2.0, 50.0) - 5.0).abs() < 1e-4);
}

#[test]
fn test_road_stroke_px_floor() {
    assert_eq!(road_stroke_px(2.0, 100.0, 1.0), MIN_STROKE_PX);
    assert_eq!(road_stroke_px(0.0, 1.0, 100.0), MIN_STROKE_PX);
}

#[test]
fn test_water_line_widths() {
    assert_eq!(water_line_width_px("coastline"), Some(4.0));
    assert_eq!(water_line_width_px("river"), Some(3.0));
    assert_eq!(water_line_width_px("canal"), Some(3.0));
    assert_eq!(water_line_width_px("stream"), Some(2.0));
    assert_eq!(water_line_width_px("ditch"), Some(2.0));
    assert_eq!(water_line_width_px("weir"), None);
}
