//! End-to-end tests of the map pipeline with in-memory data sources.

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use map_common::{Coord, Crs, Feature, MapError, Rgb};
use map_generator::{reclassify_dir, MapConfig, MapPipeline, PipelineStage, ProgressFn};
use osm_source::{FeatureQuery, FeatureSet, FeatureSource, SourceError};
use projection::{ProjectionService, UtmProjector};
use renderer::png::read_png;
use renderer::style::palette;
use renderer::VegetationClassifier;
use test_utils::{
    list_entries, list_file_names, motorway, temp_test_dir, temp_test_dir_with_prefix,
    water_enclosing_grass, BRITTANY,
};

// ============================================================================
// Test sources
// ============================================================================

/// Returns a fixed feature set, recording the query it was given.
struct StaticSource {
    set: FeatureSet,
    queries: Arc<Mutex<Vec<FeatureQuery>>>,
}

#[async_trait]
impl FeatureSource for StaticSource {
    async fn fetch(&self, query: &FeatureQuery) -> Result<FeatureSet, SourceError> {
        self.queries.lock().unwrap().push(*query);
        Ok(self.set.clone())
    }

    fn name(&self) -> &str {
        "static"
    }
}

struct EmptySource;

#[async_trait]
impl FeatureSource for EmptySource {
    async fn fetch(&self, query: &FeatureQuery) -> Result<FeatureSet, SourceError> {
        Err(SourceError::Empty {
            lat: query.center_lat,
            lon: query.center_lon,
            radius_m: query.radius_m,
        })
    }

    fn name(&self) -> &str {
        "empty"
    }
}

struct SlowSource;

#[async_trait]
impl FeatureSource for SlowSource {
    async fn fetch(&self, _query: &FeatureQuery) -> Result<FeatureSet, SourceError> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(FeatureSet::default())
    }

    fn name(&self) -> &str {
        "slow"
    }
}

// ============================================================================
// Helper functions
// ============================================================================

/// 2x2 tiles of 50 m / 50 px around the Brittany fixture point.
fn small_config(root: &Path) -> MapConfig {
    let mut config = MapConfig {
        center_lat: BRITTANY.0,
        center_lon: BRITTANY.1,
        nb_cells: 2,
        cell_size_m: 50.0,
        cell_px: 50,
        fetch_timeout_secs: 1,
        ..Default::default()
    };
    config.output.root = root.to_path_buf();
    config
}

/// Planar CRS and projected center of the fixture point.
fn projected_center() -> (Crs, Coord) {
    let projector = UtmProjector::new();
    let crs = projector.planar_crs(BRITTANY.1, BRITTANY.0).unwrap();
    let center = projector
        .transform(
            Crs::Wgs84,
            crs,
            Coord {
                x: BRITTANY.1,
                y: BRITTANY.0,
            },
        )
        .unwrap();
    (crs, center)
}

/// A motorway crossing a lake that encloses a meadow, already in UTM.
fn lake_scene() -> FeatureSet {
    let (crs, center) = projected_center();
    FeatureSet {
        roads: vec![motorway(1, center.x, center.y + 20.0, 200.0)],
        features: water_enclosing_grass(center.x, center.y, 30.0),
        crs,
    }
}

fn static_source(set: FeatureSet) -> (StaticSource, Arc<Mutex<Vec<FeatureQuery>>>) {
    let queries = Arc::new(Mutex::new(Vec::new()));
    let source = StaticSource {
        set,
        queries: queries.clone(),
    };
    (source, queries)
}

fn recording_progress() -> (ProgressFn, Arc<Mutex<Vec<PipelineStage>>>) {
    let stages = Arc::new(Mutex::new(Vec::new()));
    let sink = stages.clone();
    let on_progress: ProgressFn = Arc::new(move |stage: PipelineStage, _message: &str| {
        sink.lock().unwrap().push(stage);
    });
    (on_progress, stages)
}

fn pixel(img: &image::RgbImage, x: u32, y: u32) -> Rgb {
    let p = img.get_pixel(x, y).0;
    Rgb(p[0], p[1], p[2])
}

// ============================================================================
// In-memory runs
// ============================================================================

#[tokio::test]
async fn test_run_produces_rasters_and_tiles() {
    let dir = temp_test_dir();
    let (source, _) = static_source(lake_scene());
    let mut pipeline =
        MapPipeline::new(small_config(dir.path()), source, UtmProjector::new()).unwrap();

    let output = pipeline.run().await.unwrap();

    assert_eq!(pipeline.stage(), PipelineStage::Done);
    assert_eq!(output.map.dimensions(), (100, 100));
    assert_eq!(output.vegetation.dimensions(), (100, 100));
    assert_eq!(output.tiles.len(), 4);
    assert_eq!(output.report.tiles, 4);
    assert_eq!(output.report.crs, "EPSG:32630");
    assert_eq!(output.report.render.skipped, 0);
    assert_eq!(output.report.vegetation.total(), 100 * 100);
}

#[tokio::test]
async fn test_water_and_motorway_painted() {
    let dir = temp_test_dir();
    let (source, _) = static_source(lake_scene());
    let mut pipeline =
        MapPipeline::new(small_config(dir.path()), source, UtmProjector::new()).unwrap();
    let output = pipeline.run().await.unwrap();

    // center of the meadow, below the motorway: water drawn over grass
    assert_eq!(pixel(&output.map, 50, 60), palette::WATER);
    // the motorway runs 20 m north of the center
    assert_eq!(pixel(&output.map, 50, 30), palette::DARK_ASPHALT);
    // outside the lake
    assert_eq!(pixel(&output.map, 2, 98), palette::BACKGROUND);

    // only the background is vegetation
    assert_eq!(pixel(&output.vegetation, 2, 98), Rgb(0, 255, 0));
    assert_eq!(pixel(&output.vegetation, 50, 60), Rgb::BLACK);
}

#[tokio::test]
async fn test_fetch_radius_covers_zone_and_margin() {
    let dir = temp_test_dir();
    let (source, queries) = static_source(lake_scene());
    let mut pipeline =
        MapPipeline::new(small_config(dir.path()), source, UtmProjector::new()).unwrap();
    pipeline.run().await.unwrap();

    let queries = queries.lock().unwrap();
    assert_eq!(queries.len(), 1);
    // half zone 50 m + 0.8 * 100 m margin
    assert!((queries[0].radius_m - 130.0).abs() < 1e-9);
    assert_eq!(queries[0].center_lat, BRITTANY.0);
}

#[tokio::test]
async fn test_tiles_pair_up_with_vegetation() {
    let dir = temp_test_dir();
    let (source, _) = static_source(lake_scene());
    let mut pipeline =
        MapPipeline::new(small_config(dir.path()), source, UtmProjector::new()).unwrap();
    let output = pipeline.run().await.unwrap();

    let classifier = VegetationClassifier::default();
    for (coord, (map_tile, veg_tile)) in &output.tiles {
        assert_eq!(map_tile.dimensions(), (50, 50));
        assert_eq!(&classifier.classify_image(map_tile), veg_tile, "tile {}", coord);
    }
}

#[tokio::test]
async fn test_progress_reports_every_stage() {
    let dir = temp_test_dir();
    let (source, _) = static_source(lake_scene());
    let (on_progress, stages) = recording_progress();
    let mut pipeline = MapPipeline::new(small_config(dir.path()), source, UtmProjector::new())
        .unwrap()
        .with_progress(on_progress);
    assert_eq!(pipeline.stage(), PipelineStage::Idle);

    pipeline.run().await.unwrap();

    assert_eq!(
        *stages.lock().unwrap(),
        vec![
            PipelineStage::Fetching,
            PipelineStage::Classifying,
            PipelineStage::Rasterizing,
            PipelineStage::Deriving,
            PipelineStage::Tiling,
            PipelineStage::Done,
        ]
    );
}

#[tokio::test]
async fn test_geographic_features_are_projected() {
    let dir = temp_test_dir();
    let (lat, lon) = BRITTANY;
    // ~90 m west-east road through the center, in degrees
    let road = Feature::new(
        1,
        map_common::Geometry::LineString(map_common::LineString::from(vec![
            (lon - 0.0006, lat),
            (lon + 0.0006, lat),
        ])),
        test_utils::tags(&[("highway", "primary")]),
    );
    let set = FeatureSet {
        roads: vec![road],
        features: vec![],
        crs: Crs::Wgs84,
    };
    let (source, _) = static_source(set);
    let mut pipeline =
        MapPipeline::new(small_config(dir.path()), source, UtmProjector::new()).unwrap();
    let output = pipeline.run().await.unwrap();

    assert_eq!(pixel(&output.map, 50, 50), palette::DARK_ASPHALT);
    assert_eq!(pixel(&output.map, 50, 10), palette::BACKGROUND);
}

// ============================================================================
// Failures
// ============================================================================

#[test]
fn test_invalid_config_rejected_before_fetch() {
    let dir = temp_test_dir();
    let config = MapConfig {
        nb_cells: 0,
        ..small_config(dir.path())
    };
    let (source, queries) = static_source(lake_scene());
    let result = MapPipeline::new(config, source, UtmProjector::new());

    assert!(matches!(result, Err(MapError::InvalidConfiguration { .. })));
    assert!(queries.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_empty_result_fails_fetch_stage() {
    let dir = temp_test_dir();
    let (on_progress, stages) = recording_progress();
    let mut pipeline = MapPipeline::new(small_config(dir.path()), EmptySource, UtmProjector::new())
        .unwrap()
        .with_progress(on_progress);

    let err = pipeline.run().await.unwrap_err();

    assert_eq!(err.stage, PipelineStage::Fetching);
    assert!(matches!(err.source, MapError::Fetch(_)));
    assert_eq!(pipeline.stage(), PipelineStage::Failed);
    assert_eq!(
        *stages.lock().unwrap(),
        vec![PipelineStage::Fetching, PipelineStage::Failed]
    );
}

#[tokio::test]
async fn test_fetch_timeout() {
    let dir = temp_test_dir();
    let mut pipeline =
        MapPipeline::new(small_config(dir.path()), SlowSource, UtmProjector::new()).unwrap();

    let err = pipeline.run().await.unwrap_err();

    assert_eq!(err.stage, PipelineStage::Fetching);
    assert!(matches!(err.source, MapError::Timeout(1)));
}

#[tokio::test]
async fn test_failed_run_publishes_nothing() {
    let dir = temp_test_dir();
    let mut pipeline =
        MapPipeline::new(small_config(dir.path()), EmptySource, UtmProjector::new()).unwrap();

    assert!(pipeline.run_and_publish().await.is_err());
    assert!(list_entries(dir.path()).is_empty());
}

// ============================================================================
// Publishing
// ============================================================================

#[tokio::test]
async fn test_publish_layout() {
    let dir = temp_test_dir();
    let (source, _) = static_source(lake_scene());
    let mut pipeline =
        MapPipeline::new(small_config(dir.path()), source, UtmProjector::new()).unwrap();

    let (report, paths) = pipeline.run_and_publish().await.unwrap();

    assert_eq!(pipeline.stage(), PipelineStage::Done);
    assert_eq!(
        list_file_names(&paths.map_dir),
        vec!["0,0.png", "0,1.png", "1,0.png", "1,1.png"]
    );
    assert_eq!(
        list_file_names(&paths.vegetation_dir),
        vec!["0,0_veg.png", "0,1_veg.png", "1,0_veg.png", "1,1_veg.png"]
    );
    assert_eq!(
        list_file_names(dir.path()),
        vec![
            "complete_map.png",
            "complete_vegetation_map.png",
            "manifest.json"
        ]
    );
    // three files plus the two tile directories, no staging leftovers
    assert_eq!(list_entries(dir.path()).len(), 5);

    let full = read_png(&paths.full_map).unwrap();
    assert_eq!(full.dimensions(), (100, 100));
    let tile = read_png(&paths.map_dir.join("1,0.png")).unwrap();
    assert_eq!(tile.get_pixel(0, 0), full.get_pixel(50, 0));

    let manifest: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&paths.manifest).unwrap()).unwrap();
    assert_eq!(manifest["tiles"], 4);
    assert_eq!(manifest["crs"], "EPSG:32630");
    assert_eq!(manifest["nb_cells"], report.nb_cells);
}

#[tokio::test]
async fn test_publish_replaces_stale_tiles() {
    let dir = temp_test_dir();
    let stale = dir.path().join("map_cells");
    std::fs::create_dir_all(&stale).unwrap();
    std::fs::write(stale.join("9,9.png"), b"old").unwrap();

    let (source, _) = static_source(lake_scene());
    let mut pipeline =
        MapPipeline::new(small_config(dir.path()), source, UtmProjector::new()).unwrap();
    pipeline.run_and_publish().await.unwrap();

    let names = list_file_names(&stale);
    assert_eq!(names.len(), 4);
    assert!(!names.contains(&"9,9.png".to_string()));
}

#[tokio::test]
async fn test_failed_publish_leaves_previous_tiles() {
    let dir = temp_test_dir();
    let published = dir.path().join("map_cells");
    std::fs::create_dir_all(&published).unwrap();
    std::fs::write(published.join("9,9.png"), b"old").unwrap();

    let mut config = small_config(dir.path());
    // manifest cannot be written, so nothing may be swapped in
    config.output.manifest = "missing_dir/manifest.json".to_string();
    let (source, _) = static_source(lake_scene());
    let mut pipeline = MapPipeline::new(config, source, UtmProjector::new()).unwrap();

    assert!(pipeline.run_and_publish().await.is_err());
    assert_eq!(pipeline.stage(), PipelineStage::Failed);
    assert_eq!(list_file_names(&published), vec!["9,9.png"]);
    assert!(!dir.path().join("map_vegetation").exists());
    assert!(!dir.path().join("complete_map.png").exists());
    assert_eq!(list_entries(dir.path()).len(), 1);
}

// ============================================================================
// Standalone vegetation pass
// ============================================================================

#[tokio::test]
async fn test_reclassify_published_tiles() {
    let dir = temp_test_dir();
    let (source, _) = static_source(lake_scene());
    let mut pipeline =
        MapPipeline::new(small_config(dir.path()), source, UtmProjector::new()).unwrap();
    let (_, paths) = pipeline.run_and_publish().await.unwrap();

    let out = dir.path().join("reclassified");
    let summary =
        reclassify_dir(&paths.map_dir, &out, &VegetationClassifier::default()).unwrap();

    assert_eq!(summary.written.len(), 4);
    assert_eq!(summary.counts.total(), 100 * 100);
    for name in list_file_names(&out) {
        let ours = read_png(&out.join(&name)).unwrap();
        let published = read_png(&paths.vegetation_dir.join(&name)).unwrap();
        assert_eq!(ours, published, "{}", name);
    }
}

#[test]
fn test_reclassify_skips_vegetation_outputs() {
    let dir = temp_test_dir_with_prefix("vegetation_pass_");
    let input = dir.path().join("tiles");
    std::fs::create_dir_all(&input).unwrap();
    let tile = test_utils::solid_image(4, 4, palette::DARK_GRASS);
    renderer::png::write_png(&input.join("0,0.png"), &tile).unwrap();
    renderer::png::write_png(&input.join("0,0_veg.png"), &tile).unwrap();
    std::fs::write(input.join("notes.txt"), b"not a tile").unwrap();

    let out = dir.path().join("out");
    let summary = reclassify_dir(&input, &out, &VegetationClassifier::default()).unwrap();

    assert_eq!(summary.written, vec![out.join("0,0_veg.png")]);
    let veg = read_png(&out.join("0,0_veg.png")).unwrap();
    assert!(veg.pixels().all(|p| p.0 == [127, 0, 0]));
}
