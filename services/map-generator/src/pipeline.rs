//! Map generation pipeline.
//!
//! A run walks a fixed sequence of stages:
//!
//! `Idle -> Fetching -> Classifying -> Rasterizing -> Deriving -> Tiling -> Done`
//!
//! Any failure moves the pipeline to `Failed` and is reported together with
//! the stage it happened in. Nothing is retried. Rasters are handed from one
//! stage to the next in memory; files are only written when publishing.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use image::RgbImage;
use map_common::{Coord, Crs, MapError, RenderZone, TileCoord};
use osm_source::{FeatureQuery, FeatureSource};
use projection::ProjectionService;
use renderer::style::palette;
use renderer::{
    render, slice_pair, Canvas, ClassCounts, DrawList, RenderStats, VegetationClassifier,
};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error, info, instrument};

use crate::config::MapConfig;
use crate::output::{self, PublishedPaths};

/// Extra pixels painted on each side of the canvas, cropped afterwards.
pub const CANVAS_PADDING_PX: u32 = 32;

/// States of a pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PipelineStage {
    Idle,
    Fetching,
    Classifying,
    Rasterizing,
    Deriving,
    Tiling,
    Done,
    Failed,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStage::Idle => "idle",
            PipelineStage::Fetching => "fetching",
            PipelineStage::Classifying => "classifying",
            PipelineStage::Rasterizing => "rasterizing",
            PipelineStage::Deriving => "deriving",
            PipelineStage::Tiling => "tiling",
            PipelineStage::Done => "done",
            PipelineStage::Failed => "failed",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed run: the stage that failed and why.
#[derive(Debug, Error)]
#[error("Pipeline failed while {stage}: {source}")]
pub struct PipelineError {
    pub stage: PipelineStage,
    #[source]
    pub source: MapError,
}

/// Progress callback, called on every stage transition.
pub type ProgressFn = Arc<dyn Fn(PipelineStage, &str) + Send + Sync>;

/// Summary of a run, written next to the artifacts as the manifest.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub generated_at: DateTime<Utc>,
    pub center_lat: f64,
    pub center_lon: f64,
    pub crs: String,
    /// Projected center, in `crs` meters
    pub center_x: f64,
    pub center_y: f64,
    pub nb_cells: u32,
    pub cell_px: u32,
    pub cell_size_m: f64,
    pub meters_per_pixel: f64,
    pub fetch_radius_m: f64,
    pub roads_fetched: usize,
    pub features_fetched: usize,
    pub render: RenderStats,
    pub vegetation: ClassCounts,
    pub tiles: usize,
}

/// Everything a successful run produces, still in memory.
#[derive(Debug)]
pub struct MapOutput {
    pub map: RgbImage,
    pub vegetation: RgbImage,
    /// Styled and vegetation tile of each grid cell
    pub tiles: BTreeMap<TileCoord, (RgbImage, RgbImage)>,
    pub report: RunReport,
}

/// Orchestrates fetch, styling, rasterization, vegetation and tiling.
pub struct MapPipeline<S, P> {
    config: MapConfig,
    source: S,
    projector: P,
    classifier: VegetationClassifier,
    on_progress: Option<ProgressFn>,
    stage: PipelineStage,
}

impl<S: FeatureSource, P: ProjectionService> MapPipeline<S, P> {
    /// Validate `config` and build a pipeline. Nothing is fetched yet.
    pub fn new(config: MapConfig, source: S, projector: P) -> Result<Self, MapError> {
        config.validate()?;
        let classifier = config.vegetation.classifier()?;
        Ok(Self {
            config,
            source,
            projector,
            classifier,
            on_progress: None,
            stage: PipelineStage::Idle,
        })
    }

    pub fn with_progress(mut self, on_progress: ProgressFn) -> Self {
        self.on_progress = Some(on_progress);
        self
    }

    pub fn stage(&self) -> PipelineStage {
        self.stage
    }

    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    /// Run every stage and keep the results in memory.
    pub async fn run(&mut self) -> Result<MapOutput, PipelineError> {
        let output = self.execute().await?;
        self.enter(PipelineStage::Done, "map generated");
        Ok(output)
    }

    /// Run every stage, then publish the artifacts under the output root.
    ///
    /// Publishing is part of the tiling stage: a failure there leaves no
    /// tile directory from this run behind.
    pub async fn run_and_publish(
        &mut self,
    ) -> Result<(RunReport, PublishedPaths), PipelineError> {
        let output = self.execute().await?;
        let paths = match output::publish(&output, &self.config.output) {
            Ok(paths) => paths,
            Err(e) => return Err(self.fail(e)),
        };
        self.enter(
            PipelineStage::Done,
            &format!("artifacts written to {}", paths.root.display()),
        );
        Ok((output.report, paths))
    }

    async fn execute(&mut self) -> Result<MapOutput, PipelineError> {
        match self.execute_stages().await {
            Ok(output) => Ok(output),
            Err(e) => Err(self.fail(e)),
        }
    }

    #[instrument(skip(self), fields(source = self.source.name()))]
    async fn execute_stages(&mut self) -> Result<MapOutput, MapError> {
        let config = self.config.clone();
        let raster_px = config.raster_px()?;

        // === Fetching ===
        self.enter(PipelineStage::Fetching, "fetching map data");
        let crs = self
            .projector
            .planar_crs(config.center_lon, config.center_lat)?;
        let center = self.projector.transform(
            Crs::Wgs84,
            crs,
            Coord {
                x: config.center_lon,
                y: config.center_lat,
            },
        )?;
        let zone = config.render_zone(center.x, center.y);
        let radius_m = zone.fetch_radius_m(config.margin_factor);
        let query = FeatureQuery::new(config.center_lat, config.center_lon, radius_m);

        let fetched = match tokio::time::timeout(config.fetch_timeout(), self.source.fetch(&query))
            .await
        {
            Ok(result) => result?,
            Err(_) => return Err(MapError::Timeout(config.fetch_timeout_secs)),
        };
        if fetched.is_empty() {
            return Err(MapError::Fetch(format!(
                "no features within {:.0} m of ({}, {})",
                radius_m, config.center_lat, config.center_lon
            )));
        }
        let roads = self
            .projector
            .project_features(&fetched.roads, fetched.crs, crs)?
            .features;
        let features = self
            .projector
            .project_features(&fetched.features, fetched.crs, crs)?
            .features;
        info!(
            roads = roads.len(),
            features = features.len(),
            crs = %crs,
            radius_m = radius_m,
            "Fetched map data"
        );

        // === Classifying ===
        self.enter(
            PipelineStage::Classifying,
            &format!("styling {} roads and {} features", roads.len(), features.len()),
        );
        let list = DrawList::build(&roads, &features, config.stroke_scale());
        debug!(items = list.len(), "Built draw list");

        // === Rasterizing ===
        self.enter(
            PipelineStage::Rasterizing,
            &format!("painting {} items", list.len()),
        );
        let (map, render_stats) = rasterize(zone, raster_px, &list)?;

        // === Deriving ===
        self.enter(PipelineStage::Deriving, "deriving vegetation mask");
        let (vegetation, counts) = self.classifier.classify_image_counted(&map);
        debug!(rejected = counts.rejected, "Derived vegetation mask");

        // === Tiling ===
        self.enter(
            PipelineStage::Tiling,
            &format!("slicing {0}x{0} tiles", config.nb_cells),
        );
        let tiles = slice_pair(&map, &vegetation, config.cell_px, config.nb_cells)?;

        let report = RunReport {
            generated_at: Utc::now(),
            center_lat: config.center_lat,
            center_lon: config.center_lon,
            crs: crs.to_string(),
            center_x: center.x,
            center_y: center.y,
            nb_cells: config.nb_cells,
            cell_px: config.cell_px,
            cell_size_m: config.cell_size_m,
            meters_per_pixel: config.meters_per_pixel(),
            fetch_radius_m: radius_m,
            roads_fetched: roads.len(),
            features_fetched: features.len(),
            render: render_stats,
            vegetation: counts,
            tiles: tiles.len(),
        };

        Ok(MapOutput {
            map,
            vegetation,
            tiles,
            report,
        })
    }

    fn enter(&mut self, stage: PipelineStage, message: &str) {
        self.stage = stage;
        info!(stage = %stage, "{}", message);
        if let Some(on_progress) = &self.on_progress {
            on_progress(stage, message);
        }
    }

    fn fail(&mut self, source: MapError) -> PipelineError {
        let stage = self.stage;
        error!(stage = %stage, error = %source, "Pipeline failed");
        self.stage = PipelineStage::Failed;
        if let Some(on_progress) = &self.on_progress {
            on_progress(
                PipelineStage::Failed,
                &format!("{} failed: {}", stage, source),
            );
        }
        PipelineError { stage, source }
    }
}

/// Paint the draw list onto a fresh canvas covering `zone`.
fn rasterize(
    zone: RenderZone,
    raster_px: u32,
    list: &DrawList<'_>,
) -> Result<(RgbImage, RenderStats), MapError> {
    let mut canvas = Canvas::new(zone, raster_px, raster_px, CANVAS_PADDING_PX)?;
    let stats = render(&mut canvas, palette::BACKGROUND, list);
    if stats.skipped > 0 {
        info!(skipped = stats.skipped, "Some features could not be drawn");
    }
    Ok((canvas.finish()?, stats))
}
