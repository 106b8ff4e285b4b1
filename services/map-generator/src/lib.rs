//! OSM map and vegetation tile generator.
//!
//! Fetches roads and land cover around a point, paints them into a styled
//! raster, derives a vegetation mask from it and slices both into a grid of
//! tiles.

pub mod config;
pub mod output;
pub mod pipeline;
pub mod reclassify;

pub use config::{MapConfig, OutputConfig, VegetationConfig};
pub use output::{publish, PublishedPaths};
pub use pipeline::{
    MapOutput, MapPipeline, PipelineError, PipelineStage, ProgressFn, RunReport,
};
pub use reclassify::{reclassify_dir, ReclassifySummary};
