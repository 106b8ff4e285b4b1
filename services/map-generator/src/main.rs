//! Map generator CLI.
//!
//! `generate` runs the whole pipeline around a point and writes the full
//! rasters, both tile grids and a manifest. `vegetation` reclassifies an
//! existing directory of map tiles.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use map_generator::{reclassify_dir, MapConfig, MapPipeline, PipelineStage, ProgressFn};
use osm_source::{FeatureSource, FileSource, OverpassSource};
use projection::UtmProjector;

#[derive(Parser, Debug)]
#[command(name = "map-generator")]
#[command(about = "Styled map and vegetation tiles from OpenStreetMap data")]
struct Cli {
    /// Log level
    #[arg(long, global = true, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Fetch, render, classify and tile a map
    Generate(GenerateArgs),

    /// Derive vegetation tiles from existing map tiles
    Vegetation {
        /// Directory of map tiles
        #[arg(short, long)]
        input: PathBuf,

        /// Directory for the `_veg` tiles
        #[arg(short, long)]
        output: PathBuf,

        /// Rejection threshold (0-255 RGB distance)
        #[arg(long)]
        threshold: Option<f32>,

        /// Configuration file (vegetation classes and threshold)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[derive(Args, Debug)]
struct GenerateArgs {
    /// Configuration file path (YAML)
    #[arg(short, long, env = "MAP_CONFIG")]
    config: Option<PathBuf>,

    /// Center latitude (WGS84 degrees)
    #[arg(long, allow_hyphen_values = true)]
    lat: Option<f64>,

    /// Center longitude (WGS84 degrees)
    #[arg(long, allow_hyphen_values = true)]
    lon: Option<f64>,

    /// Tiles per side
    #[arg(long)]
    cells: Option<u32>,

    /// Tile edge in pixels
    #[arg(long)]
    cell_px: Option<u32>,

    /// Tile edge on the ground, in meters
    #[arg(long)]
    cell_size_m: Option<f64>,

    /// Extra ground fetched around the zone, as a fraction of its edge
    #[arg(long)]
    margin: Option<f64>,

    /// Road emphasis multiplier (100 keeps the ground width)
    #[arg(long)]
    road_width_scale: Option<f64>,

    /// Fetch timeout in seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Directory the artifacts are written to
    #[arg(short, long, env = "MAP_OUTPUT_ROOT")]
    output_root: Option<PathBuf>,

    /// Overpass interpreter URL
    #[arg(long, env = "OVERPASS_URL")]
    overpass_url: Option<String>,

    /// Read features from a saved Overpass JSON file instead of the network
    #[arg(long)]
    input_osm: Option<PathBuf>,

    /// Save the raw Overpass response to this file
    #[arg(long)]
    save_osm: Option<PathBuf>,
}

impl GenerateArgs {
    fn to_config(&self) -> Result<MapConfig> {
        let mut config = match &self.config {
            Some(path) => MapConfig::from_file(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => MapConfig::default(),
        };

        if let Some(v) = self.lat {
            config.center_lat = v;
        }
        if let Some(v) = self.lon {
            config.center_lon = v;
        }
        if let Some(v) = self.cells {
            config.nb_cells = v;
        }
        if let Some(v) = self.cell_px {
            config.cell_px = v;
        }
        if let Some(v) = self.cell_size_m {
            config.cell_size_m = v;
        }
        if let Some(v) = self.margin {
            config.margin_factor = v;
        }
        if let Some(v) = self.road_width_scale {
            config.road_width_scale = v;
        }
        if let Some(v) = self.timeout_secs {
            config.fetch_timeout_secs = v;
        }
        if let Some(v) = &self.output_root {
            config.output.root = v.clone();
        }
        if let Some(v) = &self.overpass_url {
            config.overpass_url = v.clone();
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level, cli.log_json)?;

    match cli.command {
        Commands::Generate(args) => {
            let config = args.to_config()?;
            match &args.input_osm {
                Some(path) => generate(config, FileSource::new(path)).await,
                None => {
                    let source = OverpassSource::new(config.overpass_config(args.save_osm.clone()))
                        .context("creating Overpass client")?;
                    generate(config, source).await
                }
            }
        }
        Commands::Vegetation {
            input,
            output,
            threshold,
            config,
        } => {
            let mut vegetation = match &config {
                Some(path) => {
                    MapConfig::from_file(path)
                        .with_context(|| format!("loading {}", path.display()))?
                        .vegetation
                }
                None => MapConfig::default().vegetation,
            };
            if let Some(t) = threshold {
                vegetation.rejection_threshold = t;
            }
            let classifier = vegetation.classifier()?;

            let summary = reclassify_dir(&input, &output, &classifier)
                .with_context(|| format!("classifying tiles in {}", input.display()))?;
            info!(
                files = summary.written.len(),
                rejected = summary.counts.rejected,
                "Vegetation pass complete"
            );
            Ok(())
        }
    }
}

async fn generate<S: FeatureSource>(config: MapConfig, source: S) -> Result<()> {
    info!(
        lat = config.center_lat,
        lon = config.center_lon,
        nb_cells = config.nb_cells,
        cell_px = config.cell_px,
        source = source.name(),
        "Starting map generation"
    );

    let on_progress: ProgressFn = Arc::new(|stage: PipelineStage, message: &str| {
        info!(target: "progress", stage = %stage, "{}", message);
    });
    let mut pipeline = MapPipeline::new(config, source, UtmProjector::new())
        .context("invalid configuration")?
        .with_progress(on_progress);

    let (report, paths) = pipeline.run_and_publish().await?;
    info!(
        drawn = report.render.drawn,
        skipped = report.render.skipped,
        tiles = report.tiles,
        manifest = %paths.manifest.display(),
        "Map generation complete"
    );
    Ok(())
}

fn init_tracing(log_level: &str, json: bool) -> Result<()> {
    let level = match log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_thread_ids(true);

    if json {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }
    Ok(())
}
