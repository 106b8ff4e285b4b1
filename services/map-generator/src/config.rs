//! Map generator configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use map_common::{MapError, RenderZone, TileGrid};
use osm_source::overpass::DEFAULT_OVERPASS_URL;
use osm_source::OverpassConfig;
use renderer::vegetation::{
    default_classes, VegetationClass, VegetationClassifier, DEFAULT_REJECTION_THRESHOLD,
};
use renderer::StrokeScale;
use serde::{Deserialize, Serialize};

/// Top-level configuration of one map generation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    /// Center of the map, WGS84 degrees
    pub center_lat: f64,
    pub center_lon: f64,

    /// Tiles per side
    pub nb_cells: u32,

    /// Ground edge of one tile, in meters
    pub cell_size_m: f64,

    /// Pixel edge of one tile
    pub cell_px: u32,

    /// Road emphasis multiplier (100 keeps the ground width)
    pub road_width_scale: f64,

    /// Extra ground fetched around the zone, as a fraction of its edge
    pub margin_factor: f64,

    /// Upper bound on the fetch stage, in seconds
    pub fetch_timeout_secs: u64,

    pub overpass_url: String,

    pub output: OutputConfig,

    pub vegetation: VegetationConfig,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            center_lat: 47.80328791813283,
            center_lon: -3.7209986709586205,
            nb_cells: 2,
            cell_size_m: 300.0,
            cell_px: 300,
            road_width_scale: 100.0,
            margin_factor: 0.8,
            fetch_timeout_secs: 180,
            overpass_url: DEFAULT_OVERPASS_URL.to_string(),
            output: OutputConfig::default(),
            vegetation: VegetationConfig::default(),
        }
    }
}

/// Where and under which names artifacts are written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub root: PathBuf,
    pub map_dir: String,
    pub vegetation_dir: String,
    pub full_map: String,
    pub full_vegetation: String,
    pub manifest: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            map_dir: "map_cells".to_string(),
            vegetation_dir: "map_vegetation".to_string(),
            full_map: "complete_map.png".to_string(),
            full_vegetation: "complete_vegetation_map.png".to_string(),
            manifest: "manifest.json".to_string(),
        }
    }
}

/// Vegetation classifier settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VegetationConfig {
    /// Maximum RGB distance still assigned to a class
    pub rejection_threshold: f32,
    pub classes: Vec<VegetationClass>,
}

impl Default for VegetationConfig {
    fn default() -> Self {
        Self {
            rejection_threshold: DEFAULT_REJECTION_THRESHOLD,
            classes: default_classes(),
        }
    }
}

impl VegetationConfig {
    pub fn classifier(&self) -> Result<VegetationClassifier, MapError> {
        VegetationClassifier::with_classes(self.classes.clone(), self.rejection_threshold)
    }
}

impl MapConfig {
    /// Parse a YAML document. Missing keys take their defaults.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, MapError> {
        serde_yaml::from_str(yaml).map_err(|e| MapError::invalid_config("config", e.to_string()))
    }

    /// Load a YAML configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, MapError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| MapError::Io(format!("{}: {}", path.display(), e)))?;
        Self::from_yaml_str(&content)
    }

    /// Reject configurations that cannot produce a map.
    pub fn validate(&self) -> Result<(), MapError> {
        if !(self.center_lat.is_finite() && (-90.0..=90.0).contains(&self.center_lat)) {
            return Err(MapError::invalid_config(
                "center_lat",
                format!("must be within [-90, 90], got {}", self.center_lat),
            ));
        }
        if !(self.center_lon.is_finite() && (-180.0..=180.0).contains(&self.center_lon)) {
            return Err(MapError::invalid_config(
                "center_lon",
                format!("must be within [-180, 180], got {}", self.center_lon),
            ));
        }
        if self.nb_cells < 1 {
            return Err(MapError::invalid_config("nb_cells", "must be >= 1"));
        }
        if self.cell_px < 1 {
            return Err(MapError::invalid_config("cell_px", "must be >= 1"));
        }
        if !(self.cell_size_m.is_finite() && self.cell_size_m > 0.0) {
            return Err(MapError::invalid_config(
                "cell_size_m",
                format!("must be > 0, got {}", self.cell_size_m),
            ));
        }
        if !(self.road_width_scale.is_finite() && self.road_width_scale > 0.0) {
            return Err(MapError::invalid_config(
                "road_width_scale",
                format!("must be > 0, got {}", self.road_width_scale),
            ));
        }
        if !(self.margin_factor.is_finite() && self.margin_factor >= 0.0) {
            return Err(MapError::invalid_config(
                "margin_factor",
                format!("must be >= 0, got {}", self.margin_factor),
            ));
        }
        if self.fetch_timeout_secs == 0 {
            return Err(MapError::invalid_config("fetch_timeout_secs", "must be > 0"));
        }
        self.raster_px()?;
        self.vegetation.classifier()?;
        Ok(())
    }

    pub fn grid(&self) -> TileGrid {
        TileGrid::new(self.cell_px, self.nb_cells)
    }

    /// Edge of the full raster in pixels.
    pub fn raster_px(&self) -> Result<u32, MapError> {
        self.cell_px
            .checked_mul(self.nb_cells)
            .ok_or_else(|| MapError::invalid_config("cell_px", "cell_px * nb_cells overflows"))
    }

    /// Ground edge of the whole grid, in meters.
    pub fn total_zone_m(&self) -> f64 {
        self.cell_size_m * self.nb_cells as f64
    }

    pub fn meters_per_pixel(&self) -> f64 {
        self.cell_size_m / self.cell_px as f64
    }

    /// Render zone around a planar center.
    pub fn render_zone(&self, center_x: f64, center_y: f64) -> RenderZone {
        RenderZone::square(center_x, center_y, self.cell_size_m, self.nb_cells)
    }

    pub fn stroke_scale(&self) -> StrokeScale {
        StrokeScale {
            meters_per_pixel: self.meters_per_pixel(),
            road_width_scale: self.road_width_scale,
        }
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    /// Overpass client settings; the HTTP timeout matches the fetch timeout.
    pub fn overpass_config(&self, save_raw: Option<PathBuf>) -> OverpassConfig {
        OverpassConfig {
            url: self.overpass_url.clone(),
            request_timeout: self.fetch_timeout(),
            query_timeout_secs: self.fetch_timeout_secs,
            save_raw,
        }
    }
}
