//! Feature-set projection service.
//!
//! Brings fetched features (geographic coordinates) into a single planar,
//! locally Cartesian CRS in meters so ground distances can be converted to
//! pixels with a plain affine transform.

use map_common::{Coord, Crs, Feature, MapCoords};
use tracing::debug;

use crate::{ProjectionError, UtmZone};

/// Features re-expressed in one planar CRS.
#[derive(Debug, Clone)]
pub struct ProjectedFeatures {
    pub features: Vec<Feature>,
    pub crs: Crs,
}

/// Converts feature sets between coordinate reference systems.
pub trait ProjectionService: Send + Sync {
    /// Choose the planar CRS for a run centered on a geographic point.
    fn planar_crs(&self, lon: f64, lat: f64) -> Result<Crs, ProjectionError>;

    /// Transform a single coordinate.
    fn transform(&self, from: Crs, to: Crs, coord: Coord) -> Result<Coord, ProjectionError>;

    /// Transform every feature of a set into `to`.
    fn project_features(
        &self,
        features: &[Feature],
        from: Crs,
        to: Crs,
    ) -> Result<ProjectedFeatures, ProjectionError> {
        let mut projected = Vec::with_capacity(features.len());
        for feature in features {
            let geometry = feature
                .geometry
                .try_map_coords(move |c| self.transform(from, to, c))?;
            projected.push(Feature {
                id: feature.id,
                geometry,
                tags: feature.tags.clone(),
            });
        }

        debug!(count = projected.len(), from = %from, to = %to, "Projected features");

        Ok(ProjectedFeatures {
            features: projected,
            crs: to,
        })
    }
}

/// Projects geographic features into the UTM zone of the run center.
#[derive(Debug, Clone, Copy, Default)]
pub struct UtmProjector;

impl UtmProjector {
    pub fn new() -> Self {
        Self
    }
}

impl ProjectionService for UtmProjector {
    fn planar_crs(&self, lon: f64, lat: f64) -> Result<Crs, ProjectionError> {
        Ok(UtmZone::for_lonlat(lon, lat)?.crs())
    }

    fn transform(&self, from: Crs, to: Crs, coord: Coord) -> Result<Coord, ProjectionError> {
        if from == to {
            return Ok(coord);
        }

        match (from, to) {
            (Crs::Wgs84, Crs::Utm { .. }) => {
                let zone = UtmZone::from_crs(to).ok_or(ProjectionError::Unsupported { from, to })?;
                let (x, y) = zone.forward(coord.x, coord.y)?;
                Ok(Coord { x, y })
            }
            (Crs::Utm { .. }, Crs::Wgs84) => {
                let zone =
                    UtmZone::from_crs(from).ok_or(ProjectionError::Unsupported { from, to })?;
                let (lon, lat) = zone.inverse(coord.x, coord.y);
                Ok(Coord { x: lon, y: lat })
            }
            (Crs::Utm { .. }, Crs::Utm { .. }) => {
                let geographic = self.transform(from, Crs::Wgs84, coord)?;
                self.transform(Crs::Wgs84, to, geographic)
            }
            _ => Err(ProjectionError::Unsupported { from, to }),
        }
    }
}
