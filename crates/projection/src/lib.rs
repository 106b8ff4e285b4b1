//! Coordinate reference system transformations.
//!
//! Implements the geodetic-to-planar projection used to bring fetched
//! features into a local metric CRS, from scratch without external
//! dependencies.

pub mod service;
pub mod utm;

pub use service::{ProjectedFeatures, ProjectionService, UtmProjector};
pub use utm::UtmZone;

use map_common::{Crs, MapError};

/// Errors raised while choosing a CRS or projecting coordinates.
#[derive(Debug, thiserror::Error)]
pub enum ProjectionError {
    #[error("Latitude {0} is outside the UTM band [-80, 84]")]
    LatitudeOutOfRange(f64),

    #[error("Coordinate is not finite")]
    NonFinite,

    #[error("Invalid UTM zone: {0}")]
    InvalidZone(u8),

    #[error("Unsupported transformation {from} -> {to}")]
    Unsupported { from: Crs, to: Crs },
}

impl From<ProjectionError> for MapError {
    fn from(err: ProjectionError) -> Self {
        MapError::Projection(err.to_string())
    }
}
