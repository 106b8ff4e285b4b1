//! Data source contract.

use async_trait::async_trait;
use map_common::{Crs, Feature};
use serde::{Deserialize, Serialize};

use crate::SourceError;

/// Area of interest for a fetch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureQuery {
    pub center_lat: f64,
    pub center_lon: f64,
    /// Search radius around the center, in meters
    pub radius_m: f64,
}

impl FeatureQuery {
    pub fn new(center_lat: f64, center_lon: f64, radius_m: f64) -> Self {
        Self {
            center_lat,
            center_lon,
            radius_m,
        }
    }
}

/// Result of one fetch: the road network plus every other tagged feature.
#[derive(Debug, Clone, Default)]
pub struct FeatureSet {
    /// Road centerlines (`highway=*` ways), in fetch order
    pub roads: Vec<Feature>,
    /// Land cover, water and other tagged features, in fetch order
    pub features: Vec<Feature>,
    /// CRS of every coordinate in the set
    pub crs: Crs,
}

impl FeatureSet {
    pub fn len(&self) -> usize {
        self.roads.len() + self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roads.is_empty() && self.features.is_empty()
    }
}

/// A provider of vector features around a point.
#[async_trait]
pub trait FeatureSource: Send + Sync {
    /// Fetch roads and features within the query radius.
    ///
    /// Returns [`SourceError::Empty`] when nothing was found.
    async fn fetch(&self, query: &FeatureQuery) -> Result<FeatureSet, SourceError>;

    /// Short name used in logs.
    fn name(&self) -> &str;
}
