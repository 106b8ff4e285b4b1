//! Offline source backed by a saved Overpass JSON document.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::info;

use crate::decode::{decode_overpass, OverpassDocument};
use crate::{FeatureQuery, FeatureSet, FeatureSource, SourceError};

/// Reads features from a file written by `--save-osm` or by hand.
///
/// The query is only used for error reporting: the whole document is
/// returned regardless of its radius.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl FeatureSource for FileSource {
    async fn fetch(&self, query: &FeatureQuery) -> Result<FeatureSet, SourceError> {
        let text = tokio::fs::read_to_string(&self.path).await?;
        let doc = OverpassDocument::from_json(&text)?;
        let set = decode_overpass(&doc);
        if set.is_empty() {
            return Err(SourceError::Empty {
                lat: query.center_lat,
                lon: query.center_lon,
                radius_m: query.radius_m,
            });
        }

        info!(
            path = %self.path.display(),
            roads = set.roads.len(),
            features = set.features.len(),
            "Loaded features from file"
        );
        Ok(set)
    }

    fn name(&self) -> &str {
        "file"
    }
}
