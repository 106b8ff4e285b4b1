//! Live Overpass API client.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info, instrument};

use crate::decode::{decode_overpass, OverpassDocument, FEATURE_KEYS};
use crate::{FeatureQuery, FeatureSet, FeatureSource, SourceError};

pub const DEFAULT_OVERPASS_URL: &str = "https://overpass-api.de/api/interpreter";

/// Configuration for the Overpass client.
#[derive(Debug, Clone)]
pub struct OverpassConfig {
    /// Interpreter endpoint
    pub url: String,
    /// HTTP request timeout
    pub request_timeout: Duration,
    /// Server-side query timeout, in seconds
    pub query_timeout_secs: u64,
    /// Where to save the raw response, if anywhere
    pub save_raw: Option<PathBuf>,
}

impl Default for OverpassConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_OVERPASS_URL.to_string(),
            request_timeout: Duration::from_secs(180),
            query_timeout_secs: 180,
            save_raw: None,
        }
    }
}

/// Fetches roads and features from an Overpass interpreter.
pub struct OverpassSource {
    client: Client,
    config: OverpassConfig,
}

impl OverpassSource {
    pub fn new(config: OverpassConfig) -> Result<Self, SourceError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(Duration::from_secs(30))
            .user_agent(concat!("map-generator/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client, config })
    }

    async fn post_query(&self, query: String) -> Result<String, SourceError> {
        let response = self
            .client
            .post(&self.config.url)
            .form(&[("data", query)])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(SourceError::Status {
                status: status.as_u16(),
                body: body.chars().take(200).collect(),
            });
        }
        Ok(body)
    }
}

/// Overpass QL for every road plus every land cover and water feature
/// within `radius_m` of the center, recursing down to member nodes.
pub fn build_query(query: &FeatureQuery, timeout_secs: u64) -> String {
    let around = format!(
        "(around:{:.1},{:.7},{:.7})",
        query.radius_m, query.center_lat, query.center_lon
    );

    let mut clauses = format!("way[\"highway\"]{around};");
    for key in FEATURE_KEYS {
        clauses.push_str(&format!("way[\"{key}\"]{around};"));
        clauses.push_str(&format!("relation[\"{key}\"]{around};"));
    }

    format!("[out:json][timeout:{timeout_secs}];({clauses});out body;>;out skel qt;")
}

#[async_trait]
impl FeatureSource for OverpassSource {
    #[instrument(skip(self), fields(url = %self.config.url))]
    async fn fetch(&self, query: &FeatureQuery) -> Result<FeatureSet, SourceError> {
        let ql = build_query(query, self.config.query_timeout_secs);
        debug!(query = %ql, "Sending Overpass query");

        let body = self.post_query(ql).await?;

        if let Some(path) = &self.config.save_raw {
            tokio::fs::write(path, &body).await?;
            info!(path = %path.display(), bytes = body.len(), "Saved raw Overpass response");
        }

        let doc = OverpassDocument::from_json(&body)?;
        let set = decode_overpass(&doc);
        if set.is_empty() {
            return Err(SourceError::Empty {
                lat: query.center_lat,
                lon: query.center_lon,
                radius_m: query.radius_m,
            });
        }

        info!(
            roads = set.roads.len(),
            features = set.features.len(),
            "Fetched features from Overpass"
        );
        Ok(set)
    }

    fn name(&self) -> &str {
        "overpass"
    }
}
