use map_common::MapError;
use thiserror::Error;

/// Failures while fetching or decoding vector data.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Overpass returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid Overpass document: {0}")]
    Decode(String),

    #[error("No features found within {radius_m} m of ({lat}, {lon})")]
    Empty { lat: f64, lon: f64, radius_m: f64 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for SourceError {
    fn from(err: serde_json::Error) -> Self {
        SourceError::Decode(err.to_string())
    }
}

impl From<SourceError> for MapError {
    fn from(err: SourceError) -> Self {
        MapError::Fetch(err.to_string())
    }
}
