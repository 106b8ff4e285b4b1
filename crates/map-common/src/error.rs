//! Error types for map generation.

use thiserror::Error;

/// Result type alias using MapError.
pub type MapResult<T> = Result<T, MapError>;

/// Primary error type for map generation.
#[derive(Debug, Error)]
pub enum MapError {
    // === Input Errors ===
    #[error("Failed to fetch map data: {0}")]
    Fetch(String),

    #[error("Fetch timed out after {0} seconds")]
    Timeout(u64),

    #[error("Projection error: {0}")]
    Projection(String),

    #[error("Invalid configuration for '{param}': {message}")]
    InvalidConfiguration { param: String, message: String },

    // === Raster Errors ===
    #[error(
        "Raster is {actual_w}x{actual_h} px but the tile grid needs exactly {expected_w}x{expected_h} px"
    )]
    DimensionMismatch {
        expected_w: u32,
        expected_h: u32,
        actual_w: u32,
        actual_h: u32,
    },

    #[error("Cannot draw feature {feature_id}: {message}")]
    Draw { feature_id: i64, message: String },

    #[error("Image encoding failed: {0}")]
    Encode(String),

    // === Infrastructure Errors ===
    #[error("I/O error: {0}")]
    Io(String),
}

impl MapError {
    /// Shorthand for a configuration rejection.
    pub fn invalid_config(param: &str, message: impl Into<String>) -> Self {
        MapError::InvalidConfiguration {
            param: param.to_string(),
            message: message.into(),
        }
    }

    /// Whether the error only affects a single feature and the run can continue.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, MapError::Draw { .. })
    }
}

impl From<std::io::Error> for MapError {
    fn from(err: std::io::Error) -> Self {
        MapError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for MapError {
    fn from(err: serde_json::Error) -> Self {
        MapError::Io(format!("JSON error: {}", err))
    }
}
