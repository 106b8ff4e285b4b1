//! Coordinate Reference System types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Coordinate reference systems a feature set can be expressed in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Crs {
    /// WGS84 Geographic (lon/lat in degrees)
    #[default]
    Wgs84,
    /// Universal Transverse Mercator zone (meters)
    Utm { zone: u8, north: bool },
}

impl Crs {
    /// Parse an "EPSG:nnnn" code.
    ///
    /// Accepts EPSG:4326 and the WGS84 UTM ranges EPSG:32601-32660 (north)
    /// and EPSG:32701-32760 (south).
    pub fn from_epsg_string(s: &str) -> Result<Self, CrsParseError> {
        let normalized = s.trim().to_uppercase();
        let code = normalized
            .strip_prefix("EPSG:")
            .ok_or_else(|| CrsParseError::UnsupportedCrs(s.to_string()))?;
        let code: u32 = code
            .parse()
            .map_err(|_| CrsParseError::UnsupportedCrs(s.to_string()))?;

        match code {
            4326 => Ok(Crs::Wgs84),
            32601..=32660 => Ok(Crs::Utm {
                zone: (code - 32600) as u8,
                north: true,
            }),
            32701..=32760 => Ok(Crs::Utm {
                zone: (code - 32700) as u8,
                north: false,
            }),
            _ => Err(CrsParseError::UnsupportedCrs(s.to_string())),
        }
    }

    /// EPSG code for this CRS.
    pub fn epsg_code(&self) -> u32 {
        match self {
            Crs::Wgs84 => 4326,
            Crs::Utm { zone, north: true } => 32600 + *zone as u32,
            Crs::Utm { zone, north: false } => 32700 + *zone as u32,
        }
    }

    /// Check if this is a geographic (lat/lon) CRS.
    pub fn is_geographic(&self) -> bool {
        matches!(self, Crs::Wgs84)
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.epsg_code())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CrsParseError {
    #[error("Unsupported CRS: {0}")]
    UnsupportedCrs(String),
}
