//! Vector data source for the map generator.
//!
//! Fetches OpenStreetMap features around a center point, either live from an
//! Overpass API endpoint or from a previously saved Overpass JSON document,
//! and decodes them into [`map_common::Feature`]s in geographic coordinates.

pub mod decode;
pub mod error;
pub mod file;
pub mod overpass;
pub mod source;

pub use decode::{decode_overpass, OverpassDocument};
pub use error::SourceError;
pub use file::FileSource;
pub use overpass::{OverpassConfig, OverpassSource};
pub use source::{FeatureQuery, FeatureSet, FeatureSource};
