//! Universal Transverse Mercator projection on the WGS84 ellipsoid.
//!
//! Implements the series expansion from Snyder, "Map Projections: A Working
//! Manual" (USGS PP 1395), which is accurate to well under a millimeter
//! within a zone and a few centimeters up to a few degrees outside it.
//!
//! Projection parameters:
//! - Scale factor on the central meridian: 0.9996
//! - False easting: 500 000 m
//! - False northing: 0 m (north), 10 000 000 m (south)

use std::f64::consts::PI;

use map_common::Crs;

use crate::ProjectionError;

/// WGS84 semi-major axis (meters)
const WGS84_A: f64 = 6_378_137.0;
/// WGS84 flattening
const WGS84_F: f64 = 1.0 / 298.257_223_563;
/// Scale factor along the central meridian
const K0: f64 = 0.9996;
const FALSE_EASTING: f64 = 500_000.0;
const FALSE_NORTHING_SOUTH: f64 = 10_000_000.0;

/// Southern and northern latitude limits of the UTM system.
pub const MIN_LATITUDE: f64 = -80.0;
pub const MAX_LATITUDE: f64 = 84.0;

/// A single UTM zone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UtmZone {
    /// Zone number, 1..=60
    pub zone: u8,
    /// Northern hemisphere
    pub north: bool,
    /// Central meridian in radians
    lon0: f64,
}

impl UtmZone {
    /// Create a zone by number and hemisphere.
    pub fn new(zone: u8, north: bool) -> Result<Self, ProjectionError> {
        if !(1..=60).contains(&zone) {
            return Err(ProjectionError::InvalidZone(zone));
        }
        let lon0_deg = (zone as f64 - 1.0) * 6.0 - 180.0 + 3.0;
        Ok(Self {
            zone,
            north,
            lon0: lon0_deg * PI / 180.0,
        })
    }

    /// Zone containing a geographic point.
    pub fn for_lonlat(lon_deg: f64, lat_deg: f64) -> Result<Self, ProjectionError> {
        check_latitude(lat_deg)?;
        if !lon_deg.is_finite() {
            return Err(ProjectionError::NonFinite);
        }
        let lon = normalize_lon_deg(lon_deg);
        let zone = (((lon + 180.0) / 6.0).floor() as i64 + 1).clamp(1, 60) as u8;
        Self::new(zone, lat_deg >= 0.0)
    }

    /// Zone described by a CRS, if it is a UTM CRS.
    pub fn from_crs(crs: Crs) -> Option<Self> {
        match crs {
            Crs::Utm { zone, north } => Self::new(zone, north).ok(),
            Crs::Wgs84 => None,
        }
    }

    pub fn crs(&self) -> Crs {
        Crs::Utm {
            zone: self.zone,
            north: self.north,
        }
    }

    /// Central meridian in degrees.
    pub fn central_meridian_deg(&self) -> f64 {
        self.lon0 * 180.0 / PI
    }

    /// Convert geographic coordinates (degrees) to easting/northing (meters).
    pub fn forward(&self, lon_deg: f64, lat_deg: f64) -> Result<(f64, f64), ProjectionError> {
        if !lon_deg.is_finite() || !lat_deg.is_finite() {
            return Err(ProjectionError::NonFinite);
        }
        check_latitude(lat_deg)?;

        let e2 = WGS84_F * (2.0 - WGS84_F);
        let ep2 = e2 / (1.0 - e2);

        let lat = lat_deg * PI / 180.0;
        let mut dlon = lon_deg * PI / 180.0 - self.lon0;
        // Normalize longitude difference to [-π, π]
        while dlon > PI {
            dlon -= 2.0 * PI;
        }
        while dlon < -PI {
            dlon += 2.0 * PI;
        }

        let sin_lat = lat.sin();
        let cos_lat = lat.cos();
        let tan_lat = lat.tan();

        let n = WGS84_A / (1.0 - e2 * sin_lat * sin_lat).sqrt();
        let t = tan_lat * tan_lat;
        let c = ep2 * cos_lat * cos_lat;
        let a = cos_lat * dlon;
        let m = meridian_arc(lat, e2);

        let a2 = a * a;
        let a3 = a2 * a;
        let a4 = a3 * a;
        let a5 = a4 * a;
        let a6 = a5 * a;

        let easting = K0
            * n
            * (a + (1.0 - t + c) * a3 / 6.0
                + (5.0 - 18.0 * t + t * t + 72.0 * c - 58.0 * ep2) * a5 / 120.0)
            + FALSE_EASTING;

        let mut northing = K0
            * (m + n
                * tan_lat
                * (a2 / 2.0
                    + (5.0 - t + 9.0 * c + 4.0 * c * c) * a4 / 24.0
                    + (61.0 - 58.0 * t + t * t + 600.0 * c - 330.0 * ep2) * a6 / 720.0));

        if !self.north {
            northing += FALSE_NORTHING_SOUTH;
        }

        Ok((easting, northing))
    }

    /// Convert easting/northing (meters) back to geographic coordinates (degrees).
    ///
    /// Returns (lon, lat).
    pub fn inverse(&self, easting: f64, northing: f64) -> (f64, f64) {
        let e2 = WGS84_F * (2.0 - WGS84_F);
        let ep2 = e2 / (1.0 - e2);

        let x = easting - FALSE_EASTING;
        let y = if self.north {
            northing
        } else {
            northing - FALSE_NORTHING_SOUTH
        };

        let m = y / K0;
        let mu = m / (WGS84_A * (1.0 - e2 / 4.0 - 3.0 * e2 * e2 / 64.0 - 5.0 * e2 * e2 * e2 / 256.0));

        let sqrt_1me2 = (1.0 - e2).sqrt();
        let e1 = (1.0 - sqrt_1me2) / (1.0 + sqrt_1me2);

        let phi1 = mu
            + (3.0 * e1 / 2.0 - 27.0 * e1.powi(3) / 32.0) * (2.0 * mu).sin()
            + (21.0 * e1 * e1 / 16.0 - 55.0 * e1.powi(4) / 32.0) * (4.0 * mu).sin()
            + (151.0 * e1.powi(3) / 96.0) * (6.0 * mu).sin()
            + (1097.0 * e1.powi(4) / 512.0) * (8.0 * mu).sin();

        let sin_phi1 = phi1.sin();
        let cos_phi1 = phi1.cos();
        let tan_phi1 = phi1.tan();

        let n1 = WGS84_A / (1.0 - e2 * sin_phi1 * sin_phi1).sqrt();
        let t1 = tan_phi1 * tan_phi1;
        let c1 = ep2 * cos_phi1 * cos_phi1;
        let r1 = WGS84_A * (1.0 - e2) / (1.0 - e2 * sin_phi1 * sin_phi1).powf(1.5);
        let d = x / (n1 * K0);

        let lat = phi1
            - (n1 * tan_phi1 / r1)
                * (d * d / 2.0
                    - (5.0 + 3.0 * t1 + 10.0 * c1 - 4.0 * c1 * c1 - 9.0 * ep2) * d.powi(4) / 24.0
                    + (61.0 + 90.0 * t1 + 298.0 * c1 + 45.0 * t1 * t1 - 252.0 * ep2 - 3.0 * c1 * c1)
                        * d.powi(6)
                        / 720.0);

        let lon = self.lon0
            + (d - (1.0 + 2.0 * t1 + c1) * d.powi(3) / 6.0
                + (5.0 - 2.0 * c1 + 28.0 * t1 - 3.0 * c1 * c1 + 8.0 * ep2 + 24.0 * t1 * t1)
                    * d.powi(5)
                    / 120.0)
                / cos_phi1;

        (lon * 180.0 / PI, lat * 180.0 / PI)
    }
}

/// Distance along the meridian from the equator to `lat` (radians).
fn meridian_arc(lat: f64, e2: f64) -> f64 {
    let e4 = e2 * e2;
    let e6 = e4 * e2;
    WGS84_A
        * ((1.0 - e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0) * lat
            - (3.0 * e2 / 8.0 + 3.0 * e4 / 32.0 + 45.0 * e6 / 1024.0) * (2.0 * lat).sin()
            + (15.0 * e4 / 256.0 + 45.0 * e6 / 1024.0) * (4.0 * lat).sin()
            - (35.0 * e6 / 3072.0) * (6.0 * lat).sin())
}

fn check_latitude(lat_deg: f64) -> Result<(), ProjectionError> {
    if !lat_deg.is_finite() {
        return Err(ProjectionError::NonFinite);
    }
    if !(MIN_LATITUDE..=MAX_LATITUDE).contains(&lat_deg) {
        return Err(ProjectionError::LatitudeOutOfRange(lat_deg));
    }
    Ok(())
}

fn normalize_lon_deg(lon: f64) -> f64 {
    let mut lon = (lon + 180.0) % 360.0;
    if lon < 0.0 {
        lon += 360.0;
    }
    lon - 180.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zone_selection() {
        assert_eq!(UtmZone::for_lonlat(-3.72, 47.80).unwrap().zone, 30);
        assert_eq!(UtmZone::for_lonlat(3.0, 10.0).unwrap().zone, 31);
        assert_eq!(UtmZone::for_lonlat(-180.0, 0.0).unwrap().zone, 1);
        assert_eq!(UtmZone::for_lonlat(179.9, 0.0).unwrap().zone, 60);
        assert!(!UtmZone::for_lonlat(151.2, -33.9).unwrap().north);
    }

    #[test]
    fn test_central_meridian_origin() {
        let zone = UtmZone::new(31, true).unwrap();
        assert!((zone.central_meridian_deg() - 3.0).abs() < 1e-12);

        let (e, n) = zone.forward(3.0, 0.0).unwrap();
        assert!((e - 500_000.0).abs() < 1e-6, "easting {}", e);
        assert!(n.abs() < 1e-6, "northing {}", n);
    }

    #[test]
    fn test_symmetry_about_central_meridian() {
        let zone = UtmZone::new(30, true).unwrap();
        let (e_west, n_west) = zone.forward(-4.0, 47.8).unwrap();
        let (e_east, n_east) = zone.forward(-2.0, 47.8).unwrap();
        assert!(((500_000.0 - e_west) - (e_east - 500_000.0)).abs() < 1e-6);
        assert!((n_west - n_east).abs() < 1e-6);
    }

    #[test]
    fn test_brittany_point() {
        let zone = UtmZone::for_lonlat(-3.7209986709586205, 47.80328791813283).unwrap();
        let (e, n) = zone
            .forward(-3.7209986709586205, 47.80328791813283)
            .unwrap();
        println!("easting={} northing={}", e, n);
        assert!(e > 440_000.0 && e < 450_000.0, "easting {}", e);
        assert!(n > 5_280_000.0 && n < 5_310_000.0, "northing {}", n);
    }

    #[test]
    fn test_one_degree_of_latitude() {
        let zone = UtmZone::new(31, true).unwrap();
        let (_, n0) = zone.forward(3.0, 45.0).unwrap();
        let (_, n1) = zone.forward(3.0, 46.0).unwrap();
        // ~111.1 km per degree at mid latitudes, scaled by k0
        let d = n1 - n0;
        assert!(d > 110_000.0 && d < 112_000.0, "delta {}", d);
    }

    #[test]
    fn test_roundtrip() {
        let zone = UtmZone::new(33, false).unwrap();
        let (lon, lat) = (14.7, -22.3);
        let (e, n) = zone.forward(lon, lat).unwrap();
        let (lon2, lat2) = zone.inverse(e, n);
        assert!((lon - lon2).abs() < 1e-7, "lon roundtrip failed: {} vs {}", lon, lon2);
        assert!((lat - lat2).abs() < 1e-7, "lat roundtrip failed: {} vs {}", lat, lat2);
    }

    #[test]
    fn test_latitude_limits() {
        let zone = UtmZone::new(1, true).unwrap();
        assert!(matches!(
            zone.forward(-177.0, 85.0),
            Err(ProjectionError::LatitudeOutOfRange(_))
        ));
        assert!(matches!(
            zone.forward(f64::NAN, 10.0),
            Err(ProjectionError::NonFinite)
        ));
        assert!(matches!(UtmZone::new(0, true), Err(ProjectionError::InvalidZone(0))));
    }
}
