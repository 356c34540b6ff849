use crate::geo::EPS_DEG;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A geographic point in degrees, WGS84, longitude first.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lon: f64,
    pub lat: f64,
}

impl GeoPoint {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// Returns true if both coordinates are finite numbers.
    pub fn is_finite(&self) -> bool {
        self.lon.is_finite() && self.lat.is_finite()
    }

    /// Returns true if both points are very close to each other.
    pub fn is_close(&self, other: &Self) -> bool {
        (self.lon - other.lon).abs() < EPS_DEG && (self.lat - other.lat).abs() < EPS_DEG
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prec = f.precision().unwrap_or(6); // Default 6 decimals
        write!(
            f,
            "GeoPoint({:.prec$}, {:.prec$})",
            self.lon,
            self.lat,
            prec = prec
        )
    }
}
