//! Spherical-earth primitives: distances, destinations, bearings.
//!
//! All formulas use the mean Earth radius. The error against an ellipsoidal
//! model is far below the footprint resolution at city-block scale.

use crate::geo::point::GeoPoint;

/// Mean Earth radius in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0088;

/// Haversine distance between two points in meters.
pub fn distance_m(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlat = (b.lat - a.lat).to_radians();
    let dlon = (b.lon - a.lon).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().asin();

    EARTH_RADIUS_KM * c * 1000.0
}

/// Great-circle destination from `origin` after `distance_km` along
/// `bearing_deg` (clockwise from true north).
pub fn destination(origin: GeoPoint, distance_km: f64, bearing_deg: f64) -> GeoPoint {
    let delta = distance_km / EARTH_RADIUS_KM;
    let theta = bearing_deg.to_radians();
    let lat1 = origin.lat.to_radians();
    let lon1 = origin.lon.to_radians();

    let lat2 = (lat1.sin() * delta.cos() + lat1.cos() * delta.sin() * theta.cos()).asin();
    let lon2 = lon1
        + (theta.sin() * delta.sin() * lat1.cos()).atan2(delta.cos() - lat1.sin() * lat2.sin());

    let mut lon2_deg = lon2.to_degrees();
    if lon2_deg > 180.0 {
        lon2_deg -= 360.0;
    } else if lon2_deg < -180.0 {
        lon2_deg += 360.0;
    }

    GeoPoint::new(lon2_deg, lat2.to_degrees())
}

/// Initial bearing from `a` to `b` in degrees (0-360, clockwise from north).
pub fn bearing_deg(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlon = (b.lon - a.lon).to_radians();

    let x = dlon.sin() * lat2.cos();
    let y = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlon.cos();

    (x.atan2(y).to_degrees() + 360.0) % 360.0
}
