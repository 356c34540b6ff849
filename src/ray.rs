//! 3D sun-ray construction.
//!
//! A ray is modeled as a ground track plus a linear elevation profile and is
//! tessellated into thin quads so a rendering layer can extrude it as a 3D
//! ribbon. Construction is pure and fully regenerated on every resolve.

use serde::{Deserialize, Serialize};

use crate::geo::geodesy::{bearing_deg, destination};
use crate::geo::point::GeoPoint;

/// Number of ribbon slices per ray.
pub const DEFAULT_SEGMENT_COUNT: usize = 20;

/// Ribbon width in meters.
pub const DEFAULT_RIBBON_WIDTH_M: f64 = 0.2;

/// Endpoint of a slant path: ground position plus elevation above it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Destination3D {
    pub position: GeoPoint,
    pub elevation_m: f64,
}

/// Travels `distance_km` from `origin` along `bearing_deg` while climbing at
/// `altitude_deg`.
///
/// The slant distance splits into a horizontal ground component
/// (`d cos(alt)`) and a vertical one (`d sin(alt)`, converted to meters).
/// At 90 degrees the path goes straight up; at 0 it stays level.
pub fn destination_3d(
    origin: GeoPoint,
    distance_km: f64,
    bearing: f64,
    altitude_deg: f64,
) -> Destination3D {
    let alt = altitude_deg.to_radians();
    let horizontal_km = distance_km * alt.cos();
    let elevation_m = distance_km * alt.sin() * 1000.0;
    Destination3D {
        position: destination(origin, horizontal_km, bearing),
        elevation_m,
    }
}

/// One slice of the extruded ray ribbon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaySegment {
    pub base_elevation_m: f64,
    pub top_elevation_m: f64,
    /// Thin rectangle around the slice's ground track, wound
    /// start-left, start-right, end-right, end-left.
    pub quad: [GeoPoint; 4],
}

/// Tessellates the ray from `start` to `end` into `count` slices of
/// `width_m` wide quads, interpolating ground position and elevation
/// linearly across the slices.
pub fn build_ray(
    start: GeoPoint,
    end: GeoPoint,
    start_elevation_m: f64,
    end_elevation_m: f64,
    count: usize,
    width_m: f64,
) -> Vec<RaySegment> {
    if count == 0 {
        return Vec::new();
    }

    // A vertical ray has no ground track; orient its quads north.
    let overall_bearing = if start.is_close(&end) {
        0.0
    } else {
        bearing_deg(start, end)
    };
    let half_km = width_m / 2.0 / 1000.0;

    (0..count)
        .map(|i| {
            let f0 = i as f64 / count as f64;
            let f1 = (i + 1) as f64 / count as f64;
            let p0 = lerp_point(start, end, f0);
            let p1 = lerp_point(start, end, f1);
            let along = if p0.is_close(&p1) {
                overall_bearing
            } else {
                bearing_deg(p0, p1)
            };
            let left = (along - 90.0).rem_euclid(360.0);
            let right = (along + 90.0).rem_euclid(360.0);
            RaySegment {
                base_elevation_m: lerp(start_elevation_m, end_elevation_m, f0),
                top_elevation_m: lerp(start_elevation_m, end_elevation_m, f1),
                quad: [
                    destination(p0, half_km, left),
                    destination(p0, half_km, right),
                    destination(p1, half_km, right),
                    destination(p1, half_km, left),
                ],
            }
        })
        .collect()
}

fn lerp(a: f64, b: f64, f: f64) -> f64 {
    a + (b - a) * f
}

fn lerp_point(a: GeoPoint, b: GeoPoint, f: f64) -> GeoPoint {
    GeoPoint::new(lerp(a.lon, b.lon, f), lerp(a.lat, b.lat, f))
}
