//! Shadow resolution: decides whether a point is sunlit or shadowed by a
//! nearby building, and builds the ray geometry either way.
//!
//! The physical model is deliberately small: flat ground, a point sun, no
//! refraction, no penumbra. A building blocks the sun at an intersection
//! point iff its height exceeds the ray height `distance * tan(altitude)`
//! there.

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::footprint::Footprint;
use crate::geo::geodesy::distance_m;
use crate::geo::line::{check_ring, GeoLine};
use crate::geo::point::GeoPoint;
use crate::ray::{
    build_ray, destination_3d, RaySegment, DEFAULT_RIBBON_WIDTH_M, DEFAULT_SEGMENT_COUNT,
};
use crate::solar::position::SolarState;

/// Length of the traced sun ray when footprints are present.
pub const FULL_RAY_KM: f64 = 1.0;

/// Length of the decorative ray when there is nothing nearby to check.
pub const OPEN_SKY_RAY_KM: f64 = 0.5;

/// Outcome of one shadow resolution. Produced fresh per call; no state is
/// shared between calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShadowResult {
    pub in_shadow: bool,
    /// The nearest blocking footprint, for highlighting.
    pub blocker: Option<Footprint>,
    /// Where the sun ray meets the blocker's boundary.
    pub intersection: Option<GeoPoint>,
    /// Ribbon geometry; `None` at night and for invalid input.
    pub ray: Option<Vec<RaySegment>>,
}

impl ShadowResult {
    /// Night: everything is in shadow and there is no geometry to show.
    pub fn night() -> Self {
        Self {
            in_shadow: true,
            blocker: None,
            intersection: None,
            ray: None,
        }
    }

    /// Safe answer for invalid input: not shadowed, no geometry.
    pub fn neutral() -> Self {
        Self {
            in_shadow: false,
            blocker: None,
            intersection: None,
            ray: None,
        }
    }
}

/// Resolves the shadow status of `origin` under `solar` against a set of
/// building footprints.
///
/// Pure and deterministic for identical inputs. Malformed footprint rings
/// are skipped individually; they never abort the resolution.
pub fn resolve(origin: GeoPoint, solar: &SolarState, footprints: &[Footprint]) -> ShadowResult {
    if !origin.is_finite() || !solar.bearing_deg.is_finite() || !solar.altitude_deg.is_finite() {
        return ShadowResult::neutral();
    }
    if solar.altitude_deg <= 0.0 {
        return ShadowResult::night();
    }

    if footprints.is_empty() {
        let end = destination_3d(origin, OPEN_SKY_RAY_KM, solar.bearing_deg, solar.altitude_deg);
        return ShadowResult {
            in_shadow: false,
            blocker: None,
            intersection: None,
            ray: Some(build_ray(
                origin,
                end.position,
                0.0,
                end.elevation_m,
                DEFAULT_SEGMENT_COUNT,
                DEFAULT_RIBBON_WIDTH_M,
            )),
        };
    }

    let ray_end = destination_3d(origin, FULL_RAY_KM, solar.bearing_deg, solar.altitude_deg);
    // Oriented from the sun side back to the observation point, so every
    // boundary crossing between them is found.
    let line = GeoLine::new(ray_end.position, origin);
    let tan_alt = solar.altitude_deg.to_radians().tan();

    // Closest blocking intersection by ground distance from the origin.
    // Strict `<` keeps the first-seen candidate on an exact tie.
    let mut best: Option<(f64, GeoPoint, usize)> = None;
    for (idx, footprint) in footprints.iter().enumerate() {
        if !footprint.is_blocking() {
            continue;
        }
        for ring in &footprint.rings {
            if let Err(e) = check_ring(ring) {
                warn!(
                    "skipping ring of footprint {}: {e}",
                    footprint.id.as_str()
                );
                continue;
            }
            for hit in line.intersections(ring) {
                let dist = distance_m(origin, hit);
                let ray_height = dist * tan_alt;
                if footprint.height_m > ray_height && best.map_or(true, |(d, _, _)| dist < d) {
                    best = Some((dist, hit, idx));
                }
            }
        }
    }

    match best {
        Some((dist, hit, idx)) => {
            let blocker = &footprints[idx];
            let ray_height = dist * tan_alt;
            debug!(
                "shadowed by footprint {} at {:.1} m (ray height {:.1} m)",
                blocker.id.as_str(),
                dist,
                ray_height
            );
            ShadowResult {
                in_shadow: true,
                blocker: Some(blocker.clone()),
                intersection: Some(hit),
                ray: Some(build_ray(
                    origin,
                    hit,
                    0.0,
                    ray_height,
                    DEFAULT_SEGMENT_COUNT,
                    DEFAULT_RIBBON_WIDTH_M,
                )),
            }
        }
        None => ShadowResult {
            in_shadow: false,
            blocker: None,
            intersection: None,
            ray: Some(build_ray(
                origin,
                ray_end.position,
                0.0,
                ray_end.elevation_m,
                DEFAULT_SEGMENT_COUNT,
                DEFAULT_RIBBON_WIDTH_M,
            )),
        },
    }
}
