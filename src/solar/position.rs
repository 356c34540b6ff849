use chrono::{NaiveDateTime, Timelike};

use crate::geo::point::GeoPoint;
use crate::solar::{equation_of_time, julian_century, julian_date, solar_declination};

/// Instantaneous solar position for one observer point and datetime.
///
/// Derived data: recomputed whenever the point or time changes, never
/// mutated in place.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolarState {
    /// Compass bearing toward the sun, degrees clockwise from true north.
    pub bearing_deg: f64,
    /// Altitude above the horizon in degrees (negative at night).
    pub altitude_deg: f64,
    /// Observer point this state was computed for.
    pub point: GeoPoint,
    /// UTC instant this state was computed for.
    pub at: NaiveDateTime,
}

impl SolarState {
    /// Computes the solar position for a naive UTC datetime and observer
    /// point. Returns `None` for non-finite coordinates.
    pub fn compute(at: NaiveDateTime, point: GeoPoint) -> Option<Self> {
        if !point.is_finite() {
            return None;
        }

        let t = julian_century(julian_date(&at));
        let decl = solar_declination(t).to_radians();
        let eqt = equation_of_time(t);

        // True solar time in minutes, then hour angle (degrees from solar
        // noon, afternoon positive).
        let clock_min =
            at.hour() as f64 * 60.0 + at.minute() as f64 + at.second() as f64 / 60.0;
        let tst = clock_min + eqt + 4.0 * point.lon;
        let ha = (tst / 4.0).rem_euclid(360.0) - 180.0;
        let ha_r = ha.to_radians();

        let lat = point.lat.to_radians();
        let sin_alt = lat.sin() * decl.sin() + lat.cos() * decl.cos() * ha_r.cos();
        let altitude_deg = sin_alt.clamp(-1.0, 1.0).asin().to_degrees();

        // Azimuth measured clockwise from south, then converted to a
        // north-based bearing.
        let az_south = ha_r
            .sin()
            .atan2(ha_r.cos() * lat.sin() - decl.tan() * lat.cos())
            .to_degrees();
        let bearing_deg = (180.0 + az_south).rem_euclid(360.0);

        Some(Self {
            bearing_deg,
            altitude_deg,
            point,
            at,
        })
    }

    /// Returns true if the sun is above the horizon.
    pub fn is_above_horizon(&self) -> bool {
        self.altitude_deg > 0.0
    }

    /// Unit direction vector toward the sun in a local east-north-up frame,
    /// for renderers that place a light source.
    pub fn direction_enu(&self) -> [f64; 3] {
        let alt = self.altitude_deg.to_radians();
        let bearing = self.bearing_deg.to_radians();
        [
            alt.cos() * bearing.sin(),
            alt.cos() * bearing.cos(),
            alt.sin(),
        ]
    }
}
