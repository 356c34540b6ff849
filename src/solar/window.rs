use chrono::{NaiveDate, NaiveTime};

use crate::geo::point::GeoPoint;
use crate::solar::{equation_of_time, julian_century, julian_date, solar_declination};

/// Zenith angle for sunrise/sunset: 90 deg plus refraction and solar radius.
const SUNRISE_ZENITH_DEG: f64 = 90.833;

/// Sunrise and sunset bounds for one date and location, used to limit a
/// time-of-day control.
///
/// Times and decimal hours are UTC. The decimal hours are left unwrapped so
/// that `sunrise_hour < sunset_hour` holds even when one of the events falls
/// across the UTC date boundary; only the `NaiveTime` fields wrap.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SunWindow {
    pub sunrise: NaiveTime,
    pub sunset: NaiveTime,
    pub sunrise_hour: f64,
    pub sunset_hour: f64,
}

impl SunWindow {
    /// Computes the sun window for a date and point.
    ///
    /// Returns `None` for polar day/night (no sunrise or sunset) and for
    /// non-finite coordinates; callers substitute a fixed fallback window.
    pub fn compute(date: NaiveDate, point: GeoPoint) -> Option<Self> {
        if !point.is_finite() {
            return None;
        }

        // First pass at civil noon to locate solar noon, second pass with
        // the ephemeris evaluated at solar noon itself.
        let civil_noon = date.and_hms_opt(12, 0, 0)?;
        let t0 = julian_century(julian_date(&civil_noon));
        let noon_min0 = 720.0 - 4.0 * point.lon - equation_of_time(t0);

        let jd_midnight = julian_date(&date.and_hms_opt(0, 0, 0)?);
        let t = julian_century(jd_midnight + noon_min0 / 1440.0);
        let decl = solar_declination(t).to_radians();
        let eqt = equation_of_time(t);

        let lat = point.lat.to_radians();
        let cos_ha = (SUNRISE_ZENITH_DEG.to_radians().cos() - lat.sin() * decl.sin())
            / (lat.cos() * decl.cos());
        if !cos_ha.is_finite() || !(-1.0..=1.0).contains(&cos_ha) {
            return None; // Polar day or polar night
        }
        let ha_deg = cos_ha.acos().to_degrees();

        let noon_min = 720.0 - 4.0 * point.lon - eqt;
        let sunrise_min = noon_min - 4.0 * ha_deg;
        let sunset_min = noon_min + 4.0 * ha_deg;

        Some(Self {
            sunrise: time_from_minutes(sunrise_min),
            sunset: time_from_minutes(sunset_min),
            sunrise_hour: sunrise_min / 60.0,
            sunset_hour: sunset_min / 60.0,
        })
    }

    /// Midpoint of the window: solar transit in decimal hours UTC.
    pub fn solar_noon_hour(&self) -> f64 {
        (self.sunrise_hour + self.sunset_hour) / 2.0
    }

    /// Day length in hours.
    pub fn length_hours(&self) -> f64 {
        self.sunset_hour - self.sunrise_hour
    }
}

fn time_from_minutes(minutes: f64) -> NaiveTime {
    let secs = (minutes * 60.0).rem_euclid(86_400.0) as u32;
    NaiveTime::from_num_seconds_from_midnight_opt(secs.min(86_399), 0).unwrap_or(NaiveTime::MIN)
}
