//! Solar calculations: instantaneous position and daily sunrise/sunset
//! bounds, using the standard low-precision NOAA formulas.

pub mod position;
pub mod window;

use chrono::{Datelike, NaiveDateTime, Timelike};

/// Julian Date of a naive UTC datetime.
pub(crate) fn julian_date(dt: &NaiveDateTime) -> f64 {
    let y = dt.year() as f64;
    let m = dt.month() as f64;
    let d = dt.day() as f64;
    let h = dt.hour() as f64 + dt.minute() as f64 / 60.0 + dt.second() as f64 / 3600.0;

    let (y2, m2) = if m <= 2.0 { (y - 1.0, m + 12.0) } else { (y, m) };

    let a = (y2 / 100.0_f64).floor();
    let b = 2.0 - a + (a / 4.0_f64).floor();

    (365.25_f64 * (y2 + 4716.0)).floor() + (30.6001_f64 * (m2 + 1.0)).floor() + d + h / 24.0 + b
        - 1524.5
}

/// Julian centuries since J2000.0.
pub(crate) fn julian_century(jd: f64) -> f64 {
    (jd - 2451545.0) / 36525.0
}

pub(crate) fn normalize_degrees(deg: f64) -> f64 {
    deg.rem_euclid(360.0)
}

fn sun_mean_longitude(t: f64) -> f64 {
    normalize_degrees(280.46646 + t * (36000.76983 + t * 0.0003032))
}

fn sun_mean_anomaly(t: f64) -> f64 {
    normalize_degrees(357.52911 + t * (35999.05029 - t * 0.0001537))
}

fn earth_eccentricity(t: f64) -> f64 {
    0.016708634 - t * (0.000042037 + t * 0.0000001267)
}

fn sun_equation_of_center(t: f64) -> f64 {
    let m = sun_mean_anomaly(t).to_radians();
    m.sin() * (1.914602 - t * (0.004817 + t * 0.000014))
        + (2.0 * m).sin() * (0.019993 - t * 0.000101)
        + (3.0 * m).sin() * 0.000289
}

fn sun_apparent_longitude(t: f64) -> f64 {
    let omega = 125.04 - 1934.136 * t;
    sun_mean_longitude(t) + sun_equation_of_center(t) - 0.00569
        - 0.00478 * omega.to_radians().sin()
}

fn mean_obliquity(t: f64) -> f64 {
    23.0 + (26.0 + (21.448 - t * (46.815 + t * (0.00059 - t * 0.001813))) / 60.0) / 60.0
}

fn obliquity_corrected(t: f64) -> f64 {
    let omega = 125.04 - 1934.136 * t;
    mean_obliquity(t) + 0.00256 * omega.to_radians().cos()
}

/// Solar declination in degrees at Julian century `t`.
pub(crate) fn solar_declination(t: f64) -> f64 {
    let e = obliquity_corrected(t).to_radians();
    let lambda = sun_apparent_longitude(t).to_radians();
    (e.sin() * lambda.sin()).asin().to_degrees()
}

/// Equation of time in minutes at Julian century `t`.
pub(crate) fn equation_of_time(t: f64) -> f64 {
    let e = obliquity_corrected(t).to_radians();
    let l0 = sun_mean_longitude(t).to_radians();
    let ecc = earth_eccentricity(t);
    let m = sun_mean_anomaly(t).to_radians();

    let y = (e / 2.0).tan().powi(2);

    let eq = y * (2.0 * l0).sin() - 2.0 * ecc * m.sin() + 4.0 * ecc * y * m.sin() * (2.0 * l0).cos()
        - 0.5 * y * y * (4.0 * l0).sin()
        - 1.25 * ecc * ecc * (2.0 * m).sin();

    4.0 * eq.to_degrees()
}
