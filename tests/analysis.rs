//! End-to-end tests over the public API: solar position regression, shadow
//! resolution properties, and the session lifecycle with a mock provider.

use std::cell::Cell;
use std::time::Instant;

use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveDateTime};
use suncast::{
    resolve, AnalysisSession, FetchError, Footprint, FootprintId, FootprintProvider, GeoPoint,
    SessionState, ShadowResult, SolarState, SunWindow,
};

const AMSTERDAM: GeoPoint = GeoPoint {
    lon: 4.9041,
    lat: 52.3676,
};

fn solstice() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 21).unwrap()
}

fn at_decimal_hour(date: NaiveDate, hour: f64) -> NaiveDateTime {
    let secs = (hour * 3600.0).round() as u32;
    date.and_hms_opt(secs / 3600, (secs % 3600) / 60, secs % 60)
        .unwrap()
}

/// Closed square ring of `half_m` half-size centered on `center`.
fn square_ring(center: GeoPoint, half_m: f64) -> Vec<GeoPoint> {
    let dlat = half_m / 111_195.0;
    let dlon = dlat / center.lat.to_radians().cos();
    vec![
        GeoPoint::new(center.lon - dlon, center.lat - dlat),
        GeoPoint::new(center.lon + dlon, center.lat - dlat),
        GeoPoint::new(center.lon + dlon, center.lat + dlat),
        GeoPoint::new(center.lon - dlon, center.lat + dlat),
        GeoPoint::new(center.lon - dlon, center.lat - dlat),
    ]
}

fn building_at(origin: GeoPoint, bearing_deg: f64, dist_m: f64, height_m: f64) -> Footprint {
    let center = suncast::geo::geodesy::destination(origin, dist_m / 1000.0, bearing_deg);
    Footprint::new(FootprintId::new(), vec![square_ring(center, 10.0)], height_m)
}

#[test]
fn amsterdam_solstice_noon_reference() -> Result<()> {
    // At local solar noon on the June solstice the sun stands almost due
    // south of Amsterdam, just above 61 degrees.
    let window = SunWindow::compute(solstice(), AMSTERDAM).context("no sun window")?;
    let noon = at_decimal_hour(solstice(), window.solar_noon_hour());
    let state = SolarState::compute(noon, AMSTERDAM).context("no solar state")?;

    assert!(state.altitude_deg > 60.0, "altitude = {}", state.altitude_deg);
    assert!(
        (state.bearing_deg - 180.0).abs() < 1.0,
        "bearing = {}",
        state.bearing_deg
    );
    Ok(())
}

#[test]
fn amsterdam_solstice_window_bounds() -> Result<()> {
    let window = SunWindow::compute(solstice(), AMSTERDAM).context("no sun window")?;
    assert!(window.sunrise_hour < 12.0);
    assert!(window.sunset_hour > 12.0);
    assert!(window.length_hours() > 14.0, "length = {}", window.length_hours());
    Ok(())
}

#[test]
fn night_shadows_everything() {
    let state = SolarState::compute(
        solstice().and_hms_opt(0, 30, 0).unwrap(),
        AMSTERDAM,
    )
    .unwrap();
    assert!(!state.is_above_horizon());

    let tall = building_at(AMSTERDAM, 180.0, 100.0, 300.0);
    let result = resolve(AMSTERDAM, &state, &[tall]);
    assert!(result.in_shadow);
    assert!(result.ray.is_none());
    assert!(result.blocker.is_none());
}

#[test]
fn open_sky_yields_twenty_segment_ray() {
    let window = SunWindow::compute(solstice(), AMSTERDAM).unwrap();
    let noon = at_decimal_hour(solstice(), window.solar_noon_hour());
    let state = SolarState::compute(noon, AMSTERDAM).unwrap();

    let result = resolve(AMSTERDAM, &state, &[]);
    assert!(!result.in_shadow);
    let ray = result.ray.unwrap();
    assert_eq!(ray.len(), 20);

    // Slant distance from origin to the far end is about half a kilometer.
    let far = ray.last().unwrap();
    let ground = suncast::geo::geodesy::distance_m(AMSTERDAM, far.quad[2]);
    let slant = (ground.powi(2) + far.top_elevation_m.powi(2)).sqrt();
    assert!((slant - 500.0).abs() < 2.0, "slant = {slant}");
}

#[test]
fn occlusion_threshold_flips_at_ray_height() {
    let window = SunWindow::compute(solstice(), AMSTERDAM).unwrap();
    let noon = at_decimal_hour(solstice(), window.solar_noon_hour());
    let state = SolarState::compute(noon, AMSTERDAM).unwrap();
    let tan_alt = state.altitude_deg.to_radians().tan();

    // Probe with an oversized blocker to find the near-face distance.
    let probe = building_at(AMSTERDAM, state.bearing_deg, 100.0, 10_000.0);
    let hit = resolve(AMSTERDAM, &state, &[probe])
        .intersection
        .expect("probe building must block");
    let dist = suncast::geo::geodesy::distance_m(AMSTERDAM, hit);
    let threshold = dist * tan_alt;

    let just_above = building_at(AMSTERDAM, state.bearing_deg, 100.0, threshold + 0.05);
    assert!(resolve(AMSTERDAM, &state, &[just_above]).in_shadow);

    let just_below = building_at(AMSTERDAM, state.bearing_deg, 100.0, threshold - 0.05);
    assert!(!resolve(AMSTERDAM, &state, &[just_below]).in_shadow);
}

#[test]
fn closest_blocker_is_reported() {
    let window = SunWindow::compute(solstice(), AMSTERDAM).unwrap();
    let noon = at_decimal_hour(solstice(), window.solar_noon_hour());
    let state = SolarState::compute(noon, AMSTERDAM).unwrap();

    let near = building_at(AMSTERDAM, state.bearing_deg, 120.0, 400.0);
    let far = building_at(AMSTERDAM, state.bearing_deg, 200.0, 400.0);
    let result = resolve(AMSTERDAM, &state, &[far, near.clone()]);
    assert!(result.in_shadow);
    assert_eq!(result.blocker.map(|b| b.id), Some(near.id));
}

#[test]
fn malformed_footprint_does_not_poison_resolution() {
    let window = SunWindow::compute(solstice(), AMSTERDAM).unwrap();
    let noon = at_decimal_hour(solstice(), window.solar_noon_hour());
    let state = SolarState::compute(noon, AMSTERDAM).unwrap();

    let two_point_ring = Footprint::new(
        FootprintId::from("degenerate"),
        vec![vec![
            GeoPoint::new(AMSTERDAM.lon, AMSTERDAM.lat - 0.001),
            GeoPoint::new(AMSTERDAM.lon + 0.001, AMSTERDAM.lat - 0.001),
        ]],
        100.0,
    );
    let valid = building_at(AMSTERDAM, state.bearing_deg, 120.0, 400.0);

    let result = resolve(AMSTERDAM, &state, &[two_point_ring, valid.clone()]);
    assert!(result.in_shadow);
    assert_eq!(result.blocker.map(|b| b.id), Some(valid.id));
}

struct CountingProvider {
    calls: Cell<usize>,
    footprints: Vec<Footprint>,
}

impl FootprintProvider for CountingProvider {
    fn fetch_footprints(&self, _point: GeoPoint) -> Result<Vec<Footprint>, FetchError> {
        self.calls.set(self.calls.get() + 1);
        Ok(self.footprints.clone())
    }
}

#[test]
fn session_reuses_cache_within_ten_meters() {
    let provider = CountingProvider {
        calls: Cell::new(0),
        footprints: Vec::new(),
    };
    let mut session = AnalysisSession::default();
    let t0 = Instant::now();
    let noon = solstice().and_hms_opt(11, 40, 0).unwrap();

    session.start_with(&provider, AMSTERDAM, noon, t0);
    let nearby = GeoPoint::new(AMSTERDAM.lon, AMSTERDAM.lat + 8.0 / 111_195.0);
    session.start_with(&provider, nearby, noon, t0);

    assert_eq!(provider.calls.get(), 1);
    assert_eq!(session.state(), SessionState::Resolved);
}

#[test]
fn session_full_lifecycle_with_blocker() {
    let noon = solstice().and_hms_opt(11, 40, 0).unwrap();
    let state = SolarState::compute(noon, AMSTERDAM).unwrap();
    let provider = CountingProvider {
        calls: Cell::new(0),
        footprints: vec![building_at(AMSTERDAM, state.bearing_deg, 100.0, 300.0)],
    };
    let mut session = AnalysisSession::default();

    let result = session
        .start_with(&provider, AMSTERDAM, noon, Instant::now())
        .unwrap();
    assert!(result.in_shadow);
    assert!(result.blocker.is_some());
    assert!(result.ray.is_some());

    // Scrub the time control to the middle of the night and back.
    session.on_time_changed(solstice().and_hms_opt(0, 30, 0).unwrap());
    assert!(session.result().unwrap().in_shadow);
    assert!(session.result().unwrap().ray.is_none());

    session.on_time_changed(noon);
    assert!(session.result().unwrap().in_shadow);
    assert!(session.result().unwrap().blocker.is_some());

    session.exit();
    assert_eq!(session.state(), SessionState::Inactive);
    assert!(session.result().is_none());
    assert_eq!(provider.calls.get(), 1);
}

#[test]
fn failing_provider_still_reaches_resolved() {
    struct Failing;
    impl FootprintProvider for Failing {
        fn fetch_footprints(&self, _point: GeoPoint) -> Result<Vec<Footprint>, FetchError> {
            Err(FetchError::Provider("tile service unavailable".into()))
        }
    }

    let mut session = AnalysisSession::default();
    let noon = solstice().and_hms_opt(11, 40, 0).unwrap();
    let result = session
        .start_with(&Failing, AMSTERDAM, noon, Instant::now())
        .unwrap();
    assert!(!result.in_shadow);
    assert_eq!(session.state(), SessionState::Resolved);
}

#[test]
fn resolver_is_deterministic() {
    let noon = solstice().and_hms_opt(11, 40, 0).unwrap();
    let state = SolarState::compute(noon, AMSTERDAM).unwrap();
    let buildings = vec![
        building_at(AMSTERDAM, state.bearing_deg, 120.0, 400.0),
        building_at(AMSTERDAM, state.bearing_deg, 250.0, 400.0),
    ];
    let a: ShadowResult = resolve(AMSTERDAM, &state, &buildings);
    let b: ShadowResult = resolve(AMSTERDAM, &state, &buildings);
    assert_eq!(a, b);
}
