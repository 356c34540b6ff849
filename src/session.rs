//! Analysis session controller.
//!
//! A session pins one origin point, fetches footprints for it through the
//! external provider, and re-resolves the shadow status as the displayed
//! time changes. The session is single-threaded and event-driven: the
//! footprint fetch is the only asynchronous boundary, and it is driven by
//! the host through [`FetchTicket`] / [`AnalysisSession::complete_fetch`].

use std::time::{Duration, Instant};

use chrono::{NaiveDateTime, Utc};
use log::{debug, warn};

use crate::error::FetchError;
use crate::footprint::Footprint;
use crate::geo::geodesy::distance_m;
use crate::geo::point::GeoPoint;
use crate::shadow::{self, ShadowResult};
use crate::solar::position::SolarState;
use crate::solar::window::SunWindow;

/// External footprint source (vector-tile query, network API).
pub trait FootprintProvider {
    /// Fetches all footprints near `point`. An empty result is a valid
    /// "no buildings nearby" answer, not an error.
    fn fetch_footprints(&self, point: GeoPoint) -> Result<Vec<Footprint>, FetchError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Inactive,
    Fetching,
    Resolved,
}

/// Session tuning knobs.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// A cached footprint set stays valid while the origin moves less than
    /// this many meters from the point it was fetched for.
    pub cache_radius_m: f64,
    /// Force-resolve a stuck fetch after this long, so a UI can never hang
    /// in a "computing" state.
    pub fetch_timeout: Duration,
    /// Fallback time-of-day bounds (decimal hours) when the sun window is
    /// unavailable (polar day/night).
    pub default_window: (f64, f64),
}

impl SessionConfig {
    pub fn new() -> Self {
        Self {
            cache_radius_m: 10.0,
            fetch_timeout: Duration::from_secs(10),
            default_window: (6.0, 18.0),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle for one outstanding footprint fetch. The host passes it to the
/// provider call and hands the result back via `complete_fetch`.
#[derive(Debug, Clone, Copy)]
pub struct FetchTicket {
    pub point: GeoPoint,
    epoch: u64,
}

/// What `start` decided to do.
#[derive(Debug, Clone, Copy)]
pub enum StartOutcome {
    /// Cached footprints covered the point; the result is ready.
    Resolved,
    /// The host must run the provider and call `complete_fetch`.
    FetchNeeded(FetchTicket),
    /// A fetch is already outstanding; no duplicate was issued.
    AlreadyFetching,
}

struct CachedFootprints {
    point: GeoPoint,
    footprints: Vec<Footprint>,
}

/// One analysis session. Owned by the caller, mutated only through the
/// operations below; no ambient global state.
pub struct AnalysisSession {
    config: SessionConfig,
    state: SessionState,
    /// Pinned analysis point. Never follows a live map center.
    origin: Option<GeoPoint>,
    displayed_at: NaiveDateTime,
    solar: Option<SolarState>,
    window: Option<SunWindow>,
    result: Option<ShadowResult>,
    cache: Option<CachedFootprints>,
    /// Bumped on exit and timeout so a late fetch completion is discarded.
    epoch: u64,
    fetch_started: Option<Instant>,
}

impl AnalysisSession {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            state: SessionState::Inactive,
            origin: None,
            displayed_at: Utc::now().naive_utc(),
            solar: None,
            window: None,
            result: None,
            cache: None,
            epoch: 0,
            fetch_started: None,
        }
    }

    /// Begins (or re-targets) the analysis at `point` for the instant `at`.
    ///
    /// `now` is only used to arm the fetch safety timeout.
    pub fn start(&mut self, point: GeoPoint, at: NaiveDateTime, now: Instant) -> StartOutcome {
        if self.state == SessionState::Fetching {
            return StartOutcome::AlreadyFetching;
        }

        self.origin = Some(point);
        self.displayed_at = at;
        self.solar = SolarState::compute(at, point);
        self.window = SunWindow::compute(at.date(), point);

        if !point.is_finite() {
            // Garbage coordinates never trigger a fetch.
            self.result = Some(ShadowResult::neutral());
            self.state = SessionState::Resolved;
            return StartOutcome::Resolved;
        }

        if self.cache_covers(point) {
            self.resolve_current();
            self.state = SessionState::Resolved;
            return StartOutcome::Resolved;
        }

        self.state = SessionState::Fetching;
        self.fetch_started = Some(now);
        StartOutcome::FetchNeeded(FetchTicket {
            point,
            epoch: self.epoch,
        })
    }

    /// Hands a provider result back to the session.
    ///
    /// A completion whose ticket predates the latest `exit`/timeout is
    /// stale and is discarded without touching session state. A provider
    /// failure degrades to "no footprints nearby": conservative, but the
    /// session still reaches `Resolved`.
    pub fn complete_fetch(
        &mut self,
        ticket: FetchTicket,
        fetched: Result<Vec<Footprint>, FetchError>,
    ) {
        if ticket.epoch != self.epoch || self.state != SessionState::Fetching {
            debug!("discarding stale footprint fetch for {}", ticket.point);
            return;
        }

        match fetched {
            Ok(footprints) => {
                self.cache = Some(CachedFootprints {
                    point: ticket.point,
                    footprints,
                });
            }
            Err(e) => {
                // No cache entry: a later start at this spot retries.
                warn!("footprint fetch failed, treating location as open: {e}");
            }
        }

        self.fetch_started = None;
        self.resolve_current();
        self.state = SessionState::Resolved;
    }

    /// Recomputes the solar state for the pinned origin at the new instant
    /// and re-resolves. A failed recomputation leaves the last valid result
    /// in place; the session stays active either way.
    pub fn on_time_changed(&mut self, at: NaiveDateTime) {
        if self.state == SessionState::Inactive {
            return;
        }
        self.displayed_at = at;
        let Some(origin) = self.origin else {
            return;
        };
        match SolarState::compute(at, origin) {
            Some(solar) => {
                self.solar = Some(solar);
                self.window = SunWindow::compute(at.date(), origin);
            }
            None => {
                warn!("solar state unavailable, keeping last shadow result");
                return;
            }
        }
        if self.state == SessionState::Resolved {
            self.resolve_current();
        }
    }

    /// Ends the analysis. The shadow result and solar state are cleared and
    /// the displayed time resets to now; the footprint cache is kept for a
    /// later `start` at the same spot.
    pub fn exit(&mut self) {
        self.state = SessionState::Inactive;
        self.origin = None;
        self.solar = None;
        self.window = None;
        self.result = None;
        self.displayed_at = Utc::now().naive_utc();
        self.epoch += 1;
        self.fetch_started = None;
    }

    /// Safety timeout: a session stuck in `Fetching` past the configured
    /// deadline is force-resolved with no footprints.
    pub fn tick(&mut self, now: Instant) {
        if self.state != SessionState::Fetching {
            return;
        }
        let Some(started) = self.fetch_started else {
            return;
        };
        if now.duration_since(started) >= self.config.fetch_timeout {
            warn!("footprint fetch timed out, resolving with no footprints");
            self.epoch += 1;
            self.fetch_started = None;
            self.resolve_current();
            self.state = SessionState::Resolved;
        }
    }

    /// Runs the whole start/fetch/resolve cycle against a synchronous
    /// provider.
    pub fn start_with<P: FootprintProvider>(
        &mut self,
        provider: &P,
        point: GeoPoint,
        at: NaiveDateTime,
        now: Instant,
    ) -> Option<&ShadowResult> {
        if let StartOutcome::FetchNeeded(ticket) = self.start(point, at, now) {
            let fetched = provider.fetch_footprints(ticket.point);
            self.complete_fetch(ticket, fetched);
        }
        self.result.as_ref()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn result(&self) -> Option<&ShadowResult> {
        self.result.as_ref()
    }

    pub fn solar(&self) -> Option<&SolarState> {
        self.solar.as_ref()
    }

    pub fn displayed_at(&self) -> NaiveDateTime {
        self.displayed_at
    }

    /// Time-of-day bounds for a UI control, falling back to the configured
    /// default window when there is no sunrise/sunset.
    pub fn sun_window_hours(&self) -> (f64, f64) {
        self.window
            .as_ref()
            .map(|w| (w.sunrise_hour, w.sunset_hour))
            .unwrap_or(self.config.default_window)
    }

    fn cache_covers(&self, point: GeoPoint) -> bool {
        self.cache
            .as_ref()
            .is_some_and(|c| distance_m(c.point, point) <= self.config.cache_radius_m)
    }

    fn resolve_current(&mut self) {
        let (Some(origin), Some(solar)) = (self.origin, self.solar.as_ref()) else {
            return; // Keep the last valid result
        };
        let footprints = match &self.cache {
            Some(c) if distance_m(c.point, origin) <= self.config.cache_radius_m => {
                c.footprints.as_slice()
            }
            _ => &[],
        };
        self.result = Some(shadow::resolve(origin, solar, footprints));
    }
}

impl Default for AnalysisSession {
    fn default() -> Self {
        Self::new(SessionConfig::new())
    }
}
