//! Solar geometry and building-shadow ray tracing for geographic points.
//!
//! Given a point, a date, and a time of day, the crate decides whether the
//! point is sunlit or shadowed by a nearby building footprint, and produces
//! a tessellated 3D ray toward the sun (or to the blocker) for rendering.
//! Map rendering, geolocation, and footprint retrieval are collaborators on
//! the other side of the [`session::FootprintProvider`] seam.

pub mod error;
pub mod footprint;
pub mod geo;
pub mod ray;
pub mod session;
pub mod shadow;
pub mod solar;

// Prelude
pub use error::{FetchError, GeometryError};
pub use footprint::{estimate_height, Footprint, FootprintAttrs, FootprintId};
pub use geo::point::GeoPoint;
pub use ray::{Destination3D, RaySegment};
pub use session::{
    AnalysisSession, FetchTicket, FootprintProvider, SessionConfig, SessionState, StartOutcome,
};
pub use shadow::{resolve, ShadowResult};
pub use solar::position::SolarState;
pub use solar::window::SunWindow;
