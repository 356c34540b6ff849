//! Error taxonomy.
//!
//! Everything here is recovered locally: a bad ring skips one footprint, a
//! failed fetch degrades to an empty footprint set. The public API never
//! surfaces these as hard failures.

use thiserror::Error;

/// Failure of the external footprint provider (network or map query).
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(String),
    #[error("provider error: {0}")]
    Provider(String),
}

/// A footprint ring that cannot be used for intersection testing.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GeometryError {
    #[error("ring has {0} points, need at least 4")]
    TooFewPoints(usize),
    #[error("ring is not closed")]
    NotClosed,
}
