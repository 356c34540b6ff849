pub mod geodesy;
pub mod line;
pub mod point;

/// Coordinate precision in degrees.
pub(crate) const EPS_DEG: f64 = 1e-9;
