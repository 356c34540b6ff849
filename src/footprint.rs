//! Building footprints and the height-estimation policy applied at the
//! ingestion boundary.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geo::point::GeoPoint;

/// Meters assumed per building level when only a level count is known.
pub const METERS_PER_LEVEL: f64 = 3.0;

/// Flat fallback height for footprints tagged as buildings with no height
/// or level data.
pub const DEFAULT_BUILDING_HEIGHT_M: f64 = 15.0;

/// Identifier of a footprint, carried through to the shadow result so a
/// rendering layer can highlight the blocker.
#[derive(Eq, PartialEq, Hash, Debug, Clone, Serialize, Deserialize)]
pub struct FootprintId(String);

impl From<&str> for FootprintId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for FootprintId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl Default for FootprintId {
    fn default() -> Self {
        Self::new()
    }
}

impl FootprintId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A building ground plan: one or more closed rings plus a height used for
/// occlusion testing. A multi-polygon building is either one footprint with
/// several rings or several footprints sharing provider attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Footprint {
    pub id: FootprintId,
    /// Closed rings; each ring is tested as an independent simple polygon.
    pub rings: Vec<Vec<GeoPoint>>,
    pub height_m: f64,
}

impl Footprint {
    pub fn new(id: FootprintId, rings: Vec<Vec<GeoPoint>>, height_m: f64) -> Self {
        Self {
            id,
            rings,
            height_m,
        }
    }

    /// A footprint can only block sun rays if it has positive height.
    pub fn is_blocking(&self) -> bool {
        self.height_m > 0.0
    }
}

/// Raw attributes a footprint provider may carry for one feature.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct FootprintAttrs {
    /// Explicit height in meters, when the source data has one.
    pub height_m: Option<f64>,
    /// Number of levels, when the source data has one.
    pub levels: Option<f64>,
    /// Whether the feature is tagged as a building at all.
    pub is_building: bool,
}

/// Resolves provider attributes into a blocking height.
///
/// Precedence: explicit height, then levels at [`METERS_PER_LEVEL`] each,
/// then [`DEFAULT_BUILDING_HEIGHT_M`] for anything tagged as a building.
/// Features that are not buildings resolve to 0 and never block.
pub fn estimate_height(attrs: &FootprintAttrs) -> f64 {
    if let Some(h) = attrs.height_m {
        return h.max(0.0);
    }
    if let Some(levels) = attrs.levels {
        return (levels * METERS_PER_LEVEL).max(0.0);
    }
    if attrs.is_building {
        return DEFAULT_BUILDING_HEIGHT_M;
    }
    0.0
}
