//! The fixed regional extent served by the raster engine.

use serde::Serialize;

use crate::bbox::BoundingBox;
use crate::error::{GeoError, GeoResult};

/// A named geographic region with a fixed extent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Region {
    /// Lowercase identifier used in requests.
    pub id: &'static str,
    /// Display name, also substituted into `{region}` filename templates.
    pub name: &'static str,
    pub bbox: BoundingBox,
}

/// Assaba, southern Mauritania.
pub const ASSABA: Region = Region {
    id: "assaba",
    name: "Assaba",
    bbox: BoundingBox::new(-12.95, 15.45, -10.55, 18.35),
};

impl Region {
    /// All regions the raster layers are available for.
    pub fn supported() -> &'static [Region] {
        std::slice::from_ref(&ASSABA)
    }

    /// Resolve a region name case-insensitively.
    pub fn resolve(name: &str) -> GeoResult<Region> {
        let wanted = name.trim().to_lowercase();
        Self::supported()
            .iter()
            .find(|r| r.id == wanted)
            .copied()
            .ok_or_else(|| GeoError::UnsupportedRegion(name.to_string()))
    }
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}
