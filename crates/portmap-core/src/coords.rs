use std::fmt;

use serde::{Serialize, Serializer};

/// How the coordinates of a ports dataset were interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CoordMode {
    /// No point feature with a usable position; nothing was touched
    NoPointFound,
    LonLatOk,
    SwappedLatLon,
    /// Projected SIRGAS2000 / UTM 23S converted to WGS84
    Utm23s,
    /// Nothing matched; only a third (elevation) value was dropped
    FallbackCutZ,
}

impl CoordMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            CoordMode::NoPointFound => "no-point-found",
            CoordMode::LonLatOk => "lonlat-ok",
            CoordMode::SwappedLatLon => "swapped-latlon->lonlat",
            CoordMode::Utm23s => "utm23s->wgs84",
            CoordMode::FallbackCutZ => "fallback-cut-z-only",
        }
    }
}

impl fmt::Display for CoordMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for CoordMode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

pub fn looks_like_lonlat(x: f64, y: f64) -> bool {
    x.abs() <= 180.0 && y.abs() <= 90.0
}

/// Both axes far beyond any degree value: metres of a projected system.
pub fn looks_like_projected(x: f64, y: f64) -> bool {
    x.abs() > 1000.0 && y.abs() > 1000.0
}

/// Classify a raw `(x, y)` pair. Checks run in a fixed order and the first
/// match wins, so a pair that is valid both ways is taken as lon/lat.
///
/// Small projected values near a false origin can pass for degrees; the
/// thresholds are a heuristic and that case is knowingly misclassified.
pub fn classify(x: f64, y: f64) -> CoordMode {
    if looks_like_lonlat(x, y) {
        CoordMode::LonLatOk
    } else if looks_like_lonlat(y, x) {
        CoordMode::SwappedLatLon
    } else if looks_like_projected(x, y) {
        CoordMode::Utm23s
    } else {
        CoordMode::FallbackCutZ
    }
}
