//! Coordinate Reference System codes and point transforms.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Earth radius used by the Web Mercator projection, in meters.
const WEB_MERCATOR_RADIUS: f64 = 6_378_137.0;

/// Well-known CRS codes supported by the analytics core.
///
/// The raster domain and the administrative polygon set are both small
/// and fixed; only the geographic reference the artifacts are published
/// in and Web Mercator are needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CrsCode {
    /// WGS84 Geographic (lon/lat in degrees)
    Epsg4326,
    /// Web Mercator (meters)
    Epsg3857,
}

impl CrsCode {
    /// Parse a CRS identifier string.
    ///
    /// Accepts "EPSG:4326", "CRS:84", "EPSG:3857" (case-insensitive).
    pub fn parse(s: &str) -> Result<Self, CrsParseError> {
        match s.to_uppercase().as_str() {
            "EPSG:4326" | "CRS:84" => Ok(CrsCode::Epsg4326),
            "EPSG:3857" | "EPSG:900913" => Ok(CrsCode::Epsg3857),
            _ => Err(CrsParseError::UnsupportedCrs(s.to_string())),
        }
    }

    /// Check if this is a geographic (lon/lat) CRS.
    pub fn is_geographic(&self) -> bool {
        matches!(self, CrsCode::Epsg4326)
    }
}

impl fmt::Display for CrsCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = match self {
            CrsCode::Epsg4326 => "EPSG:4326",
            CrsCode::Epsg3857 => "EPSG:3857",
        };
        write!(f, "{}", code)
    }
}

/// Transform a single point between supported reference systems.
pub fn transform_point(x: f64, y: f64, from: CrsCode, to: CrsCode) -> (f64, f64) {
    match (from, to) {
        (CrsCode::Epsg4326, CrsCode::Epsg3857) => {
            let mx = WEB_MERCATOR_RADIUS * x.to_radians();
            // Clamp latitude to the Mercator validity range
            let lat = y.clamp(-85.06, 85.06).to_radians();
            let my = WEB_MERCATOR_RADIUS * (std::f64::consts::FRAC_PI_4 + lat / 2.0).tan().ln();
            (mx, my)
        }
        (CrsCode::Epsg3857, CrsCode::Epsg4326) => {
            let lon = (x / WEB_MERCATOR_RADIUS).to_degrees();
            let lat = (2.0 * (y / WEB_MERCATOR_RADIUS).exp().atan()
                - std::f64::consts::FRAC_PI_2)
                .to_degrees();
            (lon, lat)
        }
        _ => (x, y),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CrsParseError {
    #[error("unsupported CRS: {0}")]
    UnsupportedCrs(String),
}
