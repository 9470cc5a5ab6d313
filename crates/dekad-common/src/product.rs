//! Raster product namespaces.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{AnalyticsError, AnalyticsResult};

/// The artifact namespaces a raster can live in.
///
/// Raw observations and COG copies are keyed by calendar date; LTA
/// baselines are keyed by dekad-of-year slot; anomaly rasters are keyed
/// by event date. Each kind maps to its own directory under the store
/// root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductKind {
    /// Raw ingested observation rasters.
    Raw,
    /// Lazily materialized cloud-optimized copies of raw rasters.
    Cog,
    /// Long-term-average baseline rasters (slot-keyed).
    Lta,
    /// Event-vs-baseline anomaly rasters.
    Anomaly,
}

impl ProductKind {
    /// Directory name of this namespace under the store root.
    pub fn dir(&self) -> &'static str {
        match self {
            ProductKind::Raw => "tif",
            ProductKind::Cog => "cog",
            ProductKind::Lta => "lta",
            ProductKind::Anomaly => "anom",
        }
    }

    /// Filename suffix appended before the `.tif` extension.
    pub fn suffix(&self) -> &'static str {
        match self {
            ProductKind::Raw => "",
            ProductKind::Cog => "_cog",
            ProductKind::Lta => "_lta",
            ProductKind::Anomaly => "_anom",
        }
    }

    /// Parse from string (case-insensitive), for CLI parameters.
    pub fn parse(s: &str) -> AnalyticsResult<Self> {
        match s.to_lowercase().as_str() {
            "raw" | "tif" => Ok(ProductKind::Raw),
            "cog" => Ok(ProductKind::Cog),
            "lta" => Ok(ProductKind::Lta),
            "anomaly" | "anom" => Ok(ProductKind::Anomaly),
            _ => Err(AnalyticsError::invalid_input(format!(
                "unknown product kind: {:?}",
                s
            ))),
        }
    }
}

impl fmt::Display for ProductKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProductKind::Raw => "raw",
            ProductKind::Cog => "cog",
            ProductKind::Lta => "lta",
            ProductKind::Anomaly => "anomaly",
        };
        write!(f, "{}", name)
    }
}
