//! Climatological baselines and anomalies.
//!
//! The baseline builder stacks every available year of a dekad-of-year
//! slot into a per-pixel long-term-average raster; the anomaly engine
//! compares an observed dekad against its slot baseline, per pixel or as
//! a zonal series. Both persist their outputs as cacheable artifacts
//! keyed by slot or event date; recomputation is idempotent.

pub mod anomaly;
pub mod baseline;
pub mod resample;

pub use anomaly::{AnomalyEngine, AnomalyMode, AnomalyPoint};
pub use baseline::{BaselineBuilder, LtaBuildReport, YearRange};
pub use resample::resample_nearest;
