//! Event-vs-baseline anomaly computation.

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, info};

use dekad_common::dekad::{dekads_between, validate_range};
use dekad_common::{AnalyticsError, AnalyticsResult, CancelToken, Dekad, ProductKind};
use raster_store::{GeoRaster, RasterStore};
use region_catalog::RegionCatalog;
use zonal_stats::{valid_values_in_region, ZonalStats};

use crate::resample::resample_nearest;

/// How the deviation from the baseline is expressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AnomalyMode {
    /// event − baseline, in the product's units.
    Absolute,
    /// (event − baseline) / baseline × 100.
    Percentage,
}

impl AnomalyMode {
    /// Parse from string (case-insensitive), for CLI parameters.
    pub fn parse(s: &str) -> AnalyticsResult<Self> {
        match s.to_lowercase().as_str() {
            "absolute" | "abs" => Ok(AnomalyMode::Absolute),
            "percentage" | "percent" | "pct" => Ok(AnomalyMode::Percentage),
            _ => Err(AnalyticsError::invalid_input(format!(
                "unknown anomaly mode: {:?}",
                s
            ))),
        }
    }
}

impl std::fmt::Display for AnomalyMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnomalyMode::Absolute => write!(f, "absolute"),
            AnomalyMode::Percentage => write!(f, "percentage"),
        }
    }
}

/// One dekad of a zonal anomaly series: the region's mean on the event
/// raster and on the baseline raster, reported side by side.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnomalyPoint {
    pub date: NaiveDate,
    pub event_mean: f64,
    pub baseline_mean: f64,
}

/// Computes per-pixel and zonal deviations of observed dekad rasters
/// from their long-term-average baselines.
pub struct AnomalyEngine<'a> {
    store: &'a RasterStore,
    catalog: &'a RegionCatalog,
}

impl<'a> AnomalyEngine<'a> {
    pub fn new(store: &'a RasterStore, catalog: &'a RegionCatalog) -> Self {
        Self { store, catalog }
    }

    /// Compute and persist the anomaly raster for an event date.
    ///
    /// The event raster comes from the optimized namespace (raw
    /// fallback); the baseline from the date's dekad-of-year slot.
    /// Either side missing is `MissingInput`. A pixel is valid only when
    /// both inputs are valid, and percentage mode additionally requires
    /// a positive baseline; everything else is no-data in the output,
    /// never an infinity.
    pub fn compute(&self, date: NaiveDate, mode: AnomalyMode) -> AnalyticsResult<GeoRaster> {
        let slot = Dekad::containing(date).slot();

        let event = self.store.open_event(date).map_err(|err| {
            missing_if_absent(err, format!("event raster for {}", date))
        })?;
        let lta = self.store.open_lta(slot).map_err(|err| {
            missing_if_absent(err, format!("baseline raster for slot {}", slot))
        })?;

        let lta = if lta.same_shape(&event) {
            lta
        } else {
            debug!(
                slot = %slot,
                "resampling baseline {}x{} to event grid {}x{}",
                lta.width, lta.height, event.width, event.height
            );
            resample_nearest(&lta, event.width, event.height)
        };

        let data: Vec<f32> = event
            .data
            .iter()
            .zip(&lta.data)
            .map(|(&ev, &base)| anomaly_pixel(ev, base, mode))
            .collect();

        let anomaly = GeoRaster::new(
            data,
            event.width,
            event.height,
            event.transform,
            event.crs,
            event.nodata,
        );

        self.store.write(ProductKind::Anomaly, date, &anomaly)?;
        info!(date = %date, mode = %mode, "computed anomaly raster");
        Ok(anomaly)
    }

    /// Dekad-stepped series of regional event and baseline means.
    ///
    /// Each point computes the zonal mean on the event raster and the
    /// baseline raster independently, never by averaging a precomputed
    /// anomaly raster. Dekads missing either raster, or yielding an
    /// empty masked set on either side, are skipped.
    pub fn zonal_series(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        region_name: &str,
        cancel: &CancelToken,
    ) -> AnalyticsResult<Vec<AnomalyPoint>> {
        validate_range(start, end)?;
        let region = self.catalog.resolve(region_name)?;

        let mut points = Vec::new();
        for dekad in dekads_between(start, end) {
            cancel.check()?;
            let date = dekad.start_date();

            let event = match self.store.open_event(date) {
                Ok(raster) => raster,
                Err(AnalyticsError::NotFound(_)) => {
                    debug!(date = %date, "no event raster, skipping dekad");
                    continue;
                }
                Err(err) => return Err(err),
            };
            let lta = match self.store.open_lta(dekad.slot()) {
                Ok(raster) => raster,
                Err(AnalyticsError::NotFound(_)) => {
                    debug!(slot = %dekad.slot(), "no baseline raster, skipping dekad");
                    continue;
                }
                Err(err) => return Err(err),
            };

            let event_values = valid_values_in_region(&event, region);
            let lta_values = valid_values_in_region(&lta, region);
            let (Some(event_stats), Some(lta_stats)) = (
                ZonalStats::from_values(&event_values),
                ZonalStats::from_values(&lta_values),
            ) else {
                debug!(date = %date, "empty masked set, skipping dekad");
                continue;
            };

            points.push(AnomalyPoint {
                date,
                event_mean: event_stats.mean,
                baseline_mean: lta_stats.mean,
            });
        }

        Ok(points)
    }
}

/// Per-pixel anomaly rule.
fn anomaly_pixel(event: f32, baseline: f32, mode: AnomalyMode) -> f32 {
    if event.is_nan() || baseline.is_nan() {
        return f32::NAN;
    }
    match mode {
        AnomalyMode::Absolute => event - baseline,
        AnomalyMode::Percentage => {
            if baseline <= 0.0 {
                f32::NAN
            } else {
                (event - baseline) / baseline * 100.0
            }
        }
    }
}

fn missing_if_absent(err: AnalyticsError, what: String) -> AnalyticsError {
    if err.is_not_found() {
        AnalyticsError::MissingInput(what)
    } else {
        err
    }
}
