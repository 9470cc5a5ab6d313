//! Long-term-average baseline construction.

use chrono::NaiveDate;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};

use dekad_common::{AnalyticsError, AnalyticsResult, DekadSlot};
use raster_store::{GeoRaster, RasterStore};

/// Inclusive range of contributing years.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct YearRange {
    pub start: i32,
    pub end: i32,
}

impl YearRange {
    pub fn new(start: i32, end: i32) -> AnalyticsResult<Self> {
        if start > end {
            return Err(AnalyticsError::invalid_input(format!(
                "start year {} is after end year {}",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    pub fn years(&self) -> impl Iterator<Item = i32> {
        self.start..=self.end
    }
}

/// Outcome of a full 36-slot baseline sweep.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LtaBuildReport {
    /// Slots built and persisted.
    pub built: Vec<String>,
    /// Slots with zero contributing years.
    pub empty: Vec<String>,
}

/// Builds per-pixel long-term-average rasters, one per dekad-of-year
/// slot, across a configured span of years.
pub struct BaselineBuilder<'a> {
    store: &'a RasterStore,
    years: YearRange,
}

impl<'a> BaselineBuilder<'a> {
    pub fn new(store: &'a RasterStore, years: YearRange) -> Self {
        Self { store, years }
    }

    /// Build and persist the baseline raster for one slot.
    ///
    /// Years with no raster are skipped. Each output pixel is the mean
    /// of the years with valid data at that pixel; a pixel no year
    /// observed is no-data. Zero contributing years overall is
    /// `InsufficientData`. Contributions are accumulated in f64 in
    /// ascending year order, so recomputation is bit-identical.
    pub fn build_slot(&self, slot: DekadSlot) -> AnalyticsResult<GeoRaster> {
        let mut reference: Option<GeoRaster> = None;
        let mut sums: Vec<f64> = Vec::new();
        let mut counts: Vec<u32> = Vec::new();
        let mut contributing = 0usize;

        for year in self.years.years() {
            let date = NaiveDate::from_ymd_opt(year, slot.month, slot.day)
                .expect("dekad slot day is always valid");

            let raster = match self.store.open_event(date) {
                Ok(raster) => raster,
                Err(AnalyticsError::NotFound(_)) => {
                    debug!(year, slot = %slot, "no raster for year, skipping");
                    continue;
                }
                Err(err) => return Err(err),
            };

            match &reference {
                Some(reference) => {
                    if !reference.same_shape(&raster) {
                        warn!(
                            year,
                            slot = %slot,
                            "raster dimensions differ from reference year, skipping"
                        );
                        continue;
                    }
                }
                None => {
                    sums = vec![0.0; raster.len()];
                    counts = vec![0; raster.len()];
                    reference = Some(raster.clone());
                }
            }

            for (i, &v) in raster.data.iter().enumerate() {
                if !v.is_nan() {
                    sums[i] += v as f64;
                    counts[i] += 1;
                }
            }
            contributing += 1;
        }

        let Some(reference) = reference else {
            return Err(AnalyticsError::InsufficientData(format!(
                "no contributing years for slot {} in {}..={}",
                slot, self.years.start, self.years.end
            )));
        };

        let data: Vec<f32> = sums
            .iter()
            .zip(&counts)
            .map(|(&sum, &count)| {
                if count == 0 {
                    f32::NAN
                } else {
                    (sum / count as f64) as f32
                }
            })
            .collect();

        let lta = GeoRaster::new(
            data,
            reference.width,
            reference.height,
            reference.transform,
            reference.crs,
            None,
        );

        self.store.write_lta(slot, &lta)?;
        info!(slot = %slot, years = contributing, "built baseline raster");
        Ok(lta)
    }

    /// Build every slot that has data, reporting the ones that do not.
    ///
    /// Slots are independent, so the sweep runs them in parallel; the
    /// report lists slots in calendar order regardless of completion
    /// order.
    pub fn build_all(&self) -> AnalyticsResult<LtaBuildReport> {
        let outcomes: Vec<(DekadSlot, bool)> = DekadSlot::all()
            .into_par_iter()
            .map(|slot| match self.build_slot(slot) {
                Ok(_) => Ok((slot, true)),
                Err(AnalyticsError::InsufficientData(_)) => Ok((slot, false)),
                Err(err) => Err(err),
            })
            .collect::<AnalyticsResult<_>>()?;

        let mut report = LtaBuildReport::default();
        for (slot, built) in outcomes {
            if built {
                report.built.push(slot.to_string());
            } else {
                report.empty.push(slot.to_string());
            }
        }
        Ok(report)
    }
}
