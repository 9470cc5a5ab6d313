//! Zonal query operations.

use chrono::NaiveDate;
use rayon::prelude::*;
use tracing::debug;

use dekad_common::dekad::{days_between, validate_range};
use dekad_common::{AnalyticsError, AnalyticsResult, CancelToken, ProductKind};
use raster_store::{GeoRaster, RasterStore};
use region_catalog::{Region, RegionCatalog};

use crate::mask::valid_values_in_region;
use crate::stats::{DailyStats, RangeOutcome, RegionalTotal, ZonalOutcome, ZonalStats};

/// Computes zonal statistics of raster values inside region polygons.
///
/// Range scans step day by day (never assuming fixed dekad lengths),
/// skip missing dates silently, and run dates in parallel with results
/// merged in date order.
pub struct ZonalAggregator<'a> {
    store: &'a RasterStore,
    catalog: &'a RegionCatalog,
}

impl<'a> ZonalAggregator<'a> {
    pub fn new(store: &'a RasterStore, catalog: &'a RegionCatalog) -> Self {
        Self { store, catalog }
    }

    /// Statistics for one region on one date.
    pub fn stats_for_date(
        &self,
        kind: ProductKind,
        date: NaiveDate,
        region_name: &str,
    ) -> AnalyticsResult<ZonalOutcome> {
        let region = self.catalog.resolve(region_name)?;
        let raster = self.store.open(kind, date)?;
        Ok(ZonalOutcome::from_values(&valid_values_in_region(
            &raster, region,
        )))
    }

    /// Day-stepped statistics over an inclusive date range.
    ///
    /// Dates with no artifact are skipped; a date whose artifact exists
    /// but cannot be decoded aborts the scan. Valid values from all
    /// contributing days are pooled into one aggregate population.
    pub fn stats_for_range(
        &self,
        kind: ProductKind,
        start: NaiveDate,
        end: NaiveDate,
        region_name: &str,
        cancel: &CancelToken,
    ) -> AnalyticsResult<RangeOutcome> {
        validate_range(start, end)?;
        let region = self.catalog.resolve(region_name)?;

        let dates: Vec<NaiveDate> = days_between(start, end).collect();
        let per_day: Vec<Option<(NaiveDate, Vec<f32>)>> = dates
            .par_iter()
            .map(|&date| {
                cancel.check()?;
                match self.day_values(kind, date, region)? {
                    Some(values) if !values.is_empty() => Ok(Some((date, values))),
                    _ => Ok(None),
                }
            })
            .collect::<AnalyticsResult<_>>()?;

        let mut daily = Vec::new();
        let mut pooled: Vec<f32> = Vec::new();
        for (date, values) in per_day.into_iter().flatten() {
            // rayon preserves input order, so records are already
            // sorted by date regardless of completion order
            if let Some(stats) = ZonalStats::from_values(&values) {
                daily.push(DailyStats { date, stats });
            }
            pooled.extend(values);
        }

        match ZonalStats::from_values(&pooled) {
            Some(aggregate) => Ok(RangeOutcome::Series { daily, aggregate }),
            None => Ok(RangeOutcome::NoData),
        }
    }

    /// Areal accumulation for every region in the catalog.
    ///
    /// For each region, each day's regional mean is computed (days
    /// without data skipped) and the means are summed. This is the
    /// sum-of-means policy, a deliberate approximation of areal
    /// accumulation; it is not an area-weighted volumetric total.
    pub fn areal_total_by_region(
        &self,
        kind: ProductKind,
        start: NaiveDate,
        end: NaiveDate,
        cancel: &CancelToken,
    ) -> AnalyticsResult<Vec<RegionalTotal>> {
        validate_range(start, end)?;

        let regions: Vec<&Region> = self.catalog.regions().collect();
        let dates: Vec<NaiveDate> = days_between(start, end).collect();

        // One raster open per date, shared across every region.
        let per_day: Vec<Option<Vec<Option<f64>>>> = dates
            .par_iter()
            .map(|&date| {
                cancel.check()?;
                let raster = match self.open_for_scan(kind, date)? {
                    Some(raster) => raster,
                    None => return Ok(None),
                };
                let means = regions
                    .iter()
                    .map(|region| {
                        let values = valid_values_in_region(&raster, region);
                        ZonalStats::from_values(&values).map(|s| s.mean)
                    })
                    .collect();
                Ok(Some(means))
            })
            .collect::<AnalyticsResult<_>>()?;

        let mut totals = vec![(0.0f64, 0usize); regions.len()];
        for day_means in per_day.into_iter().flatten() {
            for (slot, mean) in totals.iter_mut().zip(day_means) {
                if let Some(mean) = mean {
                    slot.0 += mean;
                    slot.1 += 1;
                }
            }
        }

        Ok(regions
            .iter()
            .zip(totals)
            .map(|(region, (total, days_used))| RegionalTotal {
                region: region.name.clone(),
                areal_total: (days_used > 0).then_some(total),
                days_used,
                mean_daily_value: (days_used > 0).then(|| total / days_used as f64),
            })
            .collect())
    }

    /// Masked valid values for one region on one date, or `None` when
    /// the date has no artifact.
    fn day_values(
        &self,
        kind: ProductKind,
        date: NaiveDate,
        region: &Region,
    ) -> AnalyticsResult<Option<Vec<f32>>> {
        Ok(self
            .open_for_scan(kind, date)?
            .map(|raster| valid_values_in_region(&raster, region)))
    }

    /// Open a raster inside a batched scan: absence is a skip, anything
    /// else (corruption, storage failure) aborts the scan.
    fn open_for_scan(
        &self,
        kind: ProductKind,
        date: NaiveDate,
    ) -> AnalyticsResult<Option<GeoRaster>> {
        match self.store.open(kind, date) {
            Ok(raster) => Ok(Some(raster)),
            Err(AnalyticsError::NotFound(_)) => {
                debug!(date = %date, "no raster artifact, skipping date");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }
}
