//! Statistic types and reductions.

use chrono::NaiveDate;
use serde::Serialize;

/// Scalar statistics over a masked pixel population.
///
/// `std_dev` is the population standard deviation. `count` is always
/// greater than zero; an empty population is represented by
/// [`ZonalOutcome::NoData`] instead.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ZonalStats {
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    pub std_dev: f64,
    pub count: usize,
}

impl ZonalStats {
    /// Reduce a set of valid (non-NaN) values. Returns `None` if empty.
    pub fn from_values(values: &[f32]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }

        let count = values.len();
        let mut sum = 0.0f64;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for &v in values {
            let v = v as f64;
            sum += v;
            min = min.min(v);
            max = max.max(v);
        }
        let mean = sum / count as f64;

        let var = values
            .iter()
            .map(|&v| {
                let d = v as f64 - mean;
                d * d
            })
            .sum::<f64>()
            / count as f64;

        Some(Self {
            mean,
            min,
            max,
            std_dev: var.sqrt(),
            count,
        })
    }
}

/// Outcome of a single-raster zonal query.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ZonalOutcome {
    /// Statistics over a non-empty masked population.
    Stats(ZonalStats),
    /// The raster exists but no valid pixel falls inside the region.
    NoData,
}

impl ZonalOutcome {
    pub fn from_values(values: &[f32]) -> Self {
        match ZonalStats::from_values(values) {
            Some(stats) => ZonalOutcome::Stats(stats),
            None => ZonalOutcome::NoData,
        }
    }

    pub fn stats(&self) -> Option<&ZonalStats> {
        match self {
            ZonalOutcome::Stats(stats) => Some(stats),
            ZonalOutcome::NoData => None,
        }
    }
}

/// One day's statistics inside a range scan.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyStats {
    pub date: NaiveDate,
    #[serde(flatten)]
    pub stats: ZonalStats,
}

/// Outcome of a day-stepped range scan.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RangeOutcome {
    /// Every date in the range was missing or masked out.
    NoData,
    /// Per-day records plus one aggregate over the pooled population.
    Series {
        daily: Vec<DailyStats>,
        aggregate: ZonalStats,
    },
}

/// Areal accumulation for one region over a date range.
///
/// `areal_total` is the sum of per-day regional means (not an
/// area-weighted volumetric total); days without data are skipped and
/// counted out of `days_used`. A region with zero contributing days
/// carries `None` totals rather than a fabricated zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionalTotal {
    pub region: String,
    pub areal_total: Option<f64>,
    pub days_used: usize,
    pub mean_daily_value: Option<f64>,
}
