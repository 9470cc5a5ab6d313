//! Meteorological-season aggregation.
//!
//! Groups scalar daily event values into DJF/MAM/JJA/SON buckets per
//! calendar year and reduces by sum or mean. This aggregator works on a
//! tabular event log, not on rasters.
//!
//! December is assigned to its own calendar year's DJF bucket, not the
//! following year's; the grouping is by plain calendar year.

use std::collections::HashMap;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use dekad_common::dekad::validate_range;
use dekad_common::{AnalyticsError, AnalyticsResult};

/// Meteorological season, assigned from the event month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Season {
    /// December, January, February.
    Djf,
    /// March, April, May.
    Mam,
    /// June, July, August.
    Jja,
    /// September, October, November.
    Son,
}

impl Season {
    pub fn from_month(month: u32) -> Self {
        match month {
            12 | 1 | 2 => Season::Djf,
            3..=5 => Season::Mam,
            6..=8 => Season::Jja,
            _ => Season::Son,
        }
    }
}

impl std::fmt::Display for Season {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Season::Djf => "DJF",
            Season::Mam => "MAM",
            Season::Jja => "JJA",
            Season::Son => "SON",
        };
        write!(f, "{}", name)
    }
}

/// Reduction applied to each (year, season) bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SeasonalMetric {
    Sum,
    Mean,
}

impl SeasonalMetric {
    /// Parse from string (case-insensitive), for CLI parameters.
    pub fn parse(s: &str) -> AnalyticsResult<Self> {
        match s.to_lowercase().as_str() {
            "sum" => Ok(SeasonalMetric::Sum),
            "mean" | "avg" => Ok(SeasonalMetric::Mean),
            _ => Err(AnalyticsError::invalid_input(format!(
                "unknown seasonal metric: {:?}",
                s
            ))),
        }
    }
}

/// One row of the tabular event log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonalEvent {
    pub date: NaiveDate,
    #[serde(default)]
    pub region: Option<String>,
    pub value: f64,
}

/// A reduced (year, season) bucket.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeasonalValue {
    pub year: i32,
    pub season: Season,
    pub value: f64,
}

/// Group events into (year, season) buckets and reduce.
///
/// Events outside the inclusive date range are dropped; when a region
/// filter is given, only events tagged with that exact region count.
/// Output is sorted by year, then season in calendar order.
pub fn summarize(
    events: &[SeasonalEvent],
    start: NaiveDate,
    end: NaiveDate,
    region: Option<&str>,
    metric: SeasonalMetric,
) -> AnalyticsResult<Vec<SeasonalValue>> {
    validate_range(start, end)?;

    let mut buckets: HashMap<(i32, Season), (f64, usize)> = HashMap::new();

    for event in events {
        if event.date < start || event.date > end {
            continue;
        }
        if let Some(wanted) = region {
            if event.region.as_deref() != Some(wanted) {
                continue;
            }
        }

        let key = (event.date.year(), Season::from_month(event.date.month()));
        let bucket = buckets.entry(key).or_insert((0.0, 0));
        bucket.0 += event.value;
        bucket.1 += 1;
    }

    let mut values: Vec<SeasonalValue> = buckets
        .into_iter()
        .map(|((year, season), (sum, count))| SeasonalValue {
            year,
            season,
            value: match metric {
                SeasonalMetric::Sum => sum,
                SeasonalMetric::Mean => sum / count as f64,
            },
        })
        .collect();

    values.sort_by_key(|v| (v.year, v.season));
    Ok(values)
}
