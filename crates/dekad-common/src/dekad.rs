//! Dekad calendar model.
//!
//! A dekad is a ~10-day period starting on day 1, 11, or 21 of a month.
//! The third dekad of a month absorbs the remainder of the month, so its
//! length varies between 8 days (February) and 11 days (31-day months).
//! Every calendar date belongs to exactly one dekad.

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{AnalyticsError, AnalyticsResult};

/// Start days-of-month of the three dekads in every month.
pub const DEKAD_DAYS: [u32; 3] = [1, 11, 21];

/// A specific dekad: year, month, and start day-of-month (1, 11, or 21).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Dekad {
    pub year: i32,
    pub month: u32,
    /// Start day-of-month, one of 1, 11, 21.
    pub day: u32,
}

impl Dekad {
    /// The dekad containing the given calendar date.
    pub fn containing(date: NaiveDate) -> Self {
        let day = match date.day() {
            1..=10 => 1,
            11..=20 => 11,
            _ => 21,
        };
        Self {
            year: date.year(),
            month: date.month(),
            day,
        }
    }

    /// First dekad whose start date is on or after `date`.
    pub fn first_on_or_after(date: NaiveDate) -> Self {
        let dekad = Self::containing(date);
        if dekad.start_date() >= date {
            dekad
        } else {
            dekad.next()
        }
    }

    /// Start date of this dekad.
    pub fn start_date(&self) -> NaiveDate {
        // day is always one of 1/11/21, valid in every month
        NaiveDate::from_ymd_opt(self.year, self.month, self.day)
            .expect("dekad start day is always valid")
    }

    /// Inclusive end date of this dekad.
    ///
    /// The third dekad runs to the last day of the month.
    pub fn end_date(&self) -> NaiveDate {
        match self.day {
            1 => NaiveDate::from_ymd_opt(self.year, self.month, 10).unwrap(),
            11 => NaiveDate::from_ymd_opt(self.year, self.month, 20).unwrap(),
            _ => self.next().start_date() - Duration::days(1),
        }
    }

    /// The following dekad, rolling month and year boundaries.
    pub fn next(&self) -> Self {
        match self.day {
            1 => Self { day: 11, ..*self },
            11 => Self { day: 21, ..*self },
            _ => {
                if self.month == 12 {
                    Self {
                        year: self.year + 1,
                        month: 1,
                        day: 1,
                    }
                } else {
                    Self {
                        year: self.year,
                        month: self.month + 1,
                        day: 1,
                    }
                }
            }
        }
    }

    /// Whether `date` falls inside this dekad.
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start_date() && date <= self.end_date()
    }

    /// The year-independent climatological slot of this dekad.
    pub fn slot(&self) -> DekadSlot {
        DekadSlot {
            month: self.month,
            day: self.day,
        }
    }
}

impl fmt::Display for Dekad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

/// A dekad-of-year slot: (month, start day), 36 distinct values.
///
/// Formats as the 4-character `MMDD` key used for baseline artifacts
/// (e.g. "0321" for the third March dekad).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct DekadSlot {
    pub month: u32,
    pub day: u32,
}

impl DekadSlot {
    /// Create a slot, validating month and dekad day.
    pub fn new(month: u32, day: u32) -> AnalyticsResult<Self> {
        if !(1..=12).contains(&month) || !DEKAD_DAYS.contains(&day) {
            return Err(AnalyticsError::invalid_input(format!(
                "invalid dekad slot: month {} day {}",
                month, day
            )));
        }
        Ok(Self { month, day })
    }

    /// Parse a 4-character `MMDD` key.
    pub fn parse(s: &str) -> AnalyticsResult<Self> {
        if s.len() != 4 || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(AnalyticsError::invalid_input(format!(
                "invalid dekad slot key: {:?}",
                s
            )));
        }
        let month: u32 = s[..2].parse().unwrap();
        let day: u32 = s[2..].parse().unwrap();
        Self::new(month, day)
    }

    /// All 36 slots in calendar order.
    pub fn all() -> Vec<DekadSlot> {
        let mut slots = Vec::with_capacity(36);
        for month in 1..=12 {
            for &day in &DEKAD_DAYS {
                slots.push(DekadSlot { month, day });
            }
        }
        slots
    }
}

impl fmt::Display for DekadSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}{:02}", self.month, self.day)
    }
}

/// Iterator over dekads whose start dates lie in an inclusive date range.
///
/// This is the dekad-stepping iteration mode; for day-level scans use
/// [`days_between`], which steps one calendar day at a time.
pub fn dekads_between(start: NaiveDate, end: NaiveDate) -> DekadIter {
    DekadIter {
        next: Dekad::first_on_or_after(start),
        end,
    }
}

/// Iterator state for [`dekads_between`].
#[derive(Debug, Clone)]
pub struct DekadIter {
    next: Dekad,
    end: NaiveDate,
}

impl Iterator for DekadIter {
    type Item = Dekad;

    fn next(&mut self) -> Option<Dekad> {
        if self.next.start_date() > self.end {
            return None;
        }
        let current = self.next;
        self.next = current.next();
        Some(current)
    }
}

/// Iterator over every calendar day in an inclusive date range.
pub fn days_between(start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    start.iter_days().take_while(move |d| *d <= end)
}

/// Parse an ISO 8601 calendar date (no time component).
///
/// A malformed date is an [`AnalyticsError::InvalidInput`], distinct from
/// "date valid but no data exists for it".
pub fn parse_iso_date(s: &str) -> AnalyticsResult<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| AnalyticsError::invalid_input(format!("invalid date: {:?}", s)))
}

/// Validate that `start <= end`.
pub fn validate_range(start: NaiveDate, end: NaiveDate) -> AnalyticsResult<()> {
    if start > end {
        return Err(AnalyticsError::invalid_input(format!(
            "start date {} is after end date {}",
            start, end
        )));
    }
    Ok(())
}
