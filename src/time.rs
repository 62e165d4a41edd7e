// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Helper functions around dates and times.
//!
//! Every product of the campaign is named after the day it belongs to, e.g.
//! `20240516_matrix.csv`, so most file selection is done by dates parsed out of
//! file names.

use std::path::Path;

use chrono::{Datelike, NaiveDate, NaiveTime, Timelike};
use thiserror::Error;

use crate::constants::FILE_DATE_FORMAT;

/// An inclusive range of calendar days. Either end may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Result<DateRange, TimeError> {
        if let (Some(start), Some(end)) = (start, end) {
            if start > end {
                return Err(TimeError::BackwardsRange { start, end });
            }
        }
        Ok(DateRange { start, end })
    }

    /// Everything on or after `start`.
    pub fn since(start: NaiveDate) -> DateRange {
        DateRange {
            start: Some(start),
            end: None,
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start.map(|s| date >= s).unwrap_or(true)
            && self.end.map(|e| date <= e).unwrap_or(true)
    }

    /// Every day of the range, in order. Both ends must be known.
    pub fn days(&self) -> Result<Vec<NaiveDate>, TimeError> {
        match (self.start, self.end) {
            (Some(start), Some(end)) => Ok(start.iter_days().take_while(|d| *d <= end).collect()),
            _ => Err(TimeError::OpenRange),
        }
    }
}

impl std::fmt::Display for DateRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.start, self.end) {
            (Some(s), Some(e)) => write!(f, "{s} to {e}"),
            (Some(s), None) => write!(f, "{s} onwards"),
            (None, Some(e)) => write!(f, "up to {e}"),
            (None, None) => write!(f, "all dates"),
        }
    }
}

/// Parse a date written either as `YYYYMMDD` or `YYYY-MM-DD`.
pub fn parse_date(s: &str) -> Result<NaiveDate, TimeError> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, FILE_DATE_FORMAT)
        .or_else(|_| NaiveDate::parse_from_str(s, "%Y-%m-%d"))
        .map_err(|_| TimeError::BadDate(s.to_string()))
}

/// Get the date of a campaign file or directory from its name; the date is the
/// first 8 characters, e.g. `20240516_matrix.csv` or `20240516/`.
pub fn date_from_file_name<P: AsRef<Path>>(path: P) -> Option<NaiveDate> {
    let name = path.as_ref().file_name()?.to_str()?;
    let prefix = name.get(..8)?;
    NaiveDate::parse_from_str(prefix, FILE_DATE_FORMAT).ok()
}

/// The number of hours since midnight, e.g. 06:30:00 is 6.5.
pub fn hours_since_midnight(t: NaiveTime) -> f64 {
    t.hour() as f64 + t.minute() as f64 / 60.0 + t.second() as f64 / 3600.0
}

/// The date as a fractional year, e.g. 2021-07-02 is about 2021.5. Used for
/// plotting long time series on a numeric axis.
pub fn fractional_year(d: NaiveDate) -> f64 {
    let days_in_year = if NaiveDate::from_ymd_opt(d.year(), 2, 29).is_some() {
        366.0
    } else {
        365.0
    };
    d.year() as f64 + d.ordinal0() as f64 / days_in_year
}

#[derive(Error, Debug)]
pub enum TimeError {
    #[error("'{0}' is not a date; expected YYYYMMDD or YYYY-MM-DD")]
    BadDate(String),

    #[error("The start date ({start}) is after the end date ({end})")]
    BackwardsRange { start: NaiveDate, end: NaiveDate },

    #[error("Both a start and an end date are required here")]
    OpenRange,
}
