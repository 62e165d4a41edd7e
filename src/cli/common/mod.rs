// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Common arguments for command-line interfaces. Many `rfimon` sub-commands
//! select days by a date range or aggregate matrices, so those arguments are
//! shared here.

mod printers;
#[cfg(test)]
mod tests;

pub(super) use printers::InfoPrinter;
pub(crate) use printers::{display_warnings, Warn};

use std::{borrow::Cow, num::NonZeroUsize, ops::RangeInclusive};

use clap::Parser;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};

use crate::{
    aggregation::{parse_aggregation_factor, AggregationFactorError, AggregationFactors},
    constants::{DEFAULT_CHUNK_SIZE, DEFAULT_FREQ_AGGREGATION, DEFAULT_TIME_AGGREGATION},
    metrics::Metric,
    time::{parse_date, DateRange, TimeError},
};

lazy_static::lazy_static! {
    pub(super) static ref ARG_FILE_TYPES_COMMA_SEPARATED: String = ArgFileTypes::iter().join(", ");

    pub(super) static ref ARG_FILE_HELP: String =
        format!("All arguments may be specified in a file. Any CLI arguments override arguments set in the file. Supported formats: {}", *ARG_FILE_TYPES_COMMA_SEPARATED);

    pub(super) static ref METRIC_HELP: String =
        format!("The metric to use. Supported metrics: {}", Metric::iter().join(", "));

    static ref FREQ_AGGREGATION_HELP: String =
        format!("The number of adjacent frequency channels reduced to their maximum. Default: {DEFAULT_FREQ_AGGREGATION}");

    static ref TIME_AGGREGATION_HELP: String =
        format!("The number of adjacent time samples reduced to their maximum. Default: {DEFAULT_TIME_AGGREGATION}");

    pub(super) static ref CHUNK_SIZE_HELP: String =
        format!("The number of frequencies handed to each summary worker. Default: {DEFAULT_CHUNK_SIZE}");
}

#[derive(Debug, Display, EnumIter, EnumString)]
pub(super) enum ArgFileTypes {
    #[strum(serialize = "toml")]
    Toml,
    #[strum(serialize = "json")]
    Json,
}

macro_rules! unpack_arg_file {
    ($arg_file:expr) => ({
        use std::{fs::File, io::Read, str::FromStr};

        use crate::cli::common::{ArgFileTypes, ARG_FILE_TYPES_COMMA_SEPARATED};

        debug!("Attempting to parse argument file {}", $arg_file.display());

        let mut contents = String::new();
        let arg_file_type = $arg_file
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .and_then(|e| ArgFileTypes::from_str(&e).ok());

        match arg_file_type {
            Some(ArgFileTypes::Toml) => {
                debug!("Parsing toml file...");
                let mut fh = File::open(&$arg_file)?;
                fh.read_to_string(&mut contents)?;
                match toml::from_str(&contents) {
                    Ok(p) => p,
                    Err(err) => {
                        return Err(RfimonError::ArgFile(format!(
                            "Couldn't decode toml structure from {:?}:\n{err}",
                            $arg_file
                        )))
                    }
                }
            }
            Some(ArgFileTypes::Json) => {
                debug!("Parsing json file...");
                let mut fh = File::open(&$arg_file)?;
                fh.read_to_string(&mut contents)?;
                match serde_json::from_str(&contents) {
                    Ok(p) => p,
                    Err(err) => {
                        return Err(RfimonError::ArgFile(format!(
                            "Couldn't decode json structure from {:?}:\n{err}",
                            $arg_file
                        )))
                    }
                }
            }

            _ => {
                return Err(RfimonError::ArgFile(format!(
                    "Argument file '{:?}' doesn't have a recognised file extension! Valid extensions are: {}", $arg_file, *ARG_FILE_TYPES_COMMA_SEPARATED)
                ))
            }
        }
    });
}

/// Problems with command-line arguments that aren't specific to one
/// sub-command.
#[derive(thiserror::Error, Debug)]
pub(super) enum ArgsError {
    #[error("No {0} was specified")]
    Missing(&'static str),

    #[error("At least one download worker is needed")]
    ZeroWorkers,

    #[error("{0}")]
    BadYears(String),

    #[cfg(not(feature = "plotting"))]
    #[error("rfimon was not compiled with the \"plotting\" feature; rebuild it with --features=plotting to make plots")]
    NoPlottingFeature,
}

/// Arguments selecting a range of days. Either end may be left open.
#[derive(Parser, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub(super) struct DateRangeArgs {
    /// The first day to use, as YYYYMMDD or YYYY-MM-DD. The default is the
    /// earliest day available.
    #[clap(long, help_heading = "DATES")]
    pub(super) start_date: Option<String>,

    /// The last day to use, as YYYYMMDD or YYYY-MM-DD. The default is the
    /// latest day available.
    #[clap(long, help_heading = "DATES")]
    pub(super) end_date: Option<String>,
}

impl DateRangeArgs {
    pub(super) fn merge(self, other: Self) -> Self {
        Self {
            start_date: self.start_date.or(other.start_date),
            end_date: self.end_date.or(other.end_date),
        }
    }

    pub(super) fn parse(&self) -> Result<DateRange, TimeError> {
        let start = self.start_date.as_deref().map(parse_date).transpose()?;
        let end = self.end_date.as_deref().map(parse_date).transpose()?;
        DateRange::new(start, end)
    }
}

/// Arguments for block-max aggregation of matrices.
#[derive(Parser, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub(super) struct AggregationArgs {
    #[clap(long, help = FREQ_AGGREGATION_HELP.as_str(), help_heading = "AGGREGATION")]
    pub(super) freq_aggregation: Option<String>,

    #[clap(long, help = TIME_AGGREGATION_HELP.as_str(), help_heading = "AGGREGATION")]
    pub(super) time_aggregation: Option<String>,
}

impl AggregationArgs {
    pub(super) fn merge(self, other: Self) -> Self {
        Self {
            freq_aggregation: self.freq_aggregation.or(other.freq_aggregation),
            time_aggregation: self.time_aggregation.or(other.time_aggregation),
        }
    }

    pub(super) fn parse(&self) -> Result<AggregationFactors, AggregationFactorError> {
        let defaults = AggregationFactors::default();
        Ok(AggregationFactors {
            freq: match &self.freq_aggregation {
                Some(s) => parse_aggregation_factor(s)?,
                None => defaults.freq,
            },
            time: match &self.time_aggregation {
                Some(s) => parse_aggregation_factor(s)?,
                None => defaults.time,
            },
        })
    }
}

/// Parse a chunk size, falling back to the default.
pub(super) fn parse_chunk_size(
    chunk_size: Option<&str>,
) -> Result<NonZeroUsize, AggregationFactorError> {
    match chunk_size {
        Some(s) => parse_aggregation_factor(s),
        None => NonZeroUsize::new(DEFAULT_CHUNK_SIZE).ok_or(AggregationFactorError::Zero),
    }
}

/// Parse a range of years like "2021-2023" or a single year like "2022".
pub(super) fn parse_year_range(s: &str) -> Result<RangeInclusive<i32>, ArgsError> {
    let bad = || ArgsError::BadYears(format!("'{s}' is not a year or a range of years (e.g. 2021-2023)"));
    let (first, last) = match s.trim().split_once('-') {
        Some((first, last)) => (first.trim(), last.trim()),
        None => (s.trim(), s.trim()),
    };
    let first: i32 = first.parse().map_err(|_| bad())?;
    let last: i32 = last.parse().map_err(|_| bad())?;
    if first > last {
        return Err(bad());
    }
    Ok(first..=last)
}

/// A line for an [`InfoPrinter`] describing a date range.
pub(super) fn describe_dates(range: DateRange) -> Cow<'static, str> {
    format!("Dates: {range}").into()
}
