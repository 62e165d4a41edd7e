// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Error type for all rfimon-related errors. This should be the *only* error
//! enum that is publicly visible from the CLI.

use thiserror::Error;

use super::common::ArgsError;
use crate::{
    aggregation::{AggregationError, AggregationFactorError},
    download::DownloadError,
    io::GlobError,
    matrix::MatrixError,
    metrics::MetricsError,
    summary::SummaryError,
    time::TimeError,
    timeseries::TimeseriesError,
    trace::TraceError,
};

/// The *only* publicly visible error from rfimon. Errors are grouped by the
/// stage of processing they come from, which is named in the message.
#[derive(Error, Debug)]
pub enum RfimonError {
    /// An error while fetching or unpacking archives.
    #[error("{0}\n\nCheck the archive URL and that the output directory is writable.")]
    Download(String),

    /// An error related to raw trace files.
    #[error("Trace file: {0}")]
    Trace(String),

    /// An error related to day matrices.
    #[error("Day matrix: {0}")]
    Matrix(String),

    /// An error related to aggregation factors or re-aggregation.
    #[error("Aggregation: {0}")]
    Aggregation(String),

    /// An error while summarising matrices.
    #[error("Summary: {0}")]
    Summary(String),

    /// An error while analysing metrics files.
    #[error("Metrics: {0}")]
    Metrics(String),

    /// An error related to dates given by the user.
    #[error("{0}\n\nDates are written as YYYYMMDD or YYYY-MM-DD.")]
    Dates(String),

    /// An error while plotting.
    #[error("Plotting: {0}")]
    Plotting(String),

    /// An error related to argument files.
    #[error("{0}")]
    ArgFile(String),

    /// A generic error that can't be clarified further, e.g. IO errors.
    #[error("{0}")]
    Generic(String),
}

// When changing the error propagation below, ensure `Self::from(e)` uses the
// correct `e`!

impl From<ArgsError> for RfimonError {
    fn from(e: ArgsError) -> Self {
        let s = e.to_string();
        match e {
            ArgsError::Missing(_) | ArgsError::BadYears(_) => Self::Generic(s),
            ArgsError::ZeroWorkers => Self::Download(s),
            #[cfg(not(feature = "plotting"))]
            ArgsError::NoPlottingFeature => Self::Plotting(s),
        }
    }
}

impl From<DownloadError> for RfimonError {
    fn from(e: DownloadError) -> Self {
        match e {
            DownloadError::IO(e) => Self::from(e),
            _ => Self::Download(e.to_string()),
        }
    }
}

impl From<TraceError> for RfimonError {
    fn from(e: TraceError) -> Self {
        let s = e.to_string();
        match e {
            TraceError::BadFileName(_)
            | TraceError::ShortRow { .. }
            | TraceError::BadValue { .. }
            | TraceError::NoReadings
            | TraceError::Csv(_) => Self::Trace(s),
            TraceError::IO(e) => Self::from(e),
        }
    }
}

impl From<MatrixError> for RfimonError {
    fn from(e: MatrixError) -> Self {
        let s = e.to_string();
        match e {
            MatrixError::NoTraces
            | MatrixError::ShapeMismatch { .. }
            | MatrixError::BadTimeLabel(_)
            | MatrixError::BadValue { .. }
            | MatrixError::RowLength { .. }
            | MatrixError::ReferenceTooShort { .. }
            | MatrixError::NotADayDirectory(_)
            | MatrixError::Shape(_)
            | MatrixError::Csv(_) => Self::Matrix(s),
            MatrixError::Glob(e) => Self::from(e),
            MatrixError::IO(e) => Self::from(e),
        }
    }
}

impl From<AggregationFactorError> for RfimonError {
    fn from(e: AggregationFactorError) -> Self {
        Self::Aggregation(e.to_string())
    }
}

impl From<AggregationError> for RfimonError {
    fn from(e: AggregationError) -> Self {
        match e {
            AggregationError::NoFileName(_) => Self::Aggregation(e.to_string()),
            AggregationError::Matrix(e) => Self::from(e),
            AggregationError::Glob(e) => Self::from(e),
            AggregationError::IO(e) => Self::from(e),
        }
    }
}

impl From<SummaryError> for RfimonError {
    fn from(e: SummaryError) -> Self {
        let s = e.to_string();
        match e {
            SummaryError::BadFileName(_)
            | SummaryError::MissingColumn(_)
            | SummaryError::BadValue { .. }
            | SummaryError::Csv(_) => Self::Summary(s),
            SummaryError::Matrix(e) => Self::from(e),
            SummaryError::Glob(e) => Self::from(e),
            SummaryError::IO(e) => Self::from(e),
        }
    }
}

impl From<MetricsError> for RfimonError {
    fn from(e: MetricsError) -> Self {
        let s = e.to_string();
        match e {
            MetricsError::NoMetricsFiles { .. }
            | MetricsError::Empty
            | MetricsError::MissingColumn(_)
            | MetricsError::BadValue { .. }
            | MetricsError::Csv(_) => Self::Metrics(s),
            MetricsError::Time(e) => Self::from(e),
            MetricsError::Glob(e) => Self::from(e),
            MetricsError::IO(e) => Self::from(e),
        }
    }
}

impl From<TimeseriesError> for RfimonError {
    fn from(e: TimeseriesError) -> Self {
        match e {
            TimeseriesError::Csv(_) => Self::Matrix(e.to_string()),
            TimeseriesError::IO(e) => Self::from(e),
        }
    }
}

impl From<TimeError> for RfimonError {
    fn from(e: TimeError) -> Self {
        Self::Dates(e.to_string())
    }
}

#[cfg(feature = "plotting")]
impl From<crate::plotting::DrawError> for RfimonError {
    fn from(e: crate::plotting::DrawError) -> Self {
        Self::Plotting(e.to_string())
    }
}

impl From<GlobError> for RfimonError {
    fn from(e: GlobError) -> Self {
        Self::Generic(e.to_string())
    }
}

impl From<std::io::Error> for RfimonError {
    fn from(e: std::io::Error) -> Self {
        Self::Generic(e.to_string())
    }
}

impl From<reqwest::Error> for RfimonError {
    fn from(e: reqwest::Error) -> Self {
        Self::Download(e.to_string())
    }
}

impl From<toml::ser::Error> for RfimonError {
    fn from(e: toml::ser::Error) -> Self {
        Self::ArgFile(e.to_string())
    }
}
