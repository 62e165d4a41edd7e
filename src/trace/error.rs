// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TraceError {
    #[error("Couldn't get a sweep time from the file name '{0}'; expected <YYYYMMDD>_<HHMMSS>_trace.csv")]
    BadFileName(PathBuf),

    #[error("Row {row} has fewer than two columns")]
    ShortRow { row: usize },

    #[error("Row {row}: '{value}' is not a number")]
    BadValue { row: usize, value: String },

    #[error("The trace contains no readings")]
    NoReadings,

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    IO(#[from] std::io::Error),
}
