// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SummaryError {
    #[error("Couldn't get a date from the file name '{0}'")]
    BadFileName(PathBuf),

    #[error("The column '{0}' is missing")]
    MissingColumn(&'static str),

    #[error("Row {row}: '{value}' is not a number")]
    BadValue { row: usize, value: String },

    #[error(transparent)]
    Matrix(#[from] crate::matrix::MatrixError),

    #[error(transparent)]
    Glob(#[from] crate::io::GlobError),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    IO(#[from] std::io::Error),
}
