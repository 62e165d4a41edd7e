// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AggregationFactorError {
    #[error("The user input was 0; this is not permitted")]
    Zero,

    #[error("The user input '{0}' isn't a positive integer; this is not permitted")]
    NotInteger(String),
}

#[derive(Error, Debug)]
pub enum AggregationError {
    #[error("'{0}' has no file name")]
    NoFileName(PathBuf),

    #[error(transparent)]
    Matrix(#[from] crate::matrix::MatrixError),

    #[error(transparent)]
    Glob(#[from] crate::io::GlobError),

    #[error(transparent)]
    IO(#[from] std::io::Error),
}
