// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Errors associated with day matrices.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MatrixError {
    #[error("No traces were supplied; can't make a matrix")]
    NoTraces,

    #[error("The matrix data has shape ({rows}, {cols}), but there are {freqs} frequencies and {times} times")]
    ShapeMismatch {
        rows: usize,
        cols: usize,
        freqs: usize,
        times: usize,
    },

    #[error("'{0}' is not a HH:MM:SS time label")]
    BadTimeLabel(String),

    #[error("Row {row}, column {col}: '{value}' is not a number")]
    BadValue {
        row: usize,
        col: usize,
        value: String,
    },

    #[error("Row {row} has {got} fields, but the header has {expected}")]
    RowLength {
        row: usize,
        expected: usize,
        got: usize,
    },

    #[error("The reference matrix only has {reference} frequencies, but {needed} are needed")]
    ReferenceTooShort { reference: usize, needed: usize },

    #[error("'{0}' isn't a day directory; its name must be a YYYYMMDD date")]
    NotADayDirectory(PathBuf),

    #[error(transparent)]
    Glob(#[from] crate::io::GlobError),

    #[error(transparent)]
    Shape(#[from] ndarray::ShapeError),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    IO(#[from] std::io::Error),
}
