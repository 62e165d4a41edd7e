// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Reducing day matrices by taking the maximum over blocks of adjacent
//! frequencies and times.

mod error;

pub use error::{AggregationError, AggregationFactorError};

use std::{
    fs::create_dir_all,
    num::NonZeroUsize,
    path::{Path, PathBuf},
};

use log::{debug, info, warn};
use ndarray::{prelude::*, Zip};

use crate::{
    constants::{DEFAULT_FREQ_AGGREGATION, DEFAULT_TIME_AGGREGATION, MATRIX_SUFFIX},
    io::find_files_with_suffix,
    matrix::DayMatrix,
    FileReport,
};

/// How many adjacent frequencies and times are reduced into one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregationFactors {
    pub freq: NonZeroUsize,
    pub time: NonZeroUsize,
}

impl Default for AggregationFactors {
    fn default() -> Self {
        AggregationFactors {
            freq: NonZeroUsize::new(DEFAULT_FREQ_AGGREGATION).expect("is not zero"),
            time: NonZeroUsize::new(DEFAULT_TIME_AGGREGATION).expect("is not zero"),
        }
    }
}

impl AggregationFactors {
    pub fn new(freq: usize, time: usize) -> Result<AggregationFactors, AggregationFactorError> {
        Ok(AggregationFactors {
            freq: NonZeroUsize::new(freq).ok_or(AggregationFactorError::Zero)?,
            time: NonZeroUsize::new(time).ok_or(AggregationFactorError::Zero)?,
        })
    }

    /// Use the defaults for any factor that isn't given.
    pub fn from_options(
        freq: Option<usize>,
        time: Option<usize>,
    ) -> Result<AggregationFactors, AggregationFactorError> {
        let d = AggregationFactors::default();
        AggregationFactors::new(
            freq.unwrap_or_else(|| d.freq.get()),
            time.unwrap_or_else(|| d.time.get()),
        )
    }
}

impl std::fmt::Display for AggregationFactors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} channels × {} samples", self.freq, self.time)
    }
}

/// Parse a user-supplied aggregation factor. Only positive integers are
/// allowed.
pub fn parse_aggregation_factor(s: &str) -> Result<NonZeroUsize, AggregationFactorError> {
    let factor: usize = s
        .trim()
        .parse()
        .map_err(|_| AggregationFactorError::NotInteger(s.to_string()))?;
    NonZeroUsize::new(factor).ok_or(AggregationFactorError::Zero)
}

/// Reduce a matrix by taking the maximum of each block of `factors.freq` rows
/// by `factors.time` columns. The last block along either axis may be
/// smaller than the others; it is kept. Each block is labelled by its first
/// frequency and time. NaNs are ignored, so only an all-NaN block is NaN.
pub fn aggregate_max(matrix: &DayMatrix, factors: AggregationFactors) -> DayMatrix {
    let (num_freqs, num_times) = matrix.data.dim();
    let f = factors.freq.get();
    let t = factors.time.get();
    let shape = (num_freqs.div_ceil(f), num_times.div_ceil(t));
    debug!(
        "Aggregating a {num_freqs}x{num_times} matrix into {}x{}",
        shape.0, shape.1
    );

    let mut data = Array2::from_elem(shape, f64::NAN);
    Zip::indexed(&mut data).par_for_each(|(i, j), out| {
        let block = matrix.data.slice(s![
            i * f..(i + 1).saturating_mul(f).min(num_freqs),
            j * t..(j + 1).saturating_mul(t).min(num_times)
        ]);
        // `f64::max` returns the non-NaN argument.
        *out = block.iter().copied().fold(f64::NAN, f64::max);
    });

    DayMatrix {
        freqs: matrix.freqs.iter().step_by(f).copied().collect(),
        times: matrix.times.iter().step_by(t).copied().collect(),
        data,
    }
}

/// Aggregate an existing matrix file, writing the result under the same file
/// name in `out_dir`. The columns are put in time order first.
pub fn reaggregate_file(
    path: &Path,
    out_dir: &Path,
    factors: AggregationFactors,
) -> Result<PathBuf, AggregationError> {
    let mut matrix = DayMatrix::read_csv(path)?;
    matrix.sort_columns();
    let aggregated = aggregate_max(&matrix, factors);

    let file_name = path
        .file_name()
        .ok_or_else(|| AggregationError::NoFileName(path.to_path_buf()))?;
    create_dir_all(out_dir)?;
    let out_file = out_dir.join(file_name);
    aggregated.write_csv(&out_file)?;
    Ok(out_file)
}

/// Run [`reaggregate_file`] on every `*_matrix.csv` file directly inside
/// `input_dir`. A file that fails is logged and the rest continue.
pub fn reaggregate_directory(
    input_dir: &Path,
    out_dir: &Path,
    factors: AggregationFactors,
) -> Result<FileReport, AggregationError> {
    let files = find_files_with_suffix(input_dir, MATRIX_SUFFIX, false)?;
    info!("Re-aggregating {} matrix files by {factors}", files.len());

    let mut report = FileReport::default();
    for path in files {
        match reaggregate_file(&path, out_dir, factors) {
            Ok(out_file) => {
                report.written.push(out_file);
                info!(
                    "Processed file: {}, total processed: {}",
                    path.display(),
                    report.written.len()
                );
            }
            Err(e) => {
                warn!("Error processing {}: {e}", path.display());
                report.failed.push((path, e.to_string()));
            }
        }
    }
    Ok(report)
}
