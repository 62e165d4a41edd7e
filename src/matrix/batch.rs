// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Turning directories of traces into day-matrix files.

use std::{
    fs::{create_dir_all, read_dir},
    path::{Path, PathBuf},
};

use chrono::NaiveDate;
use log::{debug, info, warn};
use rayon::prelude::*;

use super::{DayMatrix, MatrixError};
use crate::{
    aggregation::{aggregate_max, AggregationFactors},
    constants::{FILE_DATE_FORMAT, MATRIX_SUFFIX, TRACE_SUFFIX},
    io::find_files_with_suffix,
    make_progress_bar,
    time::{date_from_file_name, DateRange},
    trace::Trace,
    FileReport,
};

/// What happened to each day directory handed to [`process_all_days`].
#[derive(Debug, Default)]
pub struct BatchReport {
    /// The matrix files written.
    pub written: Vec<PathBuf>,

    /// Days without any usable trace.
    pub empty_days: Vec<NaiveDate>,

    /// Days that couldn't be processed, and why.
    pub failed: Vec<(NaiveDate, String)>,
}

/// Make the matrix of one day directory (named `YYYYMMDD`) from all of its
/// `*_trace.csv` files, and write it to `<out_dir>/<YYYYMMDD>_matrix.csv`.
/// Traces that can't be read are logged and skipped. If `aggregation` is
/// given, the block-max aggregated matrix is written instead.
///
/// Returns the path of the written file, or `None` if the day had no usable
/// traces.
pub fn process_day_directory(
    day_dir: &Path,
    out_dir: &Path,
    aggregation: Option<AggregationFactors>,
) -> Result<Option<PathBuf>, MatrixError> {
    let date = date_from_file_name(day_dir)
        .ok_or_else(|| MatrixError::NotADayDirectory(day_dir.to_path_buf()))?;
    let day = date.format(FILE_DATE_FORMAT).to_string();

    let trace_files = find_files_with_suffix(day_dir, TRACE_SUFFIX, false)?;
    debug!("{day}: found {} trace files", trace_files.len());
    let traces: Vec<Trace> = trace_files
        .par_iter()
        .filter_map(|path| match Trace::read(path) {
            Ok(t) => Some(t),
            Err(e) => {
                warn!("Error processing {}: {e}", path.display());
                None
            }
        })
        .collect();
    if traces.is_empty() {
        info!("No data processed for {day}");
        return Ok(None);
    }

    let mut matrix = DayMatrix::from_traces(&traces)?;
    if let Some(factors) = aggregation {
        matrix = aggregate_max(&matrix, factors);
    }

    create_dir_all(out_dir)?;
    let out_file = out_dir.join(format!("{day}{MATRIX_SUFFIX}"));
    matrix.write_csv(&out_file)?;
    info!("Matrix for {day} saved to {}", out_file.display());
    Ok(Some(out_file))
}

/// Run [`process_day_directory`] on every day directory in `input_dir` inside
/// `range`, in date order. Entries whose names aren't dates are skipped. A day
/// that fails doesn't stop the others.
pub fn process_all_days(
    input_dir: &Path,
    out_dir: &Path,
    range: DateRange,
    aggregation: Option<AggregationFactors>,
) -> Result<BatchReport, MatrixError> {
    let mut days: Vec<(NaiveDate, PathBuf)> = vec![];
    for entry in read_dir(input_dir)? {
        let path = entry?.path();
        if !path.is_dir() {
            continue;
        }
        match date_from_file_name(&path) {
            Some(date) if range.contains(date) => days.push((date, path)),
            Some(_) => (),
            None => warn!("Skipping '{}'; its name isn't a date", path.display()),
        }
    }
    days.sort_unstable();
    info!("Processing {} day directories ({range})", days.len());

    let pb = make_progress_bar(days.len(), "Building matrices", "days");
    let mut report = BatchReport::default();
    for (date, day_dir) in days {
        match process_day_directory(&day_dir, out_dir, aggregation) {
            Ok(Some(path)) => report.written.push(path),
            Ok(None) => report.empty_days.push(date),
            Err(e) => {
                warn!("Couldn't process {}: {e}", day_dir.display());
                report.failed.push((date, e.to_string()));
            }
        }
        pb.inc(1);
    }
    pb.finish_with_message("Built matrices");
    Ok(report)
}

/// Relabel the frequencies of every `*_matrix.csv` file directly inside
/// `input_dir` with those of `reference`, writing each under the same file
/// name in `out_dir`. A file that fails is logged and the rest continue.
pub fn relabel_directory(
    input_dir: &Path,
    out_dir: &Path,
    reference: &DayMatrix,
) -> Result<FileReport, MatrixError> {
    let files = find_files_with_suffix(input_dir, MATRIX_SUFFIX, false)?;
    info!("Relabelling {} matrix files", files.len());
    create_dir_all(out_dir)?;

    let mut report = FileReport::default();
    for path in files {
        let result = DayMatrix::read_csv(&path).and_then(|mut matrix| {
            matrix.relabel_frequencies(reference)?;
            // `find_files_with_suffix` only returns files, which have names.
            let out_file = out_dir.join(path.file_name().unwrap_or_default());
            matrix.write_csv(&out_file)?;
            Ok(out_file)
        });
        match result {
            Ok(out_file) => {
                info!("Processed {}", path.display());
                report.written.push(out_file);
            }
            Err(e) => {
                warn!("Error processing {}: {e}", path.display());
                report.failed.push((path, e.to_string()));
            }
        }
    }
    Ok(report)
}
