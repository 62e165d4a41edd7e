// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Per-frequency summaries of day matrices.
//!
//! The frequency axis of a matrix is split into chunks of rows, each chunk is
//! summarised on its own thread, and the results are put back together in
//! frequency order.

mod error;

pub use error::SummaryError;

use std::{
    fs::{create_dir_all, File},
    io::{BufWriter, Read},
    num::NonZeroUsize,
    ops::RangeInclusive,
    path::{Path, PathBuf},
};

use log::{debug, info, warn};
use rayon::prelude::*;
use regex::Regex;
use strum::IntoEnumIterator;

use crate::{
    aggregation::{aggregate_max, AggregationFactors},
    constants::{FREQ_COLUMN, MATRIX_SUFFIX, METRICS_SUFFIX, PEAK_SUFFIX, STAT_DECIMALS},
    io::find_files_with_suffix,
    make_progress_bar,
    math::{kurtosis, nan_max, nan_mean, nan_median, nan_min, round_to, skewness},
    matrix::{format_cell, DayMatrix},
    metrics::Metric,
    time::{date_from_file_name, DateRange},
    FileReport,
};

lazy_static::lazy_static! {
    static ref YEAR_DIRECTORY: Regex = Regex::new(r"[/\\](\d{4})[/\\]").expect("is a valid regex");
}

/// Statistics of one frequency's readings over a day. All values are rounded
/// to 4 decimal places.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrequencyStats {
    pub freq_ghz: f64,
    pub mean: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
    pub skew: f64,
    pub kurtosis: f64,
}

impl FrequencyStats {
    /// Summarise readings \[dBm\]. NaNs are ignored, except that any NaN makes
    /// the skew and kurtosis NaN.
    pub fn from_readings(freq_ghz: f64, readings: &[f64]) -> FrequencyStats {
        let r = |v: f64| round_to(v, STAT_DECIMALS);
        FrequencyStats {
            freq_ghz,
            mean: r(nan_mean(readings)),
            median: r(nan_median(readings)),
            min: r(nan_min(readings)),
            max: r(nan_max(readings)),
            skew: r(skewness(readings)),
            kurtosis: r(kurtosis(readings)),
        }
    }

    pub fn get(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Mean => self.mean,
            Metric::Median => self.median,
            Metric::Min => self.min,
            Metric::Max => self.max,
            Metric::Skew => self.skew,
            Metric::Kurtosis => self.kurtosis,
        }
    }

    fn set(&mut self, metric: Metric, value: f64) {
        match metric {
            Metric::Mean => self.mean = value,
            Metric::Median => self.median = value,
            Metric::Min => self.min = value,
            Metric::Max => self.max = value,
            Metric::Skew => self.skew = value,
            Metric::Kurtosis => self.kurtosis = value,
        }
    }
}

/// The highest power seen in a frequency block over a day.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeakPower {
    pub freq_ghz: f64,
    pub power_dbm: f64,
}

/// Chunks of `chunk_size` consecutive rows, as `(start, end)` indices.
fn row_chunks(num_rows: usize, chunk_size: NonZeroUsize) -> Vec<(usize, usize)> {
    (0..num_rows)
        .step_by(chunk_size.get())
        .map(|start| (start, (start + chunk_size.get()).min(num_rows)))
        .collect()
}

/// Get the statistics of every frequency of a matrix, in frequency order.
pub fn summarise(matrix: &DayMatrix, chunk_size: NonZeroUsize) -> Vec<FrequencyStats> {
    let chunks = row_chunks(matrix.num_freqs(), chunk_size);
    debug!(
        "Summarising {} frequencies in {} chunks",
        matrix.num_freqs(),
        chunks.len()
    );
    let mut stats: Vec<FrequencyStats> = chunks
        .into_par_iter()
        .flat_map_iter(|(start, end)| {
            (start..end).map(move |i| {
                let readings = matrix.data.row(i).to_vec();
                FrequencyStats::from_readings(matrix.freqs[i], &readings)
            })
        })
        .collect();
    stats.sort_by(|a, b| a.freq_ghz.total_cmp(&b.freq_ghz));
    stats
}

/// Aggregate a matrix by block maxima, then get the highest power of each
/// aggregated frequency over the whole day. Blocks are counted from the first
/// row of the matrix; `chunk_size` doesn't change them.
pub fn peak_summary(
    matrix: &DayMatrix,
    factors: AggregationFactors,
    chunk_size: NonZeroUsize,
) -> Vec<PeakPower> {
    let aggregated = aggregate_max(matrix, factors);
    let mut peaks: Vec<PeakPower> = row_chunks(aggregated.num_freqs(), chunk_size)
        .into_par_iter()
        .flat_map_iter(|(start, end)| {
            let aggregated = &aggregated;
            (start..end).map(move |i| PeakPower {
                freq_ghz: aggregated.freqs[i],
                power_dbm: nan_max(&aggregated.data.row(i).to_vec()),
            })
        })
        .collect();
    peaks.sort_by(|a, b| a.freq_ghz.total_cmp(&b.freq_ghz));
    peaks
}

/// Write statistics as a metrics CSV file.
pub fn write_metrics<P: AsRef<Path>>(path: P, stats: &[FrequencyStats]) -> Result<(), SummaryError> {
    let mut writer = csv::Writer::from_writer(BufWriter::new(File::create(path)?));
    let mut header = vec![FREQ_COLUMN];
    header.extend(Metric::iter().map(|m| m.column()));
    writer.write_record(&header)?;
    for s in stats {
        let mut record = vec![s.freq_ghz.to_string()];
        record.extend(Metric::iter().map(|m| format_cell(s.get(m))));
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

/// Read a metrics CSV file. Columns are found by name; any metric column that
/// is absent is NaN.
pub fn read_metrics<P: AsRef<Path>>(path: P) -> Result<Vec<FrequencyStats>, SummaryError> {
    read_metrics_from(File::open(path)?)
}

pub fn read_metrics_from<R: Read>(reader: R) -> Result<Vec<FrequencyStats>, SummaryError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = reader.headers()?.clone();
    let find = |name: &str| headers.iter().position(|h| h == name);
    let freq_col = find(FREQ_COLUMN).ok_or(SummaryError::MissingColumn(FREQ_COLUMN))?;
    let metric_cols: Vec<(Metric, usize)> = Metric::iter()
        .filter_map(|m| find(m.column()).map(|i| (m, i)))
        .collect();

    let mut stats = vec![];
    for (i_row, record) in reader.records().enumerate() {
        let record = record?;
        let row = i_row + 2;
        let field = |col: usize| -> Result<f64, SummaryError> {
            let value = record.get(col).unwrap_or("");
            if value.is_empty() {
                return Ok(f64::NAN);
            }
            value.parse().map_err(|_| SummaryError::BadValue {
                row,
                value: value.to_string(),
            })
        };

        let mut s = FrequencyStats {
            freq_ghz: field(freq_col)?,
            mean: f64::NAN,
            median: f64::NAN,
            min: f64::NAN,
            max: f64::NAN,
            skew: f64::NAN,
            kurtosis: f64::NAN,
        };
        for &(metric, col) in &metric_cols {
            s.set(metric, field(col)?);
        }
        stats.push(s);
    }
    Ok(stats)
}

/// Write peak powers as a `Frequency (GHz),Power (dBm)` CSV file.
pub fn write_peak_summary<P: AsRef<Path>>(path: P, peaks: &[PeakPower]) -> Result<(), SummaryError> {
    let mut writer = csv::Writer::from_writer(BufWriter::new(File::create(path)?));
    writer.write_record([FREQ_COLUMN, "Power (dBm)"])?;
    for p in peaks {
        writer.write_record([p.freq_ghz.to_string(), format_cell(p.power_dbm)])?;
    }
    writer.flush()?;
    Ok(())
}

/// Find a year directory in a path, e.g. 2021 in `/data/sh1/2021/x.csv`.
pub fn extract_year<P: AsRef<Path>>(path: P) -> Option<i32> {
    let path = path.as_ref().display().to_string();
    YEAR_DIRECTORY
        .captures(&path)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// What to produce for each matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryKind {
    /// Per-frequency statistics, written to `<YYYYMMDD>_metrics.csv`.
    Metrics,

    /// Peak power per aggregated frequency, written to `<YYYYMMDD>_summary.csv`.
    Peak(AggregationFactors),
}

/// Which matrix files to summarise.
#[derive(Debug, Clone, Default)]
pub struct MatrixSelection {
    /// Only files whose date prefix is in this range.
    pub dates: DateRange,

    /// If given, only files below a year directory inside this range.
    pub years: Option<RangeInclusive<i32>>,
}

impl MatrixSelection {
    pub fn matches(&self, path: &Path) -> bool {
        let date_ok = date_from_file_name(path)
            .map(|d| self.dates.contains(d))
            .unwrap_or(false);
        let year_ok = match &self.years {
            Some(years) => extract_year(path).map(|y| years.contains(&y)).unwrap_or(false),
            None => true,
        };
        date_ok && year_ok
    }
}

/// Summarise one matrix file into `out_dir`.
pub fn summarise_file(
    path: &Path,
    out_dir: &Path,
    kind: SummaryKind,
    chunk_size: NonZeroUsize,
) -> Result<PathBuf, SummaryError> {
    let date_part = path
        .file_name()
        .and_then(|n| n.to_str())
        .and_then(|n| n.split('_').next())
        .ok_or_else(|| SummaryError::BadFileName(path.to_path_buf()))?;
    let matrix = DayMatrix::read_csv(path)?;

    let out_file = match kind {
        SummaryKind::Metrics => {
            let out_file = out_dir.join(format!("{date_part}{METRICS_SUFFIX}"));
            write_metrics(&out_file, &summarise(&matrix, chunk_size))?;
            out_file
        }
        SummaryKind::Peak(factors) => {
            let out_file = out_dir.join(format!("{date_part}{PEAK_SUFFIX}"));
            write_peak_summary(&out_file, &peak_summary(&matrix, factors, chunk_size))?;
            out_file
        }
    };
    Ok(out_file)
}

/// Summarise every selected `*_matrix.csv` file at any depth below `input_dir`.
/// A file that fails is logged and the rest continue.
pub fn summarise_directory(
    input_dir: &Path,
    out_dir: &Path,
    selection: &MatrixSelection,
    kind: SummaryKind,
    chunk_size: NonZeroUsize,
) -> Result<FileReport, SummaryError> {
    let files: Vec<PathBuf> = find_files_with_suffix(input_dir, MATRIX_SUFFIX, true)?
        .into_iter()
        .filter(|p| selection.matches(p))
        .collect();
    info!("Summarising {} matrix files", files.len());
    create_dir_all(out_dir)?;

    let pb = make_progress_bar(files.len(), "Summarising", "files");
    let mut report = FileReport::default();
    for path in files {
        match summarise_file(&path, out_dir, kind, chunk_size) {
            Ok(out_file) => {
                info!("Summary statistics written to {}", out_file.display());
                report.written.push(out_file);
            }
            Err(e) => {
                warn!("Error processing {}: {e}", path.display());
                report.failed.push((path, e.to_string()));
            }
        }
        pb.inc(1);
    }
    pb.finish_with_message("Summarised");
    Ok(report)
}
