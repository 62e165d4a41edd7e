// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Long time series of one frequency, taken from many day matrices.

mod error;

pub use error::TimeseriesError;

use std::{
    collections::BTreeMap,
    fs::{read_dir, File},
    io::BufWriter,
    path::Path,
};

use chrono::{NaiveDate, NaiveDateTime};
use log::{debug, info, warn};

use crate::{
    matrix::{format_cell, DayMatrix},
    time::{date_from_file_name, DateRange},
};

/// One reading of a frequency.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub timestamp: NaiveDateTime,
    pub power_dbm: f64,
}

/// How often a frequency was above a threshold on one day.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailyOccupancy {
    pub date: NaiveDate,
    pub percent_above: f64,
}

/// Collect every reading of `freq_ghz` from the matrix files in the year
/// directories of `base_dir` (e.g. `base_dir/2021/20210101_matrix.csv`) whose
/// dates are in `range`. Matrices without a row for the frequency contribute
/// nothing. The samples are in time order.
pub fn extract_frequency_series(
    base_dir: &Path,
    range: DateRange,
    freq_ghz: f64,
) -> Result<Vec<Sample>, TimeseriesError> {
    let mut samples = vec![];
    let mut num_files = 0;
    for year_dir in read_dir(base_dir)? {
        let year_dir = year_dir?.path();
        if !year_dir.is_dir() {
            continue;
        }
        for entry in read_dir(&year_dir)? {
            let path = entry?.path();
            let date = match date_from_file_name(&path) {
                Some(d) if range.contains(d) => d,
                _ => continue,
            };
            let matrix = match DayMatrix::read_csv(&path) {
                Ok(m) => m,
                Err(e) => {
                    warn!("Error processing {}: {e}", path.display());
                    continue;
                }
            };
            num_files += 1;
            match matrix.row_for_frequency(freq_ghz) {
                Some(row) => samples.extend(matrix.times.iter().zip(row.iter()).map(
                    |(&time, &power_dbm)| Sample {
                        timestamp: date.and_time(time),
                        power_dbm,
                    },
                )),
                None => debug!("{} has no row for {freq_ghz} GHz", path.display()),
            }
        }
    }
    info!(
        "Collected {} samples at {freq_ghz} GHz from {num_files} files",
        samples.len()
    );

    samples.sort_by_key(|s| s.timestamp);
    Ok(samples)
}

/// The percentage of each day's samples strictly above `threshold_dbm`.
/// Samples without a reading count towards the total but are never above the
/// threshold.
pub fn percent_above_threshold(samples: &[Sample], threshold_dbm: f64) -> Vec<DailyOccupancy> {
    let mut per_day: BTreeMap<NaiveDate, (usize, usize)> = BTreeMap::new();
    for s in samples {
        let (above, total) = per_day.entry(s.timestamp.date()).or_default();
        if s.power_dbm > threshold_dbm {
            *above += 1;
        }
        *total += 1;
    }
    per_day
        .into_iter()
        .map(|(date, (above, total))| DailyOccupancy {
            date,
            percent_above: above as f64 / total as f64 * 100.0,
        })
        .collect()
}

/// Write occupancies as a `Date,PercentAboveThreshold` CSV file.
pub fn write_occupancy<P: AsRef<Path>>(
    path: P,
    occupancy: &[DailyOccupancy],
) -> Result<(), TimeseriesError> {
    let mut writer = csv::Writer::from_writer(BufWriter::new(File::create(path)?));
    writer.write_record(["Date", "PercentAboveThreshold"])?;
    for o in occupancy {
        writer.write_record([
            o.date.format("%Y-%m-%d").to_string(),
            format_cell(o.percent_above),
        ])?;
    }
    writer.flush()?;
    Ok(())
}
