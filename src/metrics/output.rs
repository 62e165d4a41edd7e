// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! CSV files of metrics analyses. Dates are written as `YYYY-MM-DD` and NaN as
//! an empty field.

use std::{
    fs::File,
    io::{BufWriter, Read, Write},
    path::Path,
};

use chrono::NaiveDate;

use super::{Background, FrequencySets, HighValue, Metric, MetricsError, SeasonalStats, SuperMatrix};
use crate::{constants::FREQ_COLUMN, matrix::format_cell};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// The columns of a seasonal statistics file.
pub const SEASONAL_COLUMNS: [&str; 7] = [
    FREQ_COLUMN,
    "Summer Mean",
    "Summer Std",
    "Winter Mean",
    "Winter Std",
    "T-statistic",
    "P-value",
];

fn csv_writer<P: AsRef<Path>>(path: P) -> Result<csv::Writer<BufWriter<File>>, MetricsError> {
    Ok(csv::Writer::from_writer(BufWriter::new(File::create(path)?)))
}

fn finish<W: Write>(mut writer: csv::Writer<W>) -> Result<(), MetricsError> {
    writer.flush()?;
    Ok(())
}

fn date(d: NaiveDate) -> String {
    d.format(DATE_FORMAT).to_string()
}

pub fn write_missing_dates<P: AsRef<Path>>(path: P, dates: &[NaiveDate]) -> Result<(), MetricsError> {
    let mut writer = csv_writer(path)?;
    writer.write_record(["Missing Dates"])?;
    for &d in dates {
        writer.write_record([date(d)])?;
    }
    finish(writer)
}

pub fn write_high_values<P: AsRef<Path>>(path: P, values: &[HighValue]) -> Result<(), MetricsError> {
    let mut writer = csv_writer(path)?;
    writer.write_record([FREQ_COLUMN, Metric::Max.column(), "Date"])?;
    for v in values {
        writer.write_record([v.freq_ghz.to_string(), format_cell(v.max_dbm), date(v.date)])?;
    }
    finish(writer)
}

pub fn write_frequency_sets<P: AsRef<Path>>(
    path: P,
    sets: &FrequencySets,
) -> Result<(), MetricsError> {
    let mut writer = csv_writer(path)?;
    writer.write_record(["Date", "Frequency Set ID", "Number of Frequencies"])?;
    for &(d, id) in &sets.by_date {
        writer.write_record([date(d), id.to_string(), sets.sets[id].len().to_string()])?;
    }
    finish(writer)
}

pub fn write_daily_average<P: AsRef<Path>>(
    path: P,
    metric: Metric,
    averages: &[(NaiveDate, f64)],
) -> Result<(), MetricsError> {
    let mut writer = csv_writer(path)?;
    writer.write_record(["Date", metric.column()])?;
    for &(d, v) in averages {
        writer.write_record([date(d), format_cell(v)])?;
    }
    finish(writer)
}

pub fn write_background<P: AsRef<Path>>(
    path: P,
    backgrounds: &[Background],
) -> Result<(), MetricsError> {
    let mut writer = csv_writer(path)?;
    writer.write_record([FREQ_COLUMN, "Avg_Median", "Avg_5_Sigma_Away"])?;
    for b in backgrounds {
        writer.write_record([
            b.freq_ghz.to_string(),
            format_cell(b.avg_median),
            format_cell(b.avg_five_sigma),
        ])?;
    }
    finish(writer)
}

/// The super matrix has a `Date` column followed by one column per frequency.
pub fn write_super_matrix<P: AsRef<Path>>(path: P, m: &SuperMatrix) -> Result<(), MetricsError> {
    let mut writer = csv_writer(path)?;
    let mut header = vec!["Date".to_string()];
    header.extend(m.freqs.iter().map(|f| f.to_string()));
    writer.write_record(&header)?;
    for (&d, row) in m.dates.iter().zip(m.data.outer_iter()) {
        let mut record = vec![date(d)];
        record.extend(row.iter().map(|&v| format_cell(v)));
        writer.write_record(&record)?;
    }
    finish(writer)
}

pub fn write_seasonal_stats<P: AsRef<Path>>(
    path: P,
    stats: &[SeasonalStats],
) -> Result<(), MetricsError> {
    let mut writer = csv_writer(path)?;
    writer.write_record(SEASONAL_COLUMNS)?;
    for s in stats {
        writer.write_record([
            s.freq_ghz.to_string(),
            format_cell(s.summer_mean),
            format_cell(s.summer_std),
            format_cell(s.winter_mean),
            format_cell(s.winter_std),
            format_cell(s.t),
            format_cell(s.p),
        ])?;
    }
    finish(writer)
}

/// Read the frequencies and p-values of a seasonal statistics file. Rows whose
/// p-value isn't a number are dropped.
pub fn read_p_values<R: Read>(reader: R) -> Result<Vec<(f64, f64)>, MetricsError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = reader.headers()?.clone();
    let find = |name: &'static str| {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or(MetricsError::MissingColumn(name))
    };
    let freq_col = find(FREQ_COLUMN)?;
    let p_col = find("P-value")?;

    let mut values = vec![];
    for (i_row, record) in reader.records().enumerate() {
        let record = record?;
        let freq_field = record.get(freq_col).unwrap_or("");
        let freq: f64 = freq_field.parse().map_err(|_| MetricsError::BadValue {
            row: i_row + 2,
            value: freq_field.to_string(),
        })?;
        if let Some(p) = record
            .get(p_col)
            .and_then(|p| p.parse::<f64>().ok())
            .filter(|p| !p.is_nan())
        {
            values.push((freq, p));
        }
    }
    Ok(values)
}
