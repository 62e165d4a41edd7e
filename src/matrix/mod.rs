// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Day matrices: every reading of one calendar day on a frequency × time grid.
//!
//! On disk, a day matrix is a CSV file `<YYYYMMDD>_matrix.csv` with a header
//! of `Frequency (GHz)` followed by `HH:MM:SS` time labels, and one row per
//! frequency. Cells without a reading are empty.

mod batch;
mod error;
pub mod filter;
#[cfg(test)]
mod tests;

pub use batch::{process_all_days, process_day_directory, relabel_directory, BatchReport};
pub use error::MatrixError;

use std::{
    collections::{BTreeMap, BTreeSet},
    fs::File,
    io::{BufWriter, Read, Write},
    path::Path,
};

use chrono::NaiveTime;
use log::trace;
use ndarray::{prelude::*, Zip};

use crate::{
    constants::{FREQ_COLUMN, FREQ_DECIMALS, TIME_LABEL_FORMAT},
    math::{dequantise, quantise},
    trace::Trace,
};

/// Power readings \[dBm\] of one day. The first dimension of `data` is
/// frequency, the second is time.
#[derive(Debug, Clone, PartialEq)]
pub struct DayMatrix {
    /// The frequency of each row \[GHz\].
    pub freqs: Vec<f64>,

    /// The time of each column.
    pub times: Vec<NaiveTime>,

    /// NaN where there is no reading.
    pub data: Array2<f64>,
}

impl DayMatrix {
    pub fn new(
        freqs: Vec<f64>,
        times: Vec<NaiveTime>,
        data: Array2<f64>,
    ) -> Result<DayMatrix, MatrixError> {
        if data.dim() != (freqs.len(), times.len()) {
            return Err(MatrixError::ShapeMismatch {
                rows: data.len_of(Axis(0)),
                cols: data.len_of(Axis(1)),
                freqs: freqs.len(),
                times: times.len(),
            });
        }
        Ok(DayMatrix { freqs, times, data })
    }

    pub fn num_freqs(&self) -> usize {
        self.freqs.len()
    }

    pub fn num_times(&self) -> usize {
        self.times.len()
    }

    /// Pivot traces into a matrix. Rows are every frequency seen in any trace
    /// (ascending), columns every trace time (ascending). Readings that land
    /// in the same cell are averaged, and cells without any reading are NaN.
    pub fn from_traces(traces: &[Trace]) -> Result<DayMatrix, MatrixError> {
        if traces.is_empty() {
            return Err(MatrixError::NoTraces);
        }

        // Frequencies are matched on their rounded values.
        let freq_keys: BTreeSet<i64> = traces
            .iter()
            .flat_map(|t| t.freqs_ghz.iter())
            .map(|&f| quantise(f, FREQ_DECIMALS))
            .collect();
        let times: BTreeSet<NaiveTime> = traces.iter().map(|t| t.timestamp).collect();
        let freq_index: BTreeMap<i64, usize> =
            freq_keys.iter().enumerate().map(|(i, &k)| (k, i)).collect();
        let time_index: BTreeMap<NaiveTime, usize> =
            times.iter().enumerate().map(|(i, &t)| (t, i)).collect();
        trace!(
            "Pivoting {} traces onto {} frequencies",
            traces.len(),
            freq_keys.len()
        );

        let shape = (freq_keys.len(), times.len());
        let mut sums = Array2::<f64>::zeros(shape);
        let mut counts = Array2::<u32>::zeros(shape);
        for t in traces {
            let i_time = time_index[&t.timestamp];
            for (&freq, &power) in t.freqs_ghz.iter().zip(t.powers_dbm.iter()) {
                if power.is_nan() {
                    continue;
                }
                let i_freq = freq_index[&quantise(freq, FREQ_DECIMALS)];
                sums[(i_freq, i_time)] += power;
                counts[(i_freq, i_time)] += 1;
            }
        }

        let mut data = Array2::from_elem(shape, f64::NAN);
        Zip::from(&mut data)
            .and(&sums)
            .and(&counts)
            .for_each(|d, &s, &c| {
                if c > 0 {
                    *d = s / c as f64;
                }
            });

        Ok(DayMatrix {
            freqs: freq_keys
                .into_iter()
                .map(|k| dequantise(k, FREQ_DECIMALS))
                .collect(),
            times: times.into_iter().collect(),
            data,
        })
    }

    /// Read a day matrix CSV file.
    pub fn read_csv<P: AsRef<Path>>(path: P) -> Result<DayMatrix, MatrixError> {
        let file = File::open(path)?;
        DayMatrix::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<DayMatrix, MatrixError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        // The first header is the frequency column; whatever it's called,
        // it's ignored.
        let times = reader
            .headers()?
            .iter()
            .skip(1)
            .map(parse_time_label)
            .collect::<Result<Vec<_>, _>>()?;
        let expected = times.len() + 1;

        let mut freqs = vec![];
        let mut values = vec![];
        for (i_row, record) in reader.records().enumerate() {
            let record = record?;
            let row = i_row + 2;
            if record.len() != expected {
                return Err(MatrixError::RowLength {
                    row,
                    expected,
                    got: record.len(),
                });
            }
            for (i_col, field) in record.iter().enumerate() {
                let value = parse_cell(field).ok_or_else(|| MatrixError::BadValue {
                    row,
                    col: i_col + 1,
                    value: field.to_string(),
                })?;
                if i_col == 0 {
                    freqs.push(value);
                } else {
                    values.push(value);
                }
            }
        }

        let data = Array2::from_shape_vec((freqs.len(), times.len()), values)?;
        Ok(DayMatrix { freqs, times, data })
    }

    /// Write the matrix as CSV to a file, replacing anything that was there.
    pub fn write_csv<P: AsRef<Path>>(&self, path: P) -> Result<(), MatrixError> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        self.to_writer(&mut writer)?;
        writer.flush()?;
        Ok(())
    }

    pub fn to_writer<W: Write>(&self, writer: W) -> Result<(), MatrixError> {
        let mut writer = csv::Writer::from_writer(writer);
        let mut header = Vec::with_capacity(self.num_times() + 1);
        header.push(FREQ_COLUMN.to_string());
        header.extend(
            self.times
                .iter()
                .map(|t| t.format(TIME_LABEL_FORMAT).to_string()),
        );
        writer.write_record(&header)?;

        for (freq, row) in self.freqs.iter().zip(self.data.outer_iter()) {
            let mut record = Vec::with_capacity(row.len() + 1);
            record.push(freq.to_string());
            record.extend(row.iter().map(|&v| format_cell(v)));
            writer.write_record(&record)?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Put the columns in time order.
    pub fn sort_columns(&mut self) {
        let mut order: Vec<usize> = (0..self.num_times()).collect();
        order.sort_by_key(|&i| self.times[i]);
        if order.windows(2).all(|w| w[0] < w[1]) {
            return;
        }
        self.data = self.data.select(Axis(1), &order);
        self.times = order.iter().map(|&i| self.times[i]).collect();
    }

    /// Get the readings at a frequency \[GHz\], if the matrix has a row for it.
    /// Frequencies are compared at 100 kHz precision.
    pub fn row_for_frequency(&self, freq_ghz: f64) -> Option<ArrayView1<f64>> {
        let key = quantise(freq_ghz, FREQ_DECIMALS);
        self.freqs
            .iter()
            .position(|&f| quantise(f, FREQ_DECIMALS) == key)
            .map(|i| self.data.row(i))
    }

    /// Replace this matrix's frequency labels with the first labels of a
    /// reference matrix (e.g. a day whose instrument settings were recorded
    /// correctly). The readings are unchanged.
    pub fn relabel_frequencies(&mut self, reference: &DayMatrix) -> Result<(), MatrixError> {
        if reference.num_freqs() < self.num_freqs() {
            return Err(MatrixError::ReferenceTooShort {
                reference: reference.num_freqs(),
                needed: self.num_freqs(),
            });
        }
        self.freqs = reference.freqs[..self.num_freqs()].to_vec();
        Ok(())
    }
}

fn parse_time_label(label: &str) -> Result<NaiveTime, MatrixError> {
    NaiveTime::parse_from_str(label.trim(), TIME_LABEL_FORMAT)
        .map_err(|_| MatrixError::BadTimeLabel(label.to_string()))
}

fn parse_cell(field: &str) -> Option<f64> {
    let field = field.trim();
    if field.is_empty() {
        Some(f64::NAN)
    } else {
        field.parse().ok()
    }
}

/// NaN is written as an empty field.
pub(crate) fn format_cell(v: f64) -> String {
    if v.is_nan() {
        String::new()
    } else {
        v.to_string()
    }
}
