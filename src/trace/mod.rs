// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Reading spectrum-analyzer sweep ("trace") files.
//!
//! A trace file is one sweep of the instrument, named
//! `<YYYYMMDD>_<HHMMSS>_trace.csv`. After a header line, the first two columns
//! of each row are the frequency \[MHz\] and the minimum amplitude \[mW\]; any
//! other columns are ignored.

mod error;

pub use error::TraceError;

use std::{fs::File, io::Read, path::Path};

use chrono::NaiveTime;

use crate::{
    constants::{FREQ_DECIMALS, MHZ_PER_GHZ},
    math::{mw_to_dbm, round_to},
};

/// One sweep, converted to GHz and dBm.
#[derive(Debug, Clone, PartialEq)]
pub struct Trace {
    /// When the sweep was taken.
    pub timestamp: NaiveTime,

    /// The frequency of each reading, rounded to 4 decimal places \[GHz\].
    pub freqs_ghz: Vec<f64>,

    /// The power of each reading \[dBm\].
    pub powers_dbm: Vec<f64>,
}

impl Trace {
    /// Read a trace file. The timestamp comes from the file name.
    pub fn read<P: AsRef<Path>>(path: P) -> Result<Trace, TraceError> {
        let path = path.as_ref();
        let timestamp = parse_trace_timestamp(path)?;
        let file = File::open(path)?;
        Trace::from_reader(timestamp, file)
    }

    /// Read trace readings from any CSV source.
    pub fn from_reader<R: Read>(timestamp: NaiveTime, reader: R) -> Result<Trace, TraceError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut freqs_ghz = vec![];
        let mut powers_dbm = vec![];
        for (i_row, record) in reader.records().enumerate() {
            let record = record?;
            // Row numbers in errors are 1-indexed and count the header.
            let row = i_row + 2;
            let (freq_mhz, power_mw) = match (record.get(0), record.get(1)) {
                (Some(f), Some(p)) => (parse_field(f, row)?, parse_field(p, row)?),
                _ => return Err(TraceError::ShortRow { row }),
            };
            freqs_ghz.push(round_to(freq_mhz / MHZ_PER_GHZ, FREQ_DECIMALS));
            powers_dbm.push(mw_to_dbm(power_mw));
        }

        if freqs_ghz.is_empty() {
            return Err(TraceError::NoReadings);
        }

        Ok(Trace {
            timestamp,
            freqs_ghz,
            powers_dbm,
        })
    }

    pub fn len(&self) -> usize {
        self.freqs_ghz.len()
    }

    pub fn is_empty(&self) -> bool {
        self.freqs_ghz.is_empty()
    }
}

fn parse_field(field: &str, row: usize) -> Result<f64, TraceError> {
    field.parse().map_err(|_| TraceError::BadValue {
        row,
        value: field.to_string(),
    })
}

/// Get the time of a sweep from its file name, e.g. `20240516_063036_trace.csv`
/// was taken at 06:30:36.
pub fn parse_trace_timestamp<P: AsRef<Path>>(path: P) -> Result<NaiveTime, TraceError> {
    let path = path.as_ref();
    path.file_name()
        .and_then(|n| n.to_str())
        .and_then(|n| n.split('_').nth(1))
        .and_then(|t| NaiveTime::parse_from_str(t, "%H%M%S").ok())
        .ok_or_else(|| TraceError::BadFileName(path.to_path_buf()))
}
