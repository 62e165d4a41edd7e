// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Integration tests.
//!
//! Some help for laying out these tests was taken from:
//! https://matklad.github.io/2021/02/27/delete-cargo-integration-tests.html

mod no_stderr;
mod processing;

use std::{
    fs::{create_dir_all, File},
    io::Write,
    path::Path,
    process::Output,
    str::from_utf8,
};

use assert_cmd::{output::OutputError, Command};

fn rfimon() -> Command {
    Command::cargo_bin("rfimon").unwrap()
}

fn get_cmd_output(result: Result<Output, OutputError>) -> (String, String) {
    let output = match result {
        Ok(o) => o,
        Err(o) => o.as_output().unwrap().clone(),
    };
    (
        from_utf8(&output.stdout).unwrap().to_string(),
        from_utf8(&output.stderr).unwrap().to_string(),
    )
}

/// The frequencies of every test sweep [MHz].
const FREQS_MHZ: [f64; 4] = [100.0, 100.1, 100.2, 100.3];

/// Write a day directory `<raw_dir>/<day>/` with one trace file per time. The
/// powers [mW] at each time are given by `powers`, one per frequency.
fn write_day(raw_dir: &Path, day: &str, sweeps: &[(&str, [f64; 4])]) {
    let day_dir = raw_dir.join(day);
    create_dir_all(&day_dir).unwrap();
    for (time, powers) in sweeps {
        let mut f = File::create(day_dir.join(format!("{day}_{time}_trace.csv"))).unwrap();
        writeln!(f, "Frequency (MHz),Amplitude Min(mW)").unwrap();
        for (freq, power) in FREQS_MHZ.iter().zip(powers) {
            writeln!(f, "{freq},{power:e}").unwrap();
        }
    }
}

/// Two days of raw data with three sweeps each. The second frequency carries
/// an intermittent signal.
fn write_raw_data(raw_dir: &Path) {
    write_day(
        raw_dir,
        "20240516",
        &[
            ("000000", [1e-9, 1e-9, 1e-9, 1e-9]),
            ("080000", [1e-9, 1e-6, 1e-9, 1e-9]),
            ("160000", [1e-9, 1e-9, 1e-9, 1e-9]),
        ],
    );
    write_day(
        raw_dir,
        "20240517",
        &[
            ("000000", [1e-9, 1e-9, 1e-9, 1e-9]),
            ("080000", [1e-9, 1e-9, 1e-9, 1e-9]),
            ("160000", [1e-9, 1e-3, 1e-9, 1e-9]),
        ],
    );
}
