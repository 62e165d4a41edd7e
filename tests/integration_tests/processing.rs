// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Run the processing chain from raw traces to analyses.

use std::fs::read_to_string;

use approx::assert_abs_diff_eq;
use indoc::indoc;
use tempfile::TempDir;

use crate::{get_cmd_output, rfimon, write_raw_data};

#[test]
fn test_help_lists_the_sub_commands() {
    let cmd = rfimon().arg("--help").ok();
    assert!(cmd.is_ok(), "{:?}", cmd.err());
    let (stdout, _) = get_cmd_output(cmd);
    for sub_command in ["download", "build-matrices", "summarise", "seasonal", "threshold"] {
        assert!(stdout.contains(sub_command), "{sub_command} missing from help");
    }
}

#[test]
fn test_no_sub_command_is_an_error() {
    assert!(rfimon().ok().is_err());
}

#[test]
fn test_matrices_then_metrics_then_analyses() {
    let tmp_dir = TempDir::new().expect("couldn't make tmp dir");
    let raw_dir = tmp_dir.path().join("raw");
    let matrix_dir = tmp_dir.path().join("matrices");
    let metrics_dir = tmp_dir.path().join("metrics");
    write_raw_data(&raw_dir);

    #[rustfmt::skip]
    let cmd = rfimon()
        .args([
            "build-matrices",
            "--input-dir", &raw_dir.display().to_string(),
            "--output-dir", &matrix_dir.display().to_string(),
            "--no-aggregation",
        ])
        .ok();
    assert!(cmd.is_ok(), "build-matrices failed: {}", cmd.err().unwrap());
    let matrix = read_to_string(matrix_dir.join("20240516_matrix.csv")).unwrap();
    let mut lines = matrix.lines();
    assert_eq!(
        lines.next(),
        Some("Frequency (GHz),00:00:00,08:00:00,16:00:00")
    );
    let freqs: Vec<&str> = lines.map(|l| l.split(',').next().unwrap()).collect();
    assert_eq!(freqs, ["0.1", "0.1001", "0.1002", "0.1003"]);
    assert!(matrix_dir.join("20240517_matrix.csv").exists());

    #[rustfmt::skip]
    let cmd = rfimon()
        .args([
            "summarise",
            "--input-dir", &matrix_dir.display().to_string(),
            "--output-dir", &metrics_dir.display().to_string(),
        ])
        .ok();
    assert!(cmd.is_ok(), "summarise failed: {}", cmd.err().unwrap());
    let metrics = read_to_string(metrics_dir.join("20240516_metrics.csv")).unwrap();
    assert_eq!(
        metrics.lines().next(),
        Some("Frequency (GHz),Mean (dBm),Median (dBm),Min (dBm),Max (dBm),Skew,Kurtosis")
    );
    assert_eq!(metrics.lines().count(), 5);

    let high_values = tmp_dir.path().join("high.csv");
    #[rustfmt::skip]
    let cmd = rfimon()
        .args([
            "high-values",
            "--metrics-dir", &metrics_dir.display().to_string(),
            "--threshold", "-70",
            "--output", &high_values.display().to_string(),
        ])
        .ok();
    assert!(cmd.is_ok(), "high-values failed: {}", cmd.err().unwrap());
    assert_eq!(
        read_to_string(&high_values).unwrap(),
        indoc! {"
            Frequency (GHz),Max (dBm),Date
            0.1001,-60,2024-05-16
            0.1001,-30,2024-05-17
        "}
    );

    let missing = tmp_dir.path().join("missing.csv");
    #[rustfmt::skip]
    let cmd = rfimon()
        .args([
            "missing-days",
            "--metrics-dir", &metrics_dir.display().to_string(),
            "--start-date", "2024-05-15",
            "--output", &missing.display().to_string(),
        ])
        .ok();
    assert!(cmd.is_ok(), "missing-days failed: {}", cmd.err().unwrap());
    assert_eq!(
        read_to_string(&missing).unwrap(),
        indoc! {"
            Missing Dates
            2024-05-15
        "}
    );
}

#[test]
fn test_peak_summaries() {
    let tmp_dir = TempDir::new().expect("couldn't make tmp dir");
    let raw_dir = tmp_dir.path().join("raw");
    let matrix_dir = tmp_dir.path().join("matrices");
    let summary_dir = tmp_dir.path().join("summaries");
    write_raw_data(&raw_dir);

    #[rustfmt::skip]
    let cmd = rfimon()
        .args([
            "build-matrices",
            "--input-dir", &raw_dir.display().to_string(),
            "--output-dir", &matrix_dir.display().to_string(),
            "--no-aggregation",
            "--start-date", "20240517",
        ])
        .ok();
    assert!(cmd.is_ok(), "build-matrices failed: {}", cmd.err().unwrap());
    assert!(!matrix_dir.join("20240516_matrix.csv").exists());

    #[rustfmt::skip]
    let cmd = rfimon()
        .args([
            "summarise",
            "--input-dir", &matrix_dir.display().to_string(),
            "--output-dir", &summary_dir.display().to_string(),
            "--peak",
            "--freq-aggregation", "2",
            "--time-aggregation", "3",
        ])
        .ok();
    assert!(cmd.is_ok(), "summarise --peak failed: {}", cmd.err().unwrap());
    let summary = read_to_string(summary_dir.join("20240517_summary.csv")).unwrap();
    let lines: Vec<&str> = summary.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], "Frequency (GHz),Power (dBm)");
    let (freq, power) = lines[1].split_once(',').unwrap();
    assert_eq!(freq, "0.1");
    assert_abs_diff_eq!(power.parse::<f64>().unwrap(), -30.0, epsilon = 1e-9);
    assert!(lines[2].starts_with("0.1002,"));
}

#[test]
fn test_bad_aggregation_factor() {
    let tmp_dir = TempDir::new().expect("couldn't make tmp dir");
    #[rustfmt::skip]
    let cmd = rfimon()
        .args([
            "build-matrices",
            "--input-dir", &tmp_dir.path().display().to_string(),
            "--output-dir", &tmp_dir.path().display().to_string(),
            "--freq-aggregation", "0",
        ])
        .ok();
    assert!(cmd.is_err());
    let (_, stderr) = get_cmd_output(cmd);
    assert!(stderr.starts_with("Error: Aggregation"), "{stderr}");
}

#[test]
fn test_save_toml_then_reuse_it() {
    let tmp_dir = TempDir::new().expect("couldn't make tmp dir");
    let raw_dir = tmp_dir.path().join("raw");
    let matrix_dir = tmp_dir.path().join("matrices");
    let toml = tmp_dir.path().join("build.toml");
    write_raw_data(&raw_dir);

    #[rustfmt::skip]
    let cmd = rfimon()
        .args([
            "build-matrices",
            "--input-dir", &raw_dir.display().to_string(),
            "--output-dir", &matrix_dir.display().to_string(),
            "--no-aggregation",
            "--save-toml", &toml.display().to_string(),
            "--dry-run",
        ])
        .ok();
    assert!(cmd.is_ok(), "{}", cmd.err().unwrap());
    assert!(toml.exists());
    assert!(!matrix_dir.exists());

    let cmd = rfimon()
        .args(["build-matrices", &toml.display().to_string()])
        .ok();
    assert!(cmd.is_ok(), "{}", cmd.err().unwrap());
    assert!(matrix_dir.join("20240516_matrix.csv").exists());
}
