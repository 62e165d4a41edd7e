// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Tests to ensure there is no stderr output for successful commands.

use tempfile::TempDir;

use crate::{get_cmd_output, rfimon, write_raw_data};

#[test]
fn test_build_matrices_no_stderr() {
    let tmp_dir = TempDir::new().expect("couldn't make tmp dir");
    let raw_dir = tmp_dir.path().join("raw");
    write_raw_data(&raw_dir);

    #[rustfmt::skip]
    let cmd = rfimon()
        .args([
            "build-matrices",
            "--input-dir", &raw_dir.display().to_string(),
            "--output-dir", &tmp_dir.path().join("matrices").display().to_string(),
            "--freq-aggregation", "2",
            "--time-aggregation", "2",
        ])
        .ok();
    assert!(
        cmd.is_ok(),
        "build-matrices failed on simple test data: {}",
        cmd.err().unwrap()
    );
    let (_, stderr) = get_cmd_output(cmd);
    assert!(stderr.is_empty(), "stderr wasn't empty: {stderr}");
}

#[test]
fn test_download_dry_run_no_stderr() {
    let tmp_dir = TempDir::new().expect("couldn't make tmp dir");
    let output_dir = tmp_dir.path().join("raw");

    #[rustfmt::skip]
    let cmd = rfimon()
        .args([
            "download",
            "--output-dir", &output_dir.display().to_string(),
            "--start-date", "20240101",
            "--end-date", "20240107",
            "--dry-run",
        ])
        .ok();
    assert!(cmd.is_ok(), "download --dry-run failed: {}", cmd.err().unwrap());
    let (stdout, stderr) = get_cmd_output(cmd);
    assert!(stderr.is_empty(), "stderr wasn't empty: {stderr}");
    assert!(stdout.contains("Dry run -- exiting now."));
    assert!(!output_dir.exists());
}
