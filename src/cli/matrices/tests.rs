// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::{
    fs::{create_dir_all, File},
    io::Write,
    path::Path,
};

use clap::Parser;
use indoc::indoc;
use tempfile::TempDir;

use super::*;

/// Make `<dir>/<day>/<day>_<time>_trace.csv` with a few readings.
fn write_day(dir: &Path, day: &str, times: &[&str]) {
    let day_dir = dir.join(day);
    create_dir_all(&day_dir).unwrap();
    for time in times {
        let mut f = File::create(day_dir.join(format!("{day}_{time}_trace.csv"))).unwrap();
        writeln!(f, "Frequency (MHz),Amplitude Min(mW)").unwrap();
        for freq in [100.0, 100.1, 100.2, 100.3] {
            writeln!(f, "{freq},1e-9").unwrap();
        }
    }
}

#[test]
fn test_build_matrices_arguments_are_parsed() {
    #[rustfmt::skip]
    let args = BuildMatricesArgs::parse_from([
        "build-matrices",
        "--input-dir", "/data/raw",
        "--output-dir", "/data/matrices",
        "--start-date", "20240729",
        "--freq-aggregation", "64",
        "--no-aggregation",
    ]);
    assert_eq!(args.input_dir, Some(PathBuf::from("/data/raw")));
    assert_eq!(args.output_dir, Some(PathBuf::from("/data/matrices")));
    assert_eq!(args.dates.start_date.as_deref(), Some("20240729"));
    assert_eq!(args.dates.end_date, None);
    assert_eq!(args.aggregation.freq_aggregation.as_deref(), Some("64"));
    assert!(args.no_aggregation);
}

#[test]
fn test_cli_args_are_preferred_over_the_arg_file() {
    let tmp_dir = TempDir::new().unwrap();
    let arg_file = tmp_dir.path().join("build.toml");
    let mut f = File::create(&arg_file).unwrap();
    write!(
        f,
        indoc! {r#"
            input_dir = "/file/raw"
            output_dir = "/file/matrices"
            no_aggregation = true

            [dates]
            start_date = "20230101"
            end_date = "20231231"

            [aggregation]
            time_aggregation = "8"
        "#}
    )
    .unwrap();
    drop(f);

    #[rustfmt::skip]
    let args = BuildMatricesArgs::parse_from([
        "build-matrices",
        &arg_file.display().to_string(),
        "--input-dir", "/cli/raw",
        "--start-date", "20240101",
    ])
    .merge()
    .unwrap();
    assert!(args.args_file.is_none());
    assert_eq!(args.input_dir, Some(PathBuf::from("/cli/raw")));
    assert_eq!(args.output_dir, Some(PathBuf::from("/file/matrices")));
    assert_eq!(args.dates.start_date.as_deref(), Some("20240101"));
    assert_eq!(args.dates.end_date.as_deref(), Some("20231231"));
    assert_eq!(args.aggregation.time_aggregation.as_deref(), Some("8"));
    assert!(args.no_aggregation);
}

#[test]
fn test_unknown_arg_file_extensions_are_rejected() {
    let tmp_dir = TempDir::new().unwrap();
    let arg_file = tmp_dir.path().join("build.yaml");
    File::create(&arg_file).unwrap();

    let args = BuildMatricesArgs {
        args_file: Some(arg_file),
        ..Default::default()
    };
    assert!(matches!(args.merge(), Err(RfimonError::ArgFile(_))));
}

#[test]
fn test_build_matrices_needs_directories() {
    let result = BuildMatricesArgs::default().run(true);
    assert!(matches!(result, Err(RfimonError::Generic(_))));
}

#[test]
fn test_dry_run_writes_nothing() {
    let tmp_dir = TempDir::new().unwrap();
    let input_dir = tmp_dir.path().join("raw");
    let output_dir = tmp_dir.path().join("matrices");
    write_day(&input_dir, "20240516", &["120000"]);

    let args = BuildMatricesArgs {
        input_dir: Some(input_dir),
        output_dir: Some(output_dir.clone()),
        ..Default::default()
    };
    args.clone().run(true).unwrap();
    assert!(!output_dir.exists());

    args.run(false).unwrap();
    assert!(output_dir.join("20240516_matrix.csv").exists());
}

#[test]
fn test_build_then_reaggregate() {
    let tmp_dir = TempDir::new().unwrap();
    let input_dir = tmp_dir.path().join("raw");
    let full_dir = tmp_dir.path().join("full");
    let agg_dir = tmp_dir.path().join("agg");
    write_day(&input_dir, "20240516", &["000000", "000100", "000200"]);

    BuildMatricesArgs {
        input_dir: Some(input_dir),
        output_dir: Some(full_dir.clone()),
        no_aggregation: true,
        ..Default::default()
    }
    .run(false)
    .unwrap();
    let full = DayMatrix::read_csv(full_dir.join("20240516_matrix.csv")).unwrap();
    assert_eq!(full.data.dim(), (4, 3));

    #[rustfmt::skip]
    let args = ReaggregateArgs::parse_from([
        "reaggregate",
        "--input-dir", &full_dir.display().to_string(),
        "--output-dir", &agg_dir.display().to_string(),
        "--freq-aggregation", "2",
        "--time-aggregation", "2",
    ]);
    args.run(false).unwrap();
    let agg = DayMatrix::read_csv(agg_dir.join("20240516_matrix.csv")).unwrap();
    assert_eq!(agg.data.dim(), (2, 2));
    assert_eq!(agg.freqs, vec![0.1, 0.1002]);
}

#[test]
fn test_relabel_needs_a_single_reference() {
    let tmp_dir = TempDir::new().unwrap();
    let args = RelabelArgs {
        reference: format!("{}/*_matrix.csv", tmp_dir.path().display()),
        input_dir: tmp_dir.path().to_path_buf(),
        output_dir: tmp_dir.path().join("out"),
    };
    assert!(matches!(args.run(true), Err(RfimonError::Generic(_))));
}
