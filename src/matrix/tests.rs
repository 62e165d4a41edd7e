// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::{
    fs::{create_dir_all, File},
    io::Write,
};

use approx::assert_abs_diff_eq;
use chrono::NaiveDate;
use indoc::indoc;
use ndarray::array;
use tempfile::TempDir;

use super::{filter::*, *};
use crate::{aggregation::AggregationFactors, math::mw_to_dbm, time::DateRange};

fn hms(h: u32, m: u32, s: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, s).unwrap()
}

fn trace(timestamp: NaiveTime, readings: &[(f64, f64)]) -> Trace {
    Trace {
        timestamp,
        freqs_ghz: readings.iter().map(|r| r.0).collect(),
        powers_dbm: readings.iter().map(|r| r.1).collect(),
    }
}

/// Write a trace file with readings in MHz and mW.
fn write_trace_file(dir: &Path, name: &str, readings: &[(f64, f64)]) {
    let mut f = File::create(dir.join(name)).unwrap();
    writeln!(f, "Frequency (MHz),Amplitude Min(mW)").unwrap();
    for (freq, power) in readings {
        writeln!(f, "{freq},{power}").unwrap();
    }
}

#[test]
fn test_pivot_sorts_and_fills_nans() {
    // Traces out of time order, with a frequency only seen in one trace.
    let traces = [
        trace(hms(1, 0, 0), &[(0.2, -70.0), (0.1, -80.0)]),
        trace(hms(0, 0, 0), &[(0.1, -90.0), (0.3, -60.0)]),
    ];
    let m = DayMatrix::from_traces(&traces).unwrap();
    assert_eq!(m.freqs, vec![0.1, 0.2, 0.3]);
    assert_eq!(m.times, vec![hms(0, 0, 0), hms(1, 0, 0)]);
    assert_abs_diff_eq!(m.data[(0, 0)], -90.0);
    assert_abs_diff_eq!(m.data[(0, 1)], -80.0);
    assert!(m.data[(1, 0)].is_nan());
    assert_abs_diff_eq!(m.data[(1, 1)], -70.0);
    assert_abs_diff_eq!(m.data[(2, 0)], -60.0);
    assert!(m.data[(2, 1)].is_nan());
}

#[test]
fn test_pivot_averages_duplicates() {
    // Two traces with the same time, and a repeated frequency within a trace.
    let traces = [
        trace(hms(0, 0, 0), &[(0.1, -90.0), (0.1, -80.0)]),
        trace(hms(0, 0, 0), &[(0.1, -70.0)]),
    ];
    let m = DayMatrix::from_traces(&traces).unwrap();
    assert_eq!(m.data.dim(), (1, 1));
    assert_abs_diff_eq!(m.data[(0, 0)], -80.0);
}

#[test]
fn test_pivot_needs_traces() {
    assert!(matches!(
        DayMatrix::from_traces(&[]),
        Err(MatrixError::NoTraces)
    ));
}

#[test]
fn test_new_checks_shape() {
    let result = DayMatrix::new(vec![0.1], vec![hms(0, 0, 0)], Array2::zeros((2, 1)));
    assert!(matches!(result, Err(MatrixError::ShapeMismatch { .. })));
}

#[test]
fn test_csv_round_trip_keeps_nans() {
    let m = DayMatrix::new(
        vec![0.4353, 0.4354],
        vec![hms(0, 0, 15), hms(23, 59, 59)],
        array![[-90.5, f64::NAN], [-63.25, -70.0]],
    )
    .unwrap();

    let mut buf = vec![];
    m.to_writer(&mut buf).unwrap();
    let text = String::from_utf8(buf.clone()).unwrap();
    assert_eq!(
        text,
        indoc! {"
            Frequency (GHz),00:00:15,23:59:59
            0.4353,-90.5,
            0.4354,-63.25,-70
        "}
    );

    let read = DayMatrix::from_reader(buf.as_slice()).unwrap();
    assert_eq!(read.freqs, m.freqs);
    assert_eq!(read.times, m.times);
    assert!(read.data[(0, 1)].is_nan());
    assert_abs_diff_eq!(read.data[(1, 0)], -63.25);
}

#[test]
fn test_read_bad_matrices() {
    let bad_label = "Frequency (GHz),noon\n0.1,-80\n";
    assert!(matches!(
        DayMatrix::from_reader(bad_label.as_bytes()),
        Err(MatrixError::BadTimeLabel(_))
    ));

    let short_row = "Frequency (GHz),00:00:00,00:00:01\n0.1,-80\n";
    assert!(matches!(
        DayMatrix::from_reader(short_row.as_bytes()),
        Err(MatrixError::RowLength {
            row: 2,
            expected: 3,
            got: 2
        })
    ));

    let bad_value = "Frequency (GHz),00:00:00\n0.1,loud\n";
    assert!(matches!(
        DayMatrix::from_reader(bad_value.as_bytes()),
        Err(MatrixError::BadValue { row: 2, col: 2, .. })
    ));
}

#[test]
fn test_sort_columns() {
    let mut m = DayMatrix::new(
        vec![0.1, 0.2],
        vec![hms(2, 0, 0), hms(0, 0, 0), hms(1, 0, 0)],
        array![[2.0, 0.0, 1.0], [20.0, 0.0, 10.0]],
    )
    .unwrap();
    m.sort_columns();
    assert_eq!(m.times, vec![hms(0, 0, 0), hms(1, 0, 0), hms(2, 0, 0)]);
    assert_eq!(m.data, array![[0.0, 1.0, 2.0], [0.0, 10.0, 20.0]]);
}

#[test]
fn test_row_for_frequency() {
    let m = DayMatrix::new(
        vec![0.4353, 0.4354],
        vec![hms(0, 0, 0)],
        array![[-90.0], [-80.0]],
    )
    .unwrap();
    let row = m.row_for_frequency(0.43540000001).unwrap();
    assert_abs_diff_eq!(row[0], -80.0);
    assert!(m.row_for_frequency(0.5).is_none());
}

#[test]
fn test_relabel_frequencies() {
    let reference = DayMatrix::new(
        vec![1.0, 2.0, 3.0],
        vec![hms(0, 0, 0)],
        array![[0.0], [0.0], [0.0]],
    )
    .unwrap();
    let mut m = DayMatrix::new(
        vec![0.1, 0.2],
        vec![hms(5, 0, 0)],
        array![[-90.0], [-80.0]],
    )
    .unwrap();
    m.relabel_frequencies(&reference).unwrap();
    assert_eq!(m.freqs, vec![1.0, 2.0]);
    // The readings and times are untouched.
    assert_eq!(m.times, vec![hms(5, 0, 0)]);
    assert_eq!(m.data, array![[-90.0], [-80.0]]);

    let result = reference.clone().relabel_frequencies(&m);
    assert!(matches!(
        result,
        Err(MatrixError::ReferenceTooShort {
            reference: 2,
            needed: 3
        })
    ));
}

#[test]
fn test_median_subtracted() {
    // In mW, the row is [1, 2, 3] with a median of 2.
    let m = DayMatrix::new(
        vec![0.1],
        vec![hms(0, 0, 0), hms(0, 0, 1), hms(0, 0, 2), hms(0, 0, 3)],
        array![[0.0, mw_to_dbm(2.0), mw_to_dbm(3.0), f64::NAN]],
    )
    .unwrap();
    let filtered = median_subtracted(&m, -110.0);
    // Non-positive differences become 1e-12 mW (-120 dBm), then the floor.
    assert_abs_diff_eq!(filtered.data[(0, 0)], -110.0);
    assert_abs_diff_eq!(filtered.data[(0, 1)], -110.0);
    assert_abs_diff_eq!(filtered.data[(0, 2)], 0.0, epsilon = 1e-10);
    assert!(filtered.data[(0, 3)].is_nan());

    let filtered = median_subtracted(&m, -130.0);
    assert_abs_diff_eq!(filtered.data[(0, 0)], -120.0, epsilon = 1e-10);
}

#[test]
fn test_sigma_threshold() {
    let mut row = vec![-100.0; 9];
    row.push(-20.0);
    let m = DayMatrix::new(
        vec![0.1],
        (0..10).map(|s| hms(0, 0, s)).collect(),
        Array2::from_shape_vec((1, 10), row).unwrap(),
    )
    .unwrap();
    // mean = -92, population std = 24; threshold at 1 sigma = -68.
    let filtered = sigma_threshold(&m, 1.0, -90.0);
    for &v in filtered.data.iter().take(9) {
        assert_abs_diff_eq!(v, -90.0);
    }
    assert_abs_diff_eq!(filtered.data[(0, 9)], -20.0);

    // Nothing is 3.5 sigma above the mean.
    let filtered = sigma_threshold(&m, 3.5, -90.0);
    assert!(filtered.data.iter().all(|&v| v == -90.0));

    let unfiltered = WaterfallFilter::None.apply(&m);
    assert_eq!(unfiltered, m);
}

#[test]
fn test_process_day_directory() {
    let tmp_dir = TempDir::new().unwrap();
    let day_dir = tmp_dir.path().join("20240516");
    let out_dir = tmp_dir.path().join("matrices");
    create_dir_all(&day_dir).unwrap();
    write_trace_file(&day_dir, "20240516_000000_trace.csv", &[(100.0, 1e-9), (200.0, 1e-8)]);
    write_trace_file(&day_dir, "20240516_000015_trace.csv", &[(100.0, 1e-7), (200.0, 1e-6)]);
    // Unreadable traces are skipped.
    File::create(day_dir.join("20240516_000030_trace.csv")).unwrap();
    File::create(day_dir.join("garbage_trace.csv")).unwrap();

    let written = process_day_directory(&day_dir, &out_dir, None)
        .unwrap()
        .unwrap();
    assert_eq!(written, out_dir.join("20240516_matrix.csv"));
    let m = DayMatrix::read_csv(&written).unwrap();
    assert_eq!(m.freqs, vec![0.1, 0.2]);
    assert_eq!(m.times, vec![hms(0, 0, 0), hms(0, 0, 15)]);
    assert_abs_diff_eq!(m.data[(0, 0)], -90.0, epsilon = 1e-10);
    assert_abs_diff_eq!(m.data[(1, 1)], -60.0, epsilon = 1e-10);

    // Aggregated, everything collapses into one cell.
    let factors = AggregationFactors::new(2, 2).unwrap();
    let written = process_day_directory(&day_dir, &out_dir, Some(factors))
        .unwrap()
        .unwrap();
    let m = DayMatrix::read_csv(written).unwrap();
    assert_eq!(m.data.dim(), (1, 1));
    assert_abs_diff_eq!(m.data[(0, 0)], -60.0, epsilon = 1e-10);
}

#[test]
fn test_empty_day_writes_nothing() {
    let tmp_dir = TempDir::new().unwrap();
    let day_dir = tmp_dir.path().join("20240517");
    let out_dir = tmp_dir.path().join("matrices");
    create_dir_all(&day_dir).unwrap();
    assert!(process_day_directory(&day_dir, &out_dir, None)
        .unwrap()
        .is_none());
    assert!(!out_dir.join("20240517_matrix.csv").exists());

    let result = process_day_directory(tmp_dir.path(), &out_dir, None);
    assert!(matches!(result, Err(MatrixError::NotADayDirectory(_))));
}

#[test]
fn test_process_all_days() {
    let tmp_dir = TempDir::new().unwrap();
    let input = tmp_dir.path().join("raw");
    let out_dir = tmp_dir.path().join("matrices");
    for day in ["20240515", "20240516", "20240517", "20240518"] {
        let day_dir = input.join(day);
        create_dir_all(&day_dir).unwrap();
        if day != "20240517" {
            write_trace_file(&day_dir, &format!("{day}_120000_trace.csv"), &[(100.0, 1.0)]);
        }
    }
    create_dir_all(input.join("lost+found")).unwrap();

    let range = DateRange::since(NaiveDate::from_ymd_opt(2024, 5, 16).unwrap());
    let report = process_all_days(&input, &out_dir, range, None).unwrap();
    assert_eq!(
        report.written,
        vec![
            out_dir.join("20240516_matrix.csv"),
            out_dir.join("20240518_matrix.csv")
        ]
    );
    assert_eq!(
        report.empty_days,
        vec![NaiveDate::from_ymd_opt(2024, 5, 17).unwrap()]
    );
    assert!(report.failed.is_empty());
    assert!(!out_dir.join("20240515_matrix.csv").exists());
}

#[test]
fn test_relabel_directory() {
    let tmp_dir = TempDir::new().unwrap();
    let input = tmp_dir.path().join("2017");
    let out_dir = tmp_dir.path().join("fixed");
    create_dir_all(&input).unwrap();

    let bad_labels = DayMatrix::new(
        vec![0.0001, 0.0002],
        vec![hms(0, 0, 0)],
        array![[-90.0], [-80.0]],
    )
    .unwrap();
    bad_labels.write_csv(input.join("20170101_matrix.csv")).unwrap();
    // Too many frequencies for the reference.
    let too_long = DayMatrix::new(
        vec![0.1, 0.2, 0.3, 0.4],
        vec![hms(0, 0, 0)],
        array![[-90.0], [-80.0], [-70.0], [-60.0]],
    )
    .unwrap();
    too_long.write_csv(input.join("20170102_matrix.csv")).unwrap();

    let reference = DayMatrix::new(
        vec![0.4353, 0.4466, 0.4579],
        vec![hms(12, 0, 0)],
        array![[-100.0], [-100.0], [-100.0]],
    )
    .unwrap();
    let report = relabel_directory(&input, &out_dir, &reference).unwrap();
    assert_eq!(report.written, vec![out_dir.join("20170101_matrix.csv")]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, input.join("20170102_matrix.csv"));

    let fixed = DayMatrix::read_csv(out_dir.join("20170101_matrix.csv")).unwrap();
    assert_eq!(fixed.freqs, vec![0.4353, 0.4466]);
    assert_eq!(fixed.data, bad_labels.data);
}
