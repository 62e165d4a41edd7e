// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Tests against the shared command-line arguments.

use chrono::NaiveDate;

use super::*;

#[test]
fn test_date_range_args() {
    let args = DateRangeArgs {
        start_date: Some("20240603".to_string()),
        end_date: Some("2024-07-11".to_string()),
    };
    let range = args.parse().unwrap();
    assert_eq!(range.start, NaiveDate::from_ymd_opt(2024, 6, 3));
    assert_eq!(range.end, NaiveDate::from_ymd_opt(2024, 7, 11));

    assert_eq!(DateRangeArgs::default().parse().unwrap(), DateRange::default());

    let backwards = DateRangeArgs {
        start_date: Some("20240711".to_string()),
        end_date: Some("20240603".to_string()),
    };
    assert!(matches!(
        backwards.parse(),
        Err(TimeError::BackwardsRange { .. })
    ));

    let bad = DateRangeArgs {
        start_date: Some("yesterday".to_string()),
        end_date: None,
    };
    assert!(matches!(bad.parse(), Err(TimeError::BadDate(_))));
}

#[test]
fn test_cli_dates_are_preferred_when_merging() {
    let cli = DateRangeArgs {
        start_date: Some("20240101".to_string()),
        end_date: None,
    };
    let file = DateRangeArgs {
        start_date: Some("20230101".to_string()),
        end_date: Some("20231231".to_string()),
    };
    let merged = cli.merge(file);
    assert_eq!(merged.start_date.as_deref(), Some("20240101"));
    assert_eq!(merged.end_date.as_deref(), Some("20231231"));
}

#[test]
fn test_aggregation_args() {
    let factors = AggregationArgs::default().parse().unwrap();
    assert_eq!(factors, AggregationFactors::default());

    let factors = AggregationArgs {
        freq_aggregation: Some("64".to_string()),
        time_aggregation: None,
    }
    .parse()
    .unwrap();
    assert_eq!(factors.freq.get(), 64);
    assert_eq!(factors.time.get(), DEFAULT_TIME_AGGREGATION);

    let result = AggregationArgs {
        freq_aggregation: None,
        time_aggregation: Some("0".to_string()),
    }
    .parse();
    assert!(matches!(result, Err(AggregationFactorError::Zero)));

    let result = AggregationArgs {
        freq_aggregation: Some("1.5".to_string()),
        time_aggregation: None,
    }
    .parse();
    assert!(matches!(result, Err(AggregationFactorError::NotInteger(_))));
}

#[test]
fn test_parse_chunk_size() {
    assert_eq!(parse_chunk_size(None).unwrap().get(), DEFAULT_CHUNK_SIZE);
    assert_eq!(parse_chunk_size(Some("250")).unwrap().get(), 250);
    assert!(parse_chunk_size(Some("0")).is_err());
}

#[test]
fn test_parse_year_range() {
    assert_eq!(parse_year_range("2021-2023").unwrap(), 2021..=2023);
    assert_eq!(parse_year_range(" 2022 ").unwrap(), 2022..=2022);
    assert!(parse_year_range("2023-2021").is_err());
    assert!(parse_year_range("twenty").is_err());
}
