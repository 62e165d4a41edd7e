// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Analyses of an archive of daily metrics files (`<YYYYMMDD>_metrics.csv`).

mod error;
mod output;
mod seasonal;

pub use error::MetricsError;
pub use output::*;
pub use seasonal::{Season, SeasonalStats};

use std::{collections::BTreeMap, path::Path};

use chrono::NaiveDate;
use indexmap::IndexMap;
use log::{debug, info, warn};
use ndarray::prelude::*;
use strum_macros::{Display, EnumIter, EnumString};
use vec1::Vec1;

use crate::{
    constants::{FREQ_DECIMALS, METRICS_SUFFIX},
    io::find_files_with_suffix,
    math::{dequantise, nan_mean, quantise},
    summary::{read_metrics, FrequencyStats},
    time::{date_from_file_name, DateRange},
};

/// A statistic of a metrics file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum Metric {
    #[strum(serialize = "mean")]
    Mean,

    #[strum(serialize = "median")]
    Median,

    #[strum(serialize = "min")]
    Min,

    #[strum(serialize = "max")]
    Max,

    #[strum(serialize = "skew")]
    Skew,

    #[strum(serialize = "kurtosis")]
    Kurtosis,
}

impl Metric {
    /// The name of this metric's column in a metrics file.
    pub fn column(self) -> &'static str {
        match self {
            Metric::Mean => "Mean (dBm)",
            Metric::Median => "Median (dBm)",
            Metric::Min => "Min (dBm)",
            Metric::Max => "Max (dBm)",
            Metric::Skew => "Skew",
            Metric::Kurtosis => "Kurtosis",
        }
    }
}

/// The metrics file of one day.
#[derive(Debug, Clone)]
pub struct DailyMetrics {
    pub date: NaiveDate,
    pub stats: Vec<FrequencyStats>,
}

/// A day's maximum above the high-value threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HighValue {
    pub date: NaiveDate,
    pub freq_ghz: f64,
    pub max_dbm: f64,
}

/// Days grouped by the frequencies in their metrics files.
#[derive(Debug, Clone, PartialEq)]
pub struct FrequencySets {
    /// Each day and the index of its set in `sets`.
    pub by_date: Vec<(NaiveDate, usize)>,

    /// The distinct sets of frequencies \[GHz\], in order of first appearance.
    pub sets: Vec<Vec<f64>>,
}

/// Background estimates of one frequency.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Background {
    pub freq_ghz: f64,

    /// The daily median averaged over all days \[dBm\].
    pub avg_median: f64,

    /// `median + 5 (max - min) / 6` averaged over all days \[dBm\]. Treating a
    /// day's range as 6 standard deviations, this is roughly 5 sigma above
    /// the median.
    pub avg_five_sigma: f64,
}

/// One metric on a grid of every day (rows) by every frequency (columns).
#[derive(Debug, Clone, PartialEq)]
pub struct SuperMatrix {
    pub metric: Metric,
    pub dates: Vec<NaiveDate>,
    pub freqs: Vec<f64>,
    pub data: Array2<f64>,
}

/// Daily metrics of a date range, in date order.
#[derive(Debug, Clone)]
pub struct MetricsArchive {
    pub days: Vec1<DailyMetrics>,
}

impl MetricsArchive {
    /// Read every `*_metrics.csv` file directly in `dir` whose date is in
    /// `range`. Files that can't be read are logged and skipped.
    pub fn load(dir: &Path, range: DateRange) -> Result<MetricsArchive, MetricsError> {
        let mut days = vec![];
        for path in find_files_with_suffix(dir, METRICS_SUFFIX, false)? {
            let date = match date_from_file_name(&path) {
                Some(d) => d,
                None => {
                    debug!("Ignoring '{}'; it isn't named after a date", path.display());
                    continue;
                }
            };
            if !range.contains(date) {
                continue;
            }
            match read_metrics(&path) {
                Ok(stats) => days.push(DailyMetrics { date, stats }),
                Err(e) => warn!("Error processing {}: {e}", path.display()),
            }
        }
        info!("Loaded {} metrics files ({range})", days.len());

        MetricsArchive::from_days(days).map_err(|_| MetricsError::NoMetricsFiles {
            dir: dir.to_path_buf(),
            range,
        })
    }

    /// Sort days into an archive. There must be at least one.
    pub fn from_days(mut days: Vec<DailyMetrics>) -> Result<MetricsArchive, MetricsError> {
        days.sort_by_key(|d| d.date);
        let days = Vec1::try_from_vec(days).map_err(|_| MetricsError::Empty)?;
        Ok(MetricsArchive { days })
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.days.iter().map(|d| d.date).collect()
    }

    pub fn first_date(&self) -> NaiveDate {
        self.days.first().date
    }

    pub fn last_date(&self) -> NaiveDate {
        self.days.last().date
    }

    /// Every day in `range` without a metrics file. An open end of the range
    /// is closed by the archive's first or last day.
    pub fn missing_dates(&self, range: DateRange) -> Result<Vec<NaiveDate>, MetricsError> {
        let range = DateRange::new(
            Some(range.start.unwrap_or_else(|| self.first_date())),
            Some(range.end.unwrap_or_else(|| self.last_date())),
        )?;
        let have = self.dates();
        Ok(range
            .days()?
            .into_iter()
            .filter(|d| have.binary_search(d).is_err())
            .collect())
    }

    /// Every frequency of every day whose maximum is above `threshold_dbm`.
    pub fn high_values(&self, threshold_dbm: f64) -> Vec<HighValue> {
        self.days
            .iter()
            .flat_map(|day| {
                day.stats
                    .iter()
                    .filter(move |s| s.max > threshold_dbm)
                    .map(move |s| HighValue {
                        date: day.date,
                        freq_ghz: s.freq_ghz,
                        max_dbm: s.max,
                    })
            })
            .collect()
    }

    /// Group days by their sets of frequencies. Set identifiers count up from
    /// 0 in date order.
    pub fn frequency_sets(&self) -> FrequencySets {
        let mut ids: IndexMap<Vec<i64>, usize> = IndexMap::new();
        let mut by_date = Vec::with_capacity(self.days.len());
        for day in self.days.iter() {
            let mut keys: Vec<i64> = day
                .stats
                .iter()
                .map(|s| quantise(s.freq_ghz, FREQ_DECIMALS))
                .collect();
            keys.sort_unstable();
            keys.dedup();
            let next_id = ids.len();
            let id = *ids.entry(keys).or_insert(next_id);
            by_date.push((day.date, id));
        }

        FrequencySets {
            by_date,
            sets: ids
                .into_keys()
                .map(|keys| {
                    keys.into_iter()
                        .map(|k| dequantise(k, FREQ_DECIMALS))
                        .collect()
                })
                .collect(),
        }
    }

    /// The mean of a metric over all frequencies, for each day.
    pub fn daily_average(&self, metric: Metric) -> Vec<(NaiveDate, f64)> {
        self.days
            .iter()
            .map(|day| {
                let values: Vec<f64> = day.stats.iter().map(|s| s.get(metric)).collect();
                (day.date, nan_mean(&values))
            })
            .collect()
    }

    /// Put a metric on a grid of every day from the first to the last (rows)
    /// by every frequency seen on any day (columns, ascending). Days with
    /// values at fewer than `valid_fraction` of the frequencies are blanked,
    /// as are days without a file.
    pub fn super_matrix(&self, metric: Metric, valid_fraction: f64) -> SuperMatrix {
        let dates: Vec<NaiveDate> = self
            .first_date()
            .iter_days()
            .take_while(|d| *d <= self.last_date())
            .collect();
        let freq_index: BTreeMap<i64, usize> = {
            let mut keys: Vec<i64> = self
                .days
                .iter()
                .flat_map(|d| d.stats.iter())
                .map(|s| quantise(s.freq_ghz, FREQ_DECIMALS))
                .collect();
            keys.sort_unstable();
            keys.dedup();
            keys.into_iter().enumerate().map(|(i, k)| (k, i)).collect()
        };

        let mut data = Array2::from_elem((dates.len(), freq_index.len()), f64::NAN);
        for day in self.days.iter() {
            let i_date = (day.date - self.first_date()).num_days() as usize;
            for s in &day.stats {
                data[(i_date, freq_index[&quantise(s.freq_ghz, FREQ_DECIMALS)])] = s.get(metric);
            }
        }

        let needed = freq_index.len() as f64 * valid_fraction;
        let mut num_blanked = 0;
        for mut row in data.outer_iter_mut() {
            let count = row.iter().filter(|v| !v.is_nan()).count();
            if (count as f64) < needed {
                row.fill(f64::NAN);
                num_blanked += 1;
            }
        }
        debug!("Blanked {num_blanked} of {} days", dates.len());

        SuperMatrix {
            metric,
            dates,
            freqs: freq_index
                .into_keys()
                .map(|k| dequantise(k, FREQ_DECIMALS))
                .collect(),
            data,
        }
    }

    /// Estimate the background of each frequency from its daily median,
    /// minimum and maximum.
    pub fn background(&self) -> Vec<Background> {
        let mut per_freq: BTreeMap<i64, (Vec<f64>, Vec<f64>)> = BTreeMap::new();
        for s in self.days.iter().flat_map(|d| d.stats.iter()) {
            let (medians, five_sigmas) = per_freq
                .entry(quantise(s.freq_ghz, FREQ_DECIMALS))
                .or_default();
            medians.push(s.median);
            five_sigmas.push(s.median + 5.0 * (s.max - s.min) / 6.0);
        }

        per_freq
            .into_iter()
            .map(|(key, (medians, five_sigmas))| Background {
                freq_ghz: dequantise(key, FREQ_DECIMALS),
                avg_median: nan_mean(&medians),
                avg_five_sigma: nan_mean(&five_sigmas),
            })
            .collect()
    }
}
