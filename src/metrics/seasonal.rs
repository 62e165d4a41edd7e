// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Comparing the Austral summer with the winter.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};

use super::{Metric, MetricsArchive};
use crate::{
    constants::{FREQ_DECIMALS, SUMMER_MONTHS},
    math::{dequantise, nan_mean, nan_std, quantise, welch_t_test},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Season {
    /// October to March.
    Summer,

    /// April to September.
    Winter,
}

impl Season {
    pub fn of(date: NaiveDate) -> Season {
        if SUMMER_MONTHS.contains(&date.month()) {
            Season::Summer
        } else {
            Season::Winter
        }
    }
}

/// How a metric differs between seasons at one frequency.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeasonalStats {
    pub freq_ghz: f64,
    pub summer_mean: f64,
    /// Sample standard deviation.
    pub summer_std: f64,
    pub winter_mean: f64,
    pub winter_std: f64,
    /// Welch's t statistic of summer against winter.
    pub t: f64,
    /// Two-sided p-value.
    pub p: f64,
}

impl MetricsArchive {
    /// For every frequency, compare a metric's daily values in summer with
    /// those in winter.
    pub fn seasonal_stats(&self, metric: Metric) -> Vec<SeasonalStats> {
        let mut per_freq: BTreeMap<i64, (Vec<f64>, Vec<f64>)> = BTreeMap::new();
        for day in self.days.iter() {
            let season = Season::of(day.date);
            for s in &day.stats {
                let (summer, winter) = per_freq
                    .entry(quantise(s.freq_ghz, FREQ_DECIMALS))
                    .or_default();
                match season {
                    Season::Summer => summer.push(s.get(metric)),
                    Season::Winter => winter.push(s.get(metric)),
                }
            }
        }

        per_freq
            .into_iter()
            .map(|(key, (summer, winter))| {
                let test = welch_t_test(&summer, &winter);
                SeasonalStats {
                    freq_ghz: dequantise(key, FREQ_DECIMALS),
                    summer_mean: nan_mean(&summer),
                    summer_std: nan_std(&summer, 1),
                    winter_mean: nan_mean(&winter),
                    winter_std: nan_std(&winter, 1),
                    t: test.t,
                    p: test.p,
                }
            })
            .collect()
    }
}
