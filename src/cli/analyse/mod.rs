// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Sub-commands that analyse a directory of daily metrics files.


use std::path::{Path, PathBuf};

use clap::Parser;
use log::info;

use super::common::{describe_dates, DateRangeArgs, InfoPrinter, METRIC_HELP};
use crate::{
    constants::{DEFAULT_HIGH_VALUE_DBM, DEFAULT_SIGNIFICANCE, DEFAULT_VALID_FRACTION},
    metrics::{
        write_background, write_daily_average, write_frequency_sets, write_high_values,
        write_missing_dates, write_seasonal_stats, write_super_matrix, Metric, MetricsArchive,
    },
    time::DateRange,
    RfimonError,
};

/// Arguments shared by every analysis.
#[derive(Parser, Debug, Clone)]
pub(super) struct MetricsInputArgs {
    /// The directory containing the daily metrics files
    /// (<YYYYMMDD>_metrics.csv).
    #[clap(short, long, parse(from_os_str))]
    pub(super) metrics_dir: PathBuf,

    #[clap(flatten)]
    pub(super) dates: DateRangeArgs,
}

impl MetricsInputArgs {
    fn parse(&self) -> Result<DateRange, RfimonError> {
        Ok(self.dates.parse()?)
    }

    fn load(&self, range: DateRange) -> Result<MetricsArchive, RfimonError> {
        let archive = MetricsArchive::load(&self.metrics_dir, range)?;
        info!(
            "Loaded {} days of metrics ({} to {})",
            archive.days.len(),
            archive.first_date(),
            archive.last_date()
        );
        Ok(archive)
    }
}

/// Print what an analysis is about to do.
fn announce(title: &str, input: &MetricsInputArgs, range: DateRange, outputs: &[&Path]) {
    let mut printer = InfoPrinter::new(title.to_string().into());
    printer.push_line(format!("Metrics: {}", input.metrics_dir.display()).into());
    printer.push_line(describe_dates(range));
    printer.push_block(
        outputs
            .iter()
            .map(|o| format!("Output: {}", o.display()).into())
            .collect(),
    );
    printer.display();
}

#[cfg(not(feature = "plotting"))]
fn check_plotting(plot: &Option<PathBuf>) -> Result<(), RfimonError> {
    match plot {
        Some(_) => Err(super::common::ArgsError::NoPlottingFeature.into()),
        None => Ok(()),
    }
}

#[cfg(feature = "plotting")]
fn check_plotting(_: &Option<PathBuf>) -> Result<(), RfimonError> {
    Ok(())
}

#[derive(Parser, Debug, Clone)]
pub(super) struct MissingDaysArgs {
    #[clap(flatten)]
    pub(super) input: MetricsInputArgs,

    /// The CSV file listing the missing days.
    #[clap(short, long, parse(from_os_str))]
    pub(super) output: PathBuf,
}

impl MissingDaysArgs {
    pub(super) fn run(self, dry_run: bool) -> Result<(), RfimonError> {
        let range = self.input.parse()?;
        announce("Finding missing days", &self.input, range, &[&self.output]);
        if dry_run {
            info!("Dry run -- exiting now.");
            return Ok(());
        }

        let archive = self.input.load(range)?;
        let missing = archive.missing_dates(range)?;
        write_missing_dates(&self.output, &missing)?;
        info!("{} days are missing", missing.len());
        Ok(())
    }
}

#[derive(Parser, Debug, Clone)]
pub(super) struct HighValuesArgs {
    #[clap(flatten)]
    pub(super) input: MetricsInputArgs,

    /// Report daily maxima strictly above this power [dBm].
    #[clap(short, long, default_value_t = DEFAULT_HIGH_VALUE_DBM, allow_hyphen_values = true)]
    pub(super) threshold: f64,

    /// The CSV file listing the high values.
    #[clap(short, long, parse(from_os_str))]
    pub(super) output: PathBuf,
}

impl HighValuesArgs {
    pub(super) fn run(self, dry_run: bool) -> Result<(), RfimonError> {
        let range = self.input.parse()?;
        announce(
            &format!("Finding maxima above {} dBm", self.threshold),
            &self.input,
            range,
            &[&self.output],
        );
        if dry_run {
            info!("Dry run -- exiting now.");
            return Ok(());
        }

        let archive = self.input.load(range)?;
        let high_values = archive.high_values(self.threshold);
        write_high_values(&self.output, &high_values)?;
        info!("Found {} high values", high_values.len());
        Ok(())
    }
}

#[derive(Parser, Debug, Clone)]
pub(super) struct FrequencySetsArgs {
    #[clap(flatten)]
    pub(super) input: MetricsInputArgs,

    /// The CSV file mapping each day to its frequency set.
    #[clap(short, long, parse(from_os_str))]
    pub(super) output: PathBuf,
}

impl FrequencySetsArgs {
    pub(super) fn run(self, dry_run: bool) -> Result<(), RfimonError> {
        let range = self.input.parse()?;
        announce("Grouping days by frequency set", &self.input, range, &[&self.output]);
        if dry_run {
            info!("Dry run -- exiting now.");
            return Ok(());
        }

        let archive = self.input.load(range)?;
        let sets = archive.frequency_sets();
        write_frequency_sets(&self.output, &sets)?;
        info!("{} distinct frequency sets", sets.sets.len());
        for (i, set) in sets.sets.iter().enumerate() {
            info!("  Set {i}: {} frequencies", set.len());
        }
        Ok(())
    }
}

#[derive(Parser, Debug, Clone)]
pub(super) struct BackgroundArgs {
    #[clap(flatten)]
    pub(super) input: MetricsInputArgs,

    /// The CSV file of background estimates.
    #[clap(short, long, parse(from_os_str))]
    pub(super) output: PathBuf,
}

impl BackgroundArgs {
    pub(super) fn run(self, dry_run: bool) -> Result<(), RfimonError> {
        let range = self.input.parse()?;
        announce("Estimating the background", &self.input, range, &[&self.output]);
        if dry_run {
            info!("Dry run -- exiting now.");
            return Ok(());
        }

        let archive = self.input.load(range)?;
        write_background(&self.output, &archive.background())?;
        Ok(())
    }
}

#[derive(Parser, Debug, Clone)]
pub(super) struct SuperMatrixArgs {
    #[clap(flatten)]
    pub(super) input: MetricsInputArgs,

    #[clap(long, help = METRIC_HELP.as_str(), default_value = "mean")]
    pub(super) metric: Metric,

    /// Days with a value at fewer than this fraction of the frequencies are
    /// blanked.
    #[clap(long, default_value_t = DEFAULT_VALID_FRACTION)]
    pub(super) valid_fraction: f64,

    /// The CSV file of the super matrix.
    #[clap(short, long, parse(from_os_str))]
    pub(super) output: PathBuf,
}

impl SuperMatrixArgs {
    pub(super) fn run(self, dry_run: bool) -> Result<(), RfimonError> {
        let range = self.input.parse()?;
        if !(0.0..=1.0).contains(&self.valid_fraction) {
            return Err(RfimonError::Metrics(format!(
                "The valid fraction must be between 0 and 1, not {}",
                self.valid_fraction
            )));
        }
        announce(
            &format!("Building the {} super matrix", self.metric),
            &self.input,
            range,
            &[&self.output],
        );
        if dry_run {
            info!("Dry run -- exiting now.");
            return Ok(());
        }

        let archive = self.input.load(range)?;
        let matrix = archive.super_matrix(self.metric, self.valid_fraction);
        info!(
            "Super matrix has {} days and {} frequencies",
            matrix.dates.len(),
            matrix.freqs.len()
        );
        write_super_matrix(&self.output, &matrix)?;
        Ok(())
    }
}

#[derive(Parser, Debug, Clone)]
pub(super) struct SeasonalArgs {
    #[clap(flatten)]
    pub(super) input: MetricsInputArgs,

    #[clap(long, help = METRIC_HELP.as_str(), default_value = "mean")]
    pub(super) metric: Metric,

    /// The CSV file of seasonal statistics.
    #[clap(short, long, parse(from_os_str))]
    pub(super) output: PathBuf,

    /// Also plot the p-values into this PNG file.
    #[clap(long, parse(from_os_str))]
    pub(super) plot: Option<PathBuf>,

    /// The significance level drawn on the plot.
    #[clap(long, default_value_t = DEFAULT_SIGNIFICANCE)]
    pub(super) alpha: f64,
}

impl SeasonalArgs {
    pub(super) fn run(self, dry_run: bool) -> Result<(), RfimonError> {
        check_plotting(&self.plot)?;
        let range = self.input.parse()?;
        let mut outputs = vec![self.output.as_path()];
        outputs.extend(self.plot.as_deref());
        announce(
            &format!("Comparing the {} between seasons", self.metric),
            &self.input,
            range,
            &outputs,
        );
        if dry_run {
            info!("Dry run -- exiting now.");
            return Ok(());
        }

        let archive = self.input.load(range)?;
        let stats = archive.seasonal_stats(self.metric);
        write_seasonal_stats(&self.output, &stats)?;
        let num_significant = stats.iter().filter(|s| s.p < self.alpha).count();
        info!(
            "{num_significant} of {} frequencies differ between seasons (p < {})",
            stats.len(),
            self.alpha
        );

        #[cfg(feature = "plotting")]
        if let Some(plot) = &self.plot {
            let p_values: Vec<(f64, f64)> = stats.iter().map(|s| (s.freq_ghz, s.p)).collect();
            crate::plotting::plot_p_values(
                &p_values,
                self.alpha,
                &format!("Seasonal p-values of the {}", self.metric.column()),
                plot,
            )?;
            info!("Wrote {}", plot.display());
        }
        Ok(())
    }
}

#[derive(Parser, Debug, Clone)]
pub(super) struct DailyAverageArgs {
    #[clap(flatten)]
    pub(super) input: MetricsInputArgs,

    #[clap(long, help = METRIC_HELP.as_str(), default_value = "mean")]
    pub(super) metric: Metric,

    /// The CSV file of daily averages.
    #[clap(short, long, parse(from_os_str))]
    pub(super) output: PathBuf,

    /// Also plot the averages into this PNG file.
    #[clap(long, parse(from_os_str))]
    pub(super) plot: Option<PathBuf>,
}

impl DailyAverageArgs {
    pub(super) fn run(self, dry_run: bool) -> Result<(), RfimonError> {
        check_plotting(&self.plot)?;
        let range = self.input.parse()?;
        let mut outputs = vec![self.output.as_path()];
        outputs.extend(self.plot.as_deref());
        announce(
            &format!("Averaging the {} of each day", self.metric),
            &self.input,
            range,
            &outputs,
        );
        if dry_run {
            info!("Dry run -- exiting now.");
            return Ok(());
        }

        let archive = self.input.load(range)?;
        let averages = archive.daily_average(self.metric);
        write_daily_average(&self.output, self.metric, &averages)?;

        #[cfg(feature = "plotting")]
        if let Some(plot) = &self.plot {
            crate::plotting::plot_daily_average(
                &averages,
                self.metric,
                &format!("Daily average of the {}", self.metric),
                plot,
            )?;
            info!("Wrote {}", plot.display());
        }
        Ok(())
    }
}
