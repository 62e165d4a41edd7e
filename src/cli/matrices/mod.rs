// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Sub-commands that make or fix day-matrix files.

#[cfg(test)]
mod tests;

use std::path::PathBuf;

use clap::Parser;
use log::{debug, info, trace, warn};
use serde::{Deserialize, Serialize};

use super::common::{
    describe_dates, display_warnings, AggregationArgs, ArgsError, DateRangeArgs, InfoPrinter,
    Warn, ARG_FILE_HELP,
};
use crate::{
    aggregation::reaggregate_directory,
    io::get_single_match_from_glob,
    matrix::{process_all_days, relabel_directory, DayMatrix},
    FileReport, RfimonError,
};

#[derive(Parser, Debug, Clone, Default, Serialize, Deserialize)]
pub(super) struct BuildMatricesArgs {
    #[clap(name = "ARGUMENTS_FILE", help = ARG_FILE_HELP.as_str(), parse(from_os_str))]
    pub(super) args_file: Option<PathBuf>,

    /// The directory containing the day directories (YYYYMMDD) of trace
    /// files.
    #[clap(short, long)]
    pub(super) input_dir: Option<PathBuf>,

    /// The directory to write the day matrices into.
    #[clap(short, long)]
    pub(super) output_dir: Option<PathBuf>,

    #[clap(flatten)]
    #[serde(default)]
    pub(super) dates: DateRangeArgs,

    #[clap(flatten)]
    #[serde(default)]
    pub(super) aggregation: AggregationArgs,

    /// Write the full-resolution matrices rather than aggregating them.
    #[clap(long, help_heading = "AGGREGATION")]
    #[serde(default)]
    pub(super) no_aggregation: bool,
}

impl BuildMatricesArgs {
    /// Both command-line and file arguments overlap in terms of what is
    /// available; this function consolidates everything that was specified into
    /// a single struct. Where applicable, it will prefer CLI parameters over
    /// those in the file.
    pub(super) fn merge(self) -> Result<BuildMatricesArgs, RfimonError> {
        debug!("Merging command-line arguments with the argument file");

        let cli_args = self;

        if let Some(arg_file) = cli_args.args_file {
            let BuildMatricesArgs {
                args_file: _,
                input_dir,
                output_dir,
                dates,
                aggregation,
                no_aggregation,
            } = unpack_arg_file!(arg_file);

            Ok(BuildMatricesArgs {
                args_file: None,
                input_dir: cli_args.input_dir.or(input_dir),
                output_dir: cli_args.output_dir.or(output_dir),
                dates: cli_args.dates.merge(dates),
                aggregation: cli_args.aggregation.merge(aggregation),
                no_aggregation: cli_args.no_aggregation || no_aggregation,
            })
        } else {
            Ok(cli_args)
        }
    }

    pub(super) fn run(self, dry_run: bool) -> Result<(), RfimonError> {
        debug!("Converting arguments into parameters");
        trace!("{:#?}", self);

        let Self {
            args_file: _,
            input_dir,
            output_dir,
            dates,
            aggregation,
            no_aggregation,
        } = self;
        let input_dir = input_dir.ok_or(ArgsError::Missing("input directory"))?;
        let output_dir = output_dir.ok_or(ArgsError::Missing("output directory"))?;
        let range = dates.parse()?;
        let aggregation = if no_aggregation {
            if aggregation != AggregationArgs::default() {
                "Aggregation factors were given, but --no-aggregation means they're ignored"
                    .warn();
            }
            None
        } else {
            Some(aggregation.parse()?)
        };

        let mut printer = InfoPrinter::new("Building day matrices".into());
        printer.push_line(format!("From: {}", input_dir.display()).into());
        printer.push_line(format!("Into: {}", output_dir.display()).into());
        printer.push_line(describe_dates(range));
        printer.push_line(
            match aggregation {
                Some(factors) => format!("Aggregation: {factors}"),
                None => "Aggregation: none".to_string(),
            }
            .into(),
        );
        printer.display();
        display_warnings();

        if dry_run {
            info!("Dry run -- exiting now.");
            return Ok(());
        }

        let report = process_all_days(&input_dir, &output_dir, range, aggregation)?;
        info!(
            "Wrote {} matrices; {} days had no data",
            report.written.len(),
            report.empty_days.len()
        );
        for (date, err) in &report.failed {
            warn!("{date} failed: {err}");
        }
        Ok(())
    }
}

/// Log the outcome of a batch over files.
fn log_report(report: &FileReport) {
    info!("Wrote {} files", report.written.len());
    for (path, err) in &report.failed {
        warn!("{} failed: {err}", path.display());
    }
}

#[derive(Parser, Debug, Clone, Default)]
pub(super) struct ReaggregateArgs {
    /// The directory containing day-matrix files.
    #[clap(short, long, parse(from_os_str))]
    pub(super) input_dir: PathBuf,

    /// The directory to write the aggregated matrices into. They keep their
    /// file names.
    #[clap(short, long, parse(from_os_str))]
    pub(super) output_dir: PathBuf,

    #[clap(flatten)]
    pub(super) aggregation: AggregationArgs,
}

impl ReaggregateArgs {
    pub(super) fn run(self, dry_run: bool) -> Result<(), RfimonError> {
        let factors = self.aggregation.parse()?;

        let mut printer = InfoPrinter::new("Re-aggregating day matrices".into());
        printer.push_line(format!("From: {}", self.input_dir.display()).into());
        printer.push_line(format!("Into: {}", self.output_dir.display()).into());
        printer.push_line(format!("Aggregation: {factors}").into());
        printer.display();

        if dry_run {
            info!("Dry run -- exiting now.");
            return Ok(());
        }

        let report = reaggregate_directory(&self.input_dir, &self.output_dir, factors)?;
        log_report(&report);
        Ok(())
    }
}

#[derive(Parser, Debug, Clone, Default)]
pub(super) struct RelabelArgs {
    /// The matrix file whose frequencies are correct. Globs are accepted, as
    /// long as they match only one file.
    #[clap(short, long)]
    pub(super) reference: String,

    /// The directory containing the day-matrix files to relabel.
    #[clap(short, long, parse(from_os_str))]
    pub(super) input_dir: PathBuf,

    /// The directory to write the relabelled matrices into. They keep their
    /// file names.
    #[clap(short, long, parse(from_os_str))]
    pub(super) output_dir: PathBuf,
}

impl RelabelArgs {
    pub(super) fn run(self, dry_run: bool) -> Result<(), RfimonError> {
        let reference_file = get_single_match_from_glob(&self.reference)?;

        let mut printer = InfoPrinter::new("Relabelling day matrices".into());
        printer.push_line(format!("Reference: {}", reference_file.display()).into());
        printer.push_line(format!("From: {}", self.input_dir.display()).into());
        printer.push_line(format!("Into: {}", self.output_dir.display()).into());
        printer.display();

        if dry_run {
            info!("Dry run -- exiting now.");
            return Ok(());
        }

        let reference = DayMatrix::read_csv(&reference_file)?;
        let report = relabel_directory(&self.input_dir, &self.output_dir, &reference)?;
        log_report(&report);
        Ok(())
    }
}
