// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::path::PathBuf;

use clap::Parser;
use log::{debug, info, trace, warn};
use serde::{Deserialize, Serialize};

use super::common::{
    describe_dates, display_warnings, parse_chunk_size, parse_year_range, AggregationArgs,
    ArgsError, DateRangeArgs, InfoPrinter, Warn, ARG_FILE_HELP, CHUNK_SIZE_HELP,
};
use crate::{
    summary::{summarise_directory, MatrixSelection, SummaryKind},
    RfimonError,
};

#[derive(Parser, Debug, Clone, Default, Serialize, Deserialize)]
pub(super) struct SummariseArgs {
    #[clap(name = "ARGUMENTS_FILE", help = ARG_FILE_HELP.as_str(), parse(from_os_str))]
    pub(super) args_file: Option<PathBuf>,

    /// The directory containing day-matrix files. Matrices are searched for
    /// at any depth.
    #[clap(short, long)]
    pub(super) input_dir: Option<PathBuf>,

    /// The directory to write the summaries into.
    #[clap(short, long)]
    pub(super) output_dir: Option<PathBuf>,

    #[clap(flatten)]
    #[serde(default)]
    pub(super) dates: DateRangeArgs,

    /// Only summarise matrices inside year directories (e.g. .../2021/...)
    /// within this range, e.g. "2021-2023" or "2022".
    #[clap(long, help_heading = "DATES")]
    pub(super) years: Option<String>,

    /// Write the peak power of each aggregated frequency
    /// (<YYYYMMDD>_summary.csv) rather than the full statistics
    /// (<YYYYMMDD>_metrics.csv).
    #[clap(long)]
    #[serde(default)]
    pub(super) peak: bool,

    /// The aggregation used by --peak.
    #[clap(flatten)]
    #[serde(default)]
    pub(super) aggregation: AggregationArgs,

    #[clap(long, help = CHUNK_SIZE_HELP.as_str())]
    pub(super) chunk_size: Option<String>,
}

impl SummariseArgs {
    /// Both command-line and file arguments overlap in terms of what is
    /// available; this function consolidates everything that was specified into
    /// a single struct. Where applicable, it will prefer CLI parameters over
    /// those in the file.
    pub(super) fn merge(self) -> Result<SummariseArgs, RfimonError> {
        debug!("Merging command-line arguments with the argument file");

        let cli_args = self;

        if let Some(arg_file) = cli_args.args_file {
            let SummariseArgs {
                args_file: _,
                input_dir,
                output_dir,
                dates,
                years,
                peak,
                aggregation,
                chunk_size,
            } = unpack_arg_file!(arg_file);

            Ok(SummariseArgs {
                args_file: None,
                input_dir: cli_args.input_dir.or(input_dir),
                output_dir: cli_args.output_dir.or(output_dir),
                dates: cli_args.dates.merge(dates),
                years: cli_args.years.or(years),
                peak: cli_args.peak || peak,
                aggregation: cli_args.aggregation.merge(aggregation),
                chunk_size: cli_args.chunk_size.or(chunk_size),
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
            years,
            peak,
            aggregation,
            chunk_size,
        } = self;
        let input_dir = input_dir.ok_or(ArgsError::Missing("input directory"))?;
        let output_dir = output_dir.ok_or(ArgsError::Missing("output directory"))?;
        let selection = MatrixSelection {
            dates: dates.parse()?,
            years: years.as_deref().map(parse_year_range).transpose()?,
        };
        let kind = if peak {
            SummaryKind::Peak(aggregation.parse()?)
        } else {
            if aggregation != AggregationArgs::default() {
                "Aggregation factors are only used with --peak; ignoring them".warn();
            }
            SummaryKind::Metrics
        };
        let chunk_size = parse_chunk_size(chunk_size.as_deref())?;

        let mut printer = InfoPrinter::new("Summarising day matrices".into());
        printer.push_line(format!("From: {}", input_dir.display()).into());
        printer.push_line(format!("Into: {}", output_dir.display()).into());
        let mut block = vec![describe_dates(selection.dates)];
        if let Some(years) = &selection.years {
            block.push(format!("Years: {} to {}", years.start(), years.end()).into());
        }
        printer.push_block(block);
        printer.push_line(
            match kind {
                SummaryKind::Metrics => "Summary: statistics per frequency".to_string(),
                SummaryKind::Peak(factors) => format!("Summary: peak power after {factors}"),
            }
            .into(),
        );
        printer.push_line(format!("Chunk size: {chunk_size}").into());
        printer.display();
        display_warnings();

        if dry_run {
            info!("Dry run -- exiting now.");
            return Ok(());
        }

        let report = summarise_directory(&input_dir, &output_dir, &selection, kind, chunk_size)?;
        info!("Wrote {} summaries", report.written.len());
        for (path, err) in &report.failed {
            warn!("{} failed: {err}", path.display());
        }
        Ok(())
    }
}
