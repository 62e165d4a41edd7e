// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Bring the campaign's products up to date: download everything since a
//! start date, build aggregated matrices of the new days and summarise them.

use std::path::PathBuf;

use clap::Parser;
use log::{debug, info, trace, warn};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use super::{
    common::{
        display_warnings, parse_chunk_size, AggregationArgs, ArgsError, InfoPrinter,
        ARG_FILE_HELP, CHUNK_SIZE_HELP,
    },
    download::{URL_HELP, WORKERS_HELP},
};
use crate::{
    constants::{DEFAULT_ARCHIVE_URL, DEFAULT_DOWNLOAD_WORKERS},
    download::download_archives,
    matrix::process_all_days,
    summary::{summarise_directory, MatrixSelection, SummaryKind},
    time::{parse_date, DateRange},
    RfimonError,
};

#[derive(Parser, Debug, Clone, Default, Serialize, Deserialize)]
pub(super) struct PipelineArgs {
    #[clap(name = "ARGUMENTS_FILE", help = ARG_FILE_HELP.as_str(), parse(from_os_str))]
    pub(super) args_file: Option<PathBuf>,

    /// Process every day on or after this one (YYYYMMDD or YYYY-MM-DD).
    #[clap(short, long)]
    pub(super) start_date: Option<String>,

    #[clap(short, long, help = URL_HELP.as_str())]
    pub(super) url: Option<String>,

    /// The directory that archives are unpacked into.
    #[clap(long)]
    pub(super) raw_dir: Option<PathBuf>,

    /// The directory that aggregated day matrices are written into.
    #[clap(long)]
    pub(super) matrix_dir: Option<PathBuf>,

    /// The directory that metrics files are written into.
    #[clap(long)]
    pub(super) metrics_dir: Option<PathBuf>,

    #[clap(short = 'j', long, help = WORKERS_HELP.as_str())]
    pub(super) workers: Option<usize>,

    #[clap(flatten)]
    #[serde(default)]
    pub(super) aggregation: AggregationArgs,

    #[clap(long, help = CHUNK_SIZE_HELP.as_str())]
    pub(super) chunk_size: Option<String>,
}

impl PipelineArgs {
    /// Both command-line and file arguments overlap in terms of what is
    /// available; this function consolidates everything that was specified into
    /// a single struct. Where applicable, it will prefer CLI parameters over
    /// those in the file.
    pub(super) fn merge(self) -> Result<PipelineArgs, RfimonError> {
        debug!("Merging command-line arguments with the argument file");

        let cli_args = self;

        if let Some(arg_file) = cli_args.args_file {
            let PipelineArgs {
                args_file: _,
                start_date,
                url,
                raw_dir,
                matrix_dir,
                metrics_dir,
                workers,
                aggregation,
                chunk_size,
            } = unpack_arg_file!(arg_file);

            Ok(PipelineArgs {
                args_file: None,
                start_date: cli_args.start_date.or(start_date),
                url: cli_args.url.or(url),
                raw_dir: cli_args.raw_dir.or(raw_dir),
                matrix_dir: cli_args.matrix_dir.or(matrix_dir),
                metrics_dir: cli_args.metrics_dir.or(metrics_dir),
                workers: cli_args.workers.or(workers),
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
            start_date,
            url,
            raw_dir,
            matrix_dir,
            metrics_dir,
            workers,
            aggregation,
            chunk_size,
        } = self;
        let start_date = start_date.ok_or(ArgsError::Missing("start date"))?;
        let range = DateRange::since(parse_date(&start_date)?);
        let raw_dir = raw_dir.ok_or(ArgsError::Missing("raw data directory"))?;
        let matrix_dir = matrix_dir.ok_or(ArgsError::Missing("matrix directory"))?;
        let metrics_dir = metrics_dir.ok_or(ArgsError::Missing("metrics directory"))?;
        let url = url.unwrap_or_else(|| DEFAULT_ARCHIVE_URL.to_string());
        let workers = match workers.unwrap_or(DEFAULT_DOWNLOAD_WORKERS) {
            0 => return Err(ArgsError::ZeroWorkers.into()),
            n => n,
        };
        let factors = aggregation.parse()?;
        let chunk_size = parse_chunk_size(chunk_size.as_deref())?;

        let mut printer = InfoPrinter::new("Running the daily pipeline".into());
        printer.push_line(format!("Days: {range}").into());
        printer.push_block(vec![
            format!("Download from: {url}").into(),
            format!("Workers: {workers}").into(),
            format!("Unpack into: {}", raw_dir.display()).into(),
        ]);
        printer.push_block(vec![
            format!("Matrices into: {}", matrix_dir.display()).into(),
            format!("Aggregation: {factors}").into(),
        ]);
        printer.push_line(format!("Metrics into: {}", metrics_dir.display()).into());
        printer.display();
        display_warnings();

        if dry_run {
            info!("Dry run -- exiting now.");
            return Ok(());
        }

        let client = Client::builder().build()?;
        let downloads = download_archives(&client, &url, &raw_dir, range, workers)?;
        for (archive, err) in &downloads.failed {
            warn!("{} failed: {err}", archive.name);
        }
        info!("Data download and unpacking complete.");

        let matrices = process_all_days(&raw_dir, &matrix_dir, range, Some(factors))?;
        info!("Aggregated matrices complete ({} days).", matrices.written.len());

        let selection = MatrixSelection {
            dates: range,
            years: None,
        };
        let summaries = summarise_directory(
            &matrix_dir,
            &metrics_dir,
            &selection,
            SummaryKind::Metrics,
            chunk_size,
        )?;
        info!("Metrics computation complete ({} days).", summaries.written.len());
        Ok(())
    }
}
