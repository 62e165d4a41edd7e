// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::path::PathBuf;

use clap::Parser;
use log::{debug, info, trace, warn};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use super::common::{
    describe_dates, display_warnings, ArgsError, DateRangeArgs, InfoPrinter, ARG_FILE_HELP,
};
use crate::{
    constants::{DEFAULT_ARCHIVE_URL, DEFAULT_DOWNLOAD_WORKERS},
    download::download_archives,
    RfimonError,
};

lazy_static::lazy_static! {
    pub(super) static ref URL_HELP: String =
        format!("The web directory listing the daily archives. Default: {DEFAULT_ARCHIVE_URL}");

    pub(super) static ref WORKERS_HELP: String =
        format!("The number of archives to download at the same time. Default: {DEFAULT_DOWNLOAD_WORKERS}");
}

#[derive(Parser, Debug, Clone, Default, Serialize, Deserialize)]
pub(super) struct DownloadArgs {
    #[clap(name = "ARGUMENTS_FILE", help = ARG_FILE_HELP.as_str(), parse(from_os_str))]
    pub(super) args_file: Option<PathBuf>,

    #[clap(short, long, help = URL_HELP.as_str())]
    pub(super) url: Option<String>,

    /// The directory that archives are unpacked into. Each archive unpacks
    /// into a directory named after its day.
    #[clap(short, long)]
    pub(super) output_dir: Option<PathBuf>,

    #[clap(flatten)]
    #[serde(default)]
    pub(super) dates: DateRangeArgs,

    #[clap(short = 'j', long, help = WORKERS_HELP.as_str())]
    pub(super) workers: Option<usize>,
}

impl DownloadArgs {
    /// Both command-line and file arguments overlap in terms of what is
    /// available; this function consolidates everything that was specified into
    /// a single struct. Where applicable, it will prefer CLI parameters over
    /// those in the file.
    pub(super) fn merge(self) -> Result<DownloadArgs, RfimonError> {
        debug!("Merging command-line arguments with the argument file");

        let cli_args = self;

        if let Some(arg_file) = cli_args.args_file {
            // Read in the file arguments. Ensure all of the file args are
            // accounted for by pattern matching.
            let DownloadArgs {
                args_file: _,
                url,
                output_dir,
                dates,
                workers,
            } = unpack_arg_file!(arg_file);

            // Merge all the arguments, preferring the CLI args when available.
            Ok(DownloadArgs {
                args_file: None,
                url: cli_args.url.or(url),
                output_dir: cli_args.output_dir.or(output_dir),
                dates: cli_args.dates.merge(dates),
                workers: cli_args.workers.or(workers),
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
            url,
            output_dir,
            dates,
            workers,
        } = self;
        let output_dir = output_dir.ok_or(ArgsError::Missing("output directory"))?;
        let range = dates.parse()?;
        let url = url.unwrap_or_else(|| DEFAULT_ARCHIVE_URL.to_string());
        let workers = match workers.unwrap_or(DEFAULT_DOWNLOAD_WORKERS) {
            0 => return Err(ArgsError::ZeroWorkers.into()),
            n => n,
        };

        let mut printer = InfoPrinter::new("Downloading archives".into());
        printer.push_line(format!("From: {url}").into());
        printer.push_line(format!("Into: {}", output_dir.display()).into());
        printer.push_line(describe_dates(range));
        printer.push_line(format!("Workers: {workers}").into());
        printer.display();
        display_warnings();

        if dry_run {
            info!("Dry run -- exiting now.");
            return Ok(());
        }

        let client = Client::builder().build()?;
        let report = download_archives(&client, &url, &output_dir, range, workers)?;
        info!("Unpacked {} archives", report.unpacked.len());
        for (archive, err) in &report.failed {
            warn!("{} failed: {err}", archive.name);
        }
        Ok(())
    }
}
