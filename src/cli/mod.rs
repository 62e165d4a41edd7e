// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Command-line interface code. More specific options for `rfimon`
//! subcommands are contained in modules.
//!
//! All booleans must have `#[serde(default)]` annotated, and anything that
//! isn't a boolean must be optional. This allows all arguments to be optional
//! *and* usable in an arguments file.
//!
//! Only 3 things should be public in this module: `Rfimon`, `Rfimon::run`,
//! and `RfimonError`.

#[macro_use]
mod common;
mod analyse;
mod download;
mod error;
mod matrices;
mod pipeline;
mod plot;
mod summarise;
mod threshold;

pub use error::RfimonError;

use std::path::PathBuf;

use clap::{AppSettings, Args, Parser, Subcommand};
use log::info;

use crate::PROGRESS_BARS;

// Add build-time information from the "built" crate.
include!(concat!(env!("OUT_DIR"), "/built.rs"));

#[derive(Debug, Parser)]
#[clap(
    version,
    author,
    about = "Reduce and analyse spectrum-analyzer RFI monitoring data"
)]
#[clap(global_setting(AppSettings::DeriveDisplayOrder))]
#[clap(disable_help_subcommand = true)]
#[clap(infer_subcommands = true)]
#[clap(propagate_version = true)]
#[clap(infer_long_args = true)]
pub struct Rfimon {
    #[clap(flatten)]
    global_opts: GlobalArgs,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Debug, Args)]
struct GlobalArgs {
    /// Don't draw progress bars.
    #[clap(long)]
    #[clap(global = true)]
    no_progress_bars: bool,

    /// The verbosity of the program. Increase by specifying multiple times
    /// (e.g. -vv). The default is to print only high-level information.
    #[clap(short, long, parse(from_occurrences))]
    #[clap(global = true)]
    verbosity: u8,

    /// Only verify that arguments were correctly ingested and print out
    /// high-level information.
    #[clap(long)]
    #[clap(global = true)]
    dry_run: bool,

    /// Save the input arguments into a new TOML file that can be used to
    /// reproduce this run. Only sub-commands that accept an arguments file
    /// use this.
    #[clap(long)]
    #[clap(global = true)]
    save_toml: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
#[clap(arg_required_else_help = true)]
enum Command {
    #[clap(about = "Download and unpack the daily sweep archives in a date range.")]
    Download(download::DownloadArgs),

    #[clap(alias = "matrices")]
    #[clap(about = "Pivot each day directory of trace files into a day matrix.")]
    BuildMatrices(matrices::BuildMatricesArgs),

    #[clap(about = "Block-max aggregate existing day-matrix files.")]
    Reaggregate(matrices::ReaggregateArgs),

    #[clap(about = "Replace the frequency labels of day matrices with those of a reference matrix.")]
    Relabel(matrices::RelabelArgs),

    #[clap(alias = "summarize")]
    #[clap(about = "Write per-frequency summary statistics of day matrices.")]
    Summarise(summarise::SummariseArgs),

    #[clap(about = "Download new archives, build aggregated matrices and summarise them.")]
    Pipeline(pipeline::PipelineArgs),

    #[clap(about = "List the days without a metrics file.")]
    MissingDays(analyse::MissingDaysArgs),

    #[clap(about = "List the frequencies and days whose maximum power is above a threshold.")]
    HighValues(analyse::HighValuesArgs),

    #[clap(about = "Group days by the set of frequencies in their metrics files.")]
    FrequencySets(analyse::FrequencySetsArgs),

    #[clap(about = "Estimate the background power of each frequency.")]
    Background(analyse::BackgroundArgs),

    #[clap(about = "Collect a metric of every day into one date × frequency matrix.")]
    SuperMatrix(analyse::SuperMatrixArgs),

    #[clap(about = "Compare a metric between the Austral summer and winter with Welch's t-test.")]
    Seasonal(analyse::SeasonalArgs),

    #[clap(about = "Average a metric over frequency for each day.")]
    DailyAverage(analyse::DailyAverageArgs),

    #[clap(about = "Get the daily percentage of samples above a threshold at one frequency.")]
    Threshold(threshold::ThresholdArgs),

    #[clap(about = r#"Plot a day matrix as a waterfall. Only available if compiled with the "plotting" feature."#)]
    PlotWaterfall(plot::PlotWaterfallArgs),

    #[clap(about = r#"Plot the p-values of a seasonal statistics file. Only available if compiled with the "plotting" feature."#)]
    PlotPValues(plot::PlotPValuesArgs),
}

impl Rfimon {
    pub fn run(self) -> Result<(), RfimonError> {
        // Set up logging.
        let GlobalArgs {
            verbosity,
            dry_run,
            no_progress_bars,
            save_toml,
        } = self.global_opts;
        setup_logging(verbosity).expect("Failed to initialise logging.");
        // Enable progress bars if the user didn't say "no progress bars".
        if !no_progress_bars {
            PROGRESS_BARS.store(true);
        }

        // Print the version of rfimon and its build-time information.
        let sub_command = match &self.command {
            Command::Download(_) => "download",
            Command::BuildMatrices(_) => "build-matrices",
            Command::Reaggregate(_) => "reaggregate",
            Command::Relabel(_) => "relabel",
            Command::Summarise(_) => "summarise",
            Command::Pipeline(_) => "pipeline",
            Command::MissingDays(_) => "missing-days",
            Command::HighValues(_) => "high-values",
            Command::FrequencySets(_) => "frequency-sets",
            Command::Background(_) => "background",
            Command::SuperMatrix(_) => "super-matrix",
            Command::Seasonal(_) => "seasonal",
            Command::DailyAverage(_) => "daily-average",
            Command::Threshold(_) => "threshold",
            Command::PlotWaterfall(_) => "plot-waterfall",
            Command::PlotPValues(_) => "plot-p-values",
        };
        info!("rfimon {} {}", sub_command, env!("CARGO_PKG_VERSION"));
        display_build_info();

        macro_rules! merge_save_run {
            ($args:expr) => {{
                let args = $args.merge()?;
                if let Some(toml) = save_toml {
                    use std::{
                        fs::File,
                        io::{BufWriter, Write},
                    };

                    let mut f = BufWriter::new(File::create(toml)?);
                    let toml_str = toml::to_string(&args)?;
                    f.write_all(toml_str.as_bytes())?;
                }
                args.run(dry_run)?;
            }};
        }

        match self.command {
            Command::Download(args) => merge_save_run!(args),
            Command::BuildMatrices(args) => merge_save_run!(args),
            Command::Summarise(args) => merge_save_run!(args),
            Command::Pipeline(args) => merge_save_run!(args),

            // Matrix utilities.
            Command::Reaggregate(args) => args.run(dry_run)?,
            Command::Relabel(args) => args.run(dry_run)?,

            // Analyses of metrics files.
            Command::MissingDays(args) => args.run(dry_run)?,
            Command::HighValues(args) => args.run(dry_run)?,
            Command::FrequencySets(args) => args.run(dry_run)?,
            Command::Background(args) => args.run(dry_run)?,
            Command::SuperMatrix(args) => args.run(dry_run)?,
            Command::Seasonal(args) => args.run(dry_run)?,
            Command::DailyAverage(args) => args.run(dry_run)?,
            Command::Threshold(args) => args.run(dry_run)?,

            // Plots.
            Command::PlotWaterfall(args) => args.run(dry_run)?,
            Command::PlotPValues(args) => args.run(dry_run)?,
        }

        info!("rfimon {} complete.", sub_command);
        Ok(())
    }
}

/// Activate a logger. All log messages are put onto `stdout`. `env_logger`
/// automatically only uses colours and fancy symbols if we're on a tty (e.g. a
/// terminal); piped output will be formatted sensibly. Source code lines are
/// displayed in log messages when verbosity >= 3.
fn setup_logging(verbosity: u8) -> Result<(), log::SetLoggerError> {
    let mut builder = env_logger::Builder::from_default_env();
    builder.target(env_logger::Target::Stdout);
    builder.format_target(false);
    match verbosity {
        0 => builder.filter_level(log::LevelFilter::Info),
        1 => builder.filter_level(log::LevelFilter::Debug),
        2 => builder.filter_level(log::LevelFilter::Trace),
        _ => {
            builder.filter_level(log::LevelFilter::Trace);
            builder.format(|buf, record| {
                use std::io::Write;

                let timestamp = buf.timestamp();
                let level = record.level();
                let target = record.target();
                let line = record.line().unwrap_or(0);
                let message = record.args();

                writeln!(buf, "[{timestamp} {level} {target}:{line}] {message}")
            })
        }
    };
    builder.try_init()
}

/// Write many info-level log lines of how this executable was compiled.
fn display_build_info() {
    let dirty = match GIT_DIRTY {
        Some(true) => " (dirty)",
        _ => "",
    };
    match GIT_COMMIT_HASH_SHORT {
        Some(hash) => {
            info!("Compiled on git commit hash: {hash}{dirty}");
        }
        None => info!("Compiled on git commit hash: <no git info>"),
    }
    if let Some(hr) = GIT_HEAD_REF {
        info!("            git head ref: {}", hr);
    }
    info!("            {}", BUILT_TIME_UTC);
    info!("         with compiler {}", RUSTC_VERSION);
    info!("");
}
