// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Sub-commands that only draw plots.

use std::path::{Path, PathBuf};

use clap::Parser;
use strum_macros::{Display, EnumIter, EnumString};

use crate::{
    constants::{
        DEFAULT_NUM_SIGMA, DEFAULT_SIGMA_FILL_DBM, DEFAULT_SIGNIFICANCE,
        DEFAULT_WATERFALL_CEILING_DBM, DEFAULT_WATERFALL_FLOOR_DBM, DEFAULT_WATERFALL_LEVELS,
    },
    matrix::filter::WaterfallFilter,
    RfimonError,
};

lazy_static::lazy_static! {
    static ref FILTER_HELP: String = {
        use itertools::Itertools;
        use strum::IntoEnumIterator;

        format!("How the matrix is filtered before plotting. Supported filters: {}", FilterChoice::iter().join(", "))
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter, EnumString)]
#[strum(ascii_case_insensitive)]
pub(super) enum FilterChoice {
    /// Plot the matrix as it is.
    #[strum(serialize = "none")]
    None,

    /// Subtract each frequency's median over the day.
    #[strum(serialize = "median")]
    Median,

    /// Keep only readings far above each frequency's mean.
    #[strum(serialize = "sigma")]
    Sigma,
}

#[derive(Parser, Debug, Clone)]
pub(super) struct PlotWaterfallArgs {
    /// The day-matrix file to plot. Globs are accepted, as long as they match
    /// only one file.
    #[clap(name = "MATRIX")]
    pub(super) matrix: String,

    /// The PNG file to write. The default is the matrix file name with a
    /// "_waterfall.png" ending.
    #[clap(short, long, parse(from_os_str))]
    pub(super) output: Option<PathBuf>,

    /// The plot's title. The default is the matrix's file name.
    #[clap(long)]
    pub(super) title: Option<String>,

    #[clap(long, help = FILTER_HELP.as_str(), default_value = "none")]
    pub(super) filter: FilterChoice,

    /// The lowest power shown [dBm]. The median filter raises values to this.
    #[clap(long, default_value_t = DEFAULT_WATERFALL_FLOOR_DBM, allow_hyphen_values = true)]
    pub(super) floor: f64,

    /// The highest power shown [dBm].
    #[clap(long, default_value_t = DEFAULT_WATERFALL_CEILING_DBM, allow_hyphen_values = true)]
    pub(super) ceiling: f64,

    /// The number of colour bands between the floor and the ceiling.
    #[clap(long, default_value_t = DEFAULT_WATERFALL_LEVELS)]
    pub(super) levels: usize,

    /// The number of standard deviations above the mean that the sigma filter
    /// keeps.
    #[clap(long, default_value_t = DEFAULT_NUM_SIGMA)]
    pub(super) num_sigma: f64,

    /// The value that the sigma filter gives everything else [dBm].
    #[clap(long, default_value_t = DEFAULT_SIGMA_FILL_DBM, allow_hyphen_values = true)]
    pub(super) sigma_fill: f64,
}

impl PlotWaterfallArgs {
    fn waterfall_filter(&self) -> WaterfallFilter {
        match self.filter {
            FilterChoice::None => WaterfallFilter::None,
            FilterChoice::Median => WaterfallFilter::MedianSubtracted {
                floor_dbm: self.floor,
            },
            FilterChoice::Sigma => WaterfallFilter::SigmaThreshold {
                num_sigma: self.num_sigma,
                fill_dbm: self.sigma_fill,
            },
        }
    }

    #[cfg(not(feature = "plotting"))]
    pub(super) fn run(self, _dry_run: bool) -> Result<(), RfimonError> {
        // Plotting is an optional feature; rfimon must be rebuilt with it.
        Err(super::common::ArgsError::NoPlottingFeature.into())
    }

    #[cfg(feature = "plotting")]
    pub(super) fn run(self, dry_run: bool) -> Result<(), RfimonError> {
        use log::info;

        use super::common::InfoPrinter;
        use crate::{
            io::get_single_match_from_glob,
            matrix::DayMatrix,
            plotting::{plot_waterfall, PowerScale},
        };

        let matrix_file = get_single_match_from_glob(&self.matrix)?;
        let scale = PowerScale::new(self.floor, self.ceiling, self.levels)?;
        let filter = self.waterfall_filter();
        let output = self
            .output
            .clone()
            .unwrap_or_else(|| waterfall_file_name(&matrix_file));
        let title = self.title.clone().unwrap_or_else(|| {
            matrix_file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default()
        });

        let mut printer = InfoPrinter::new("Plotting a waterfall".into());
        printer.push_line(format!("Matrix: {}", matrix_file.display()).into());
        printer.push_line(format!("Filter: {}", self.filter).into());
        printer.push_line(
            format!(
                "Scale: {} to {} dBm in {} levels",
                scale.floor, scale.ceiling, scale.levels
            )
            .into(),
        );
        printer.push_line(format!("Output: {}", output.display()).into());
        printer.display();

        if dry_run {
            info!("Dry run -- exiting now.");
            return Ok(());
        }

        let matrix = DayMatrix::read_csv(&matrix_file)?;
        plot_waterfall(&matrix, filter, &title, &output, scale)?;
        info!("Wrote {}", output.display());
        Ok(())
    }
}

/// `20240516_matrix.csv` becomes `20240516_matrix_waterfall.png` in the same
/// directory.
fn waterfall_file_name(matrix_file: &Path) -> PathBuf {
    let stem = matrix_file
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    matrix_file.with_file_name(format!("{stem}_waterfall.png"))
}

#[derive(Parser, Debug, Clone)]
pub(super) struct PlotPValuesArgs {
    /// The seasonal statistics CSV file.
    #[clap(name = "SEASONAL_FILE", parse(from_os_str))]
    pub(super) seasonal_file: PathBuf,

    /// The PNG file to write.
    #[clap(short, long, parse(from_os_str))]
    pub(super) output: PathBuf,

    /// p-values below this are highlighted.
    #[clap(long, default_value_t = DEFAULT_SIGNIFICANCE)]
    pub(super) alpha: f64,

    /// The plot's title.
    #[clap(long, default_value = "P-values of the seasonal t-test")]
    pub(super) title: String,
}

impl PlotPValuesArgs {
    #[cfg(not(feature = "plotting"))]
    pub(super) fn run(self, _dry_run: bool) -> Result<(), RfimonError> {
        Err(super::common::ArgsError::NoPlottingFeature.into())
    }

    #[cfg(feature = "plotting")]
    pub(super) fn run(self, dry_run: bool) -> Result<(), RfimonError> {
        use std::{fs::File, io::BufReader};

        use log::info;

        use crate::{metrics::read_p_values, plotting::plot_p_values};

        let p_values = read_p_values(BufReader::new(File::open(&self.seasonal_file)?))?;
        info!(
            "Read {} p-values from {}",
            p_values.len(),
            self.seasonal_file.display()
        );

        if dry_run {
            info!("Dry run -- exiting now.");
            return Ok(());
        }

        plot_p_values(&p_values, self.alpha, &self.title, &self.output)?;
        info!("Wrote {}", self.output.display());
        Ok(())
    }
}
