// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::path::PathBuf;

use clap::Parser;
use log::{info, warn};

use super::common::{describe_dates, DateRangeArgs, InfoPrinter};
use crate::{
    timeseries::{extract_frequency_series, percent_above_threshold, write_occupancy},
    RfimonError,
};

#[derive(Parser, Debug, Clone)]
pub(super) struct ThresholdArgs {
    /// The directory containing year directories of day matrices, e.g.
    /// <BASE_DIR>/2021/20210101_matrix.csv.
    #[clap(short, long, parse(from_os_str))]
    pub(super) base_dir: PathBuf,

    /// The frequency to follow [GHz]. It must match a matrix row to 4 decimal
    /// places.
    #[clap(short, long)]
    pub(super) frequency: f64,

    /// Count samples strictly above this power [dBm].
    #[clap(short, long, allow_hyphen_values = true)]
    pub(super) threshold: f64,

    #[clap(flatten)]
    pub(super) dates: DateRangeArgs,

    /// The CSV file of daily percentages.
    #[clap(short, long, parse(from_os_str))]
    pub(super) output: PathBuf,

    /// Also plot the percentages into this PNG file.
    #[clap(long, parse(from_os_str))]
    pub(super) plot: Option<PathBuf>,
}

impl ThresholdArgs {
    pub(super) fn run(self, dry_run: bool) -> Result<(), RfimonError> {
        #[cfg(not(feature = "plotting"))]
        if self.plot.is_some() {
            return Err(super::common::ArgsError::NoPlottingFeature.into());
        }
        let range = self.dates.parse()?;

        let mut printer = InfoPrinter::new(
            format!(
                "Counting samples at {} GHz above {} dBm",
                self.frequency, self.threshold
            )
            .into(),
        );
        printer.push_line(format!("Matrices: {}", self.base_dir.display()).into());
        printer.push_line(describe_dates(range));
        let mut outputs = vec![format!("Output: {}", self.output.display()).into()];
        if let Some(plot) = &self.plot {
            outputs.push(format!("Plot: {}", plot.display()).into());
        }
        printer.push_block(outputs);
        printer.display();

        if dry_run {
            info!("Dry run -- exiting now.");
            return Ok(());
        }

        let samples = extract_frequency_series(&self.base_dir, range, self.frequency)?;
        if samples.is_empty() {
            warn!("No samples were found at {} GHz", self.frequency);
        }
        let occupancy = percent_above_threshold(&samples, self.threshold);
        write_occupancy(&self.output, &occupancy)?;
        info!("Wrote {} days to {}", occupancy.len(), self.output.display());

        #[cfg(feature = "plotting")]
        if let Some(plot) = &self.plot {
            crate::plotting::plot_percent_above(
                &occupancy,
                &format!(
                    "Samples above {} dBm at {} GHz",
                    self.threshold, self.frequency
                ),
                plot,
            )?;
            info!("Wrote {}", plot.display());
        }
        Ok(())
    }
}
