// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
Tools for reducing and analysing spectrum-analyzer radio-frequency interference
(RFI) monitoring data.

Raw per-sweep traces are pivoted into per-day frequency × time matrices, which
are reduced by block maxima and summarised per frequency. The summaries are then
used to look for missing days, outliers and seasonal behaviour.
 */

pub mod aggregation;
mod cli;
pub mod constants;
pub mod download;
pub(crate) mod io;
pub mod math;
pub mod matrix;
pub mod metrics;
#[cfg(feature = "plotting")]
pub mod plotting;
pub mod summary;
pub mod time;
pub mod timeseries;
pub mod trace;

use crossbeam_utils::atomic::AtomicCell;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

lazy_static::lazy_static! {
    /// Are progress bars being drawn? This should only ever be enabled by CLI
    /// code.
    static ref PROGRESS_BARS: AtomicCell<bool> = AtomicCell::new(false);
}

/// What happened to each file of a batch job. Failures don't stop a batch;
/// they are collected here with their error messages.
#[derive(Debug, Default)]
pub struct FileReport {
    pub written: Vec<std::path::PathBuf>,
    pub failed: Vec<(std::path::PathBuf, String)>,
}

/// Make a progress bar over `len` items, e.g. "day directories". It is hidden
/// unless progress bars have been enabled.
pub(crate) fn make_progress_bar(len: usize, message: &str, items: &str) -> ProgressBar {
    ProgressBar::with_draw_target(
        Some(len as _),
        if PROGRESS_BARS.load() {
            // Use stdout, not stderr, because the messages printed by the
            // progress bar are valuable.
            ProgressDrawTarget::stdout()
        } else {
            ProgressDrawTarget::hidden()
        },
    )
    .with_style(
        ProgressStyle::default_bar()
            .template(&format!(
                "{{msg:18}}: [{{wide_bar:.blue}}] {{pos:3}}/{{len:3}} {items} ({{elapsed_precise}}<{{eta_precise}})"
            ))
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> "),
    )
    .with_position(0)
    .with_message(message.to_string())
}

// Re-exports.
pub use aggregation::{aggregate_max, AggregationFactors};
pub use cli::{Rfimon, RfimonError};
pub use matrix::DayMatrix;
pub use metrics::{Metric, MetricsArchive};
pub use summary::{summarise, FrequencyStats};
pub use time::DateRange;
pub use trace::Trace;
