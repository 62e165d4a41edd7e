// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Useful constants.
//!
//! All defaults used by the CLI should be listed here.

/// The web directory listing the compressed daily archives of the second
/// Signal Hound analyzer.
pub const DEFAULT_ARCHIVE_URL: &str =
    "http://bicep.rc.fas.harvard.edu/southpole_info/EMI_WG/keckdaq/signalhound2/";

/// The file-name suffix of a compressed daily archive.
pub const ARCHIVE_SUFFIX: &str = ".tar.gz";

/// The number of archives downloaded at the same time.
pub const DEFAULT_DOWNLOAD_WORKERS: usize = 5;

/// The number of adjacent frequency channels reduced into one by aggregation.
pub const DEFAULT_FREQ_AGGREGATION: usize = 128;

/// The number of adjacent time samples reduced into one by aggregation.
pub const DEFAULT_TIME_AGGREGATION: usize = 16;

/// The number of frequency rows handed to each summary worker.
pub const DEFAULT_CHUNK_SIZE: usize = 1000;

/// Frequencies are rounded to this many decimal places (GHz), i.e. 100 kHz.
pub const FREQ_DECIMALS: i32 = 4;

/// Summary statistics are rounded to this many decimal places.
pub const STAT_DECIMALS: i32 = 4;

/// MHz per GHz.
pub const MHZ_PER_GHZ: f64 = 1000.0;

/// The suffix of a raw sweep file.
pub const TRACE_SUFFIX: &str = "_trace.csv";

/// The suffix of a day-matrix file.
pub const MATRIX_SUFFIX: &str = "_matrix.csv";

/// The suffix of a daily metrics file.
pub const METRICS_SUFFIX: &str = "_metrics.csv";

/// The suffix of a daily peak-power summary file.
pub const PEAK_SUFFIX: &str = "_summary.csv";

/// The format of dates in file and directory names.
pub const FILE_DATE_FORMAT: &str = "%Y%m%d";

/// The format of time labels in a day matrix.
pub const TIME_LABEL_FORMAT: &str = "%H:%M:%S";

/// The name of the frequency column in every CSV product.
pub const FREQ_COLUMN: &str = "Frequency (GHz)";

/// The value that a non-positive median-subtracted power is replaced with
/// \[mW\].
pub const MEDIAN_SUBTRACTED_MIN_MW: f64 = 1e-12;

/// The lowest power shown by waterfall plots \[dBm\]. Filtered values are set
/// to this.
pub const DEFAULT_WATERFALL_FLOOR_DBM: f64 = -110.0;

/// The highest power shown by waterfall plots \[dBm\].
pub const DEFAULT_WATERFALL_CEILING_DBM: f64 = -20.0;

/// The number of contour levels between the waterfall floor and ceiling.
pub const DEFAULT_WATERFALL_LEVELS: usize = 25;

/// The number of standard deviations above the mean that survive the sigma
/// filter.
pub const DEFAULT_NUM_SIGMA: f64 = 3.0;

/// The value that the sigma filter gives to readings below its threshold
/// \[dBm\].
pub const DEFAULT_SIGMA_FILL_DBM: f64 = -90.0;

/// Daily maxima above this are "high values" \[dBm\].
pub const DEFAULT_HIGH_VALUE_DBM: f64 = -10.0;

/// Days of a super matrix with fewer than this fraction of frequencies are
/// blanked.
pub const DEFAULT_VALID_FRACTION: f64 = 0.5;

/// The significance level of the seasonal t-tests.
pub const DEFAULT_SIGNIFICANCE: f64 = 0.05;

/// Months of the Austral summer. All other months are winter.
pub const SUMMER_MONTHS: [u32; 6] = [10, 11, 12, 1, 2, 3];
