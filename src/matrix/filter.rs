// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Filters applied to a day matrix before drawing it as a waterfall. Both work
//! on each frequency independently; NaN cells stay NaN.

use ndarray::Zip;

use super::DayMatrix;
use crate::{
    constants::MEDIAN_SUBTRACTED_MIN_MW,
    math::{dbm_to_mw, mw_to_dbm, nan_mean, nan_median, nan_std},
};

/// Which filter to apply to a waterfall.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WaterfallFilter {
    None,

    /// See [`median_subtracted`].
    MedianSubtracted { floor_dbm: f64 },

    /// See [`sigma_threshold`].
    SigmaThreshold { num_sigma: f64, fill_dbm: f64 },
}

impl WaterfallFilter {
    pub fn apply(&self, matrix: &DayMatrix) -> DayMatrix {
        match *self {
            WaterfallFilter::None => matrix.clone(),
            WaterfallFilter::MedianSubtracted { floor_dbm } => median_subtracted(matrix, floor_dbm),
            WaterfallFilter::SigmaThreshold {
                num_sigma,
                fill_dbm,
            } => sigma_threshold(matrix, num_sigma, fill_dbm),
        }
    }
}

/// Subtract each frequency's median power over the day. The subtraction is
/// done in mW; results that aren't positive become 1e-12 mW. Back in dBm,
/// anything below `floor_dbm` is raised to it.
pub fn median_subtracted(matrix: &DayMatrix, floor_dbm: f64) -> DayMatrix {
    let mut filtered = matrix.clone();
    for mut row in filtered.data.outer_iter_mut() {
        let mut mw = row.mapv(dbm_to_mw);
        let median = nan_median(&mw.to_vec());
        mw.mapv_inplace(|p| {
            let p = p - median;
            if p <= 0.0 {
                MEDIAN_SUBTRACTED_MIN_MW
            } else {
                p
            }
        });
        Zip::from(&mut row).and(&mw).for_each(|out, &p| {
            let dbm = mw_to_dbm(p);
            *out = if dbm < floor_dbm { floor_dbm } else { dbm };
        });
    }
    filtered
}

/// Keep only readings at least `num_sigma` population standard deviations
/// above their frequency's mean over the day; everything else becomes
/// `fill_dbm`.
pub fn sigma_threshold(matrix: &DayMatrix, num_sigma: f64, fill_dbm: f64) -> DayMatrix {
    let mut filtered = matrix.clone();
    for mut row in filtered.data.outer_iter_mut() {
        let values = row.to_vec();
        let threshold = nan_mean(&values) + num_sigma * nan_std(&values, 0);
        row.mapv_inplace(|p| if p < threshold { fill_dbm } else { p });
    }
    filtered
}
