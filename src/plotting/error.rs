// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DrawError {
    #[error("There is nothing to plot")]
    NoData,

    #[error("The power scale floor ({floor} dBm) must be below its ceiling ({ceiling} dBm), with at least one level")]
    BadScale { floor: f64, ceiling: f64 },

    #[error("Error from the plotters library: {0}")]
    Plotters(Box<dyn std::error::Error>),
}
