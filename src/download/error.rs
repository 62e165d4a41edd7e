// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("'{url}' is not a valid URL: {reason}")]
    BadUrl { url: String, reason: String },

    #[error("Couldn't unpack {archive}: {err}")]
    Unpack {
        archive: PathBuf,
        err: std::io::Error,
    },

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    IO(#[from] std::io::Error),
}
