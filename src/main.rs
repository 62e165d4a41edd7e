// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The main rfimon binary.

use clap::Parser;

use rfi_monitor::Rfimon;

fn main() {
    // Run rfimon, only performing extra steps if it returns an error.
    if let Err(e) = Rfimon::parse().run() {
        // Errors are printed to stderr; everything else goes to stdout through
        // the logger.
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
