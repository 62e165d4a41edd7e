// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Fetching daily trace archives from the campaign's web directory.
//!
//! The directory listing links to one `<YYYYMMDD>*.tar.gz` archive per day.
//! Archives are downloaded by a pool of worker threads, unpacked into the
//! save directory and then deleted.

mod error;
#[cfg(test)]
mod tests;

pub use error::DownloadError;

use std::{
    fs::{create_dir_all, remove_file, File},
    io::BufReader,
    path::{Path, PathBuf},
    thread::{self, ScopedJoinHandle},
};

use chrono::NaiveDate;
use crossbeam_channel::bounded;
use flate2::read::GzDecoder;
use indicatif::ProgressBar;
use log::{debug, error, info, warn};
use reqwest::{blocking::Client, Url};
use scraper::{Html, Selector};

use crate::{
    constants::{ARCHIVE_SUFFIX, FILE_DATE_FORMAT},
    make_progress_bar,
    time::DateRange,
};

/// A daily archive on the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Archive {
    /// The file name, e.g. `20240516.tar.gz`.
    pub name: String,
    pub url: String,
    pub date: NaiveDate,
}

/// The outcome of [`download_archives`].
#[derive(Debug, Default)]
pub struct DownloadReport {
    /// Archives that were downloaded and unpacked.
    pub unpacked: Vec<Archive>,

    /// Archives that failed, and why.
    pub failed: Vec<(Archive, String)>,
}

/// Get the targets of every link in an HTML page that point at a `.tar.gz`
/// file, in page order and without repeats.
pub fn parse_listing(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let selector = match Selector::parse("a[href]") {
        Ok(s) => s,
        Err(_) => return vec![],
    };
    let mut links: Vec<String> = vec![];
    for href in document
        .select(&selector)
        .filter_map(|a| a.value().attr("href"))
    {
        if href.ends_with(ARCHIVE_SUFFIX) && !links.iter().any(|l| l == href) {
            links.push(href.to_string());
        }
    }
    links
}

/// The date of an archive is the first 8 characters of its name.
pub fn archive_date(name: &str) -> Option<NaiveDate> {
    let prefix = name.get(..8)?;
    NaiveDate::parse_from_str(prefix, FILE_DATE_FORMAT).ok()
}

/// Turn listing links into archives inside `range`, in date order. Links
/// whose names don't start with a date are ignored.
pub fn select_archives(
    base_url: &str,
    links: &[String],
    range: DateRange,
) -> Result<Vec<Archive>, DownloadError> {
    let base = Url::parse(base_url).map_err(|e| DownloadError::BadUrl {
        url: base_url.to_string(),
        reason: e.to_string(),
    })?;

    let mut archives = vec![];
    for link in links {
        let name = link.rsplit('/').next().unwrap_or(link);
        let date = match archive_date(name) {
            Some(d) => d,
            None => {
                debug!("Ignoring link '{link}'; it isn't named after a date");
                continue;
            }
        };
        if !range.contains(date) {
            continue;
        }
        let url = base.join(link).map_err(|e| DownloadError::BadUrl {
            url: link.clone(),
            reason: e.to_string(),
        })?;
        archives.push(Archive {
            name: name.to_string(),
            url: url.to_string(),
            date,
        });
    }
    archives.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.name.cmp(&b.name)));
    Ok(archives)
}

/// Get the archive links of a directory listing.
pub fn fetch_listing(client: &Client, url: &str) -> Result<Vec<String>, DownloadError> {
    let html = client.get(url).send()?.error_for_status()?.text()?;
    Ok(parse_listing(&html))
}

/// Stream `url` into the file `dest`, returning the number of bytes written.
/// If anything goes wrong, the partial file is removed.
pub fn download_file(client: &Client, url: &str, dest: &Path) -> Result<u64, DownloadError> {
    fn inner(client: &Client, url: &str, dest: &Path) -> Result<u64, DownloadError> {
        let mut response = client.get(url).send()?.error_for_status()?;
        let mut file = File::create(dest)?;
        Ok(response.copy_to(&mut file)?)
    }

    let result = inner(client, url, dest);
    if result.is_err() && dest.exists() {
        if let Err(e) = remove_file(dest) {
            warn!("Couldn't remove partial download {}: {e}", dest.display());
        }
    }
    result
}

/// Unpack a gzipped tar archive into `save_dir`. The archive is deleted
/// whether or not unpacking worked.
pub fn unpack_and_delete(archive: &Path, save_dir: &Path) -> Result<(), DownloadError> {
    fn unpack(archive: &Path, save_dir: &Path) -> Result<(), DownloadError> {
        let gz = GzDecoder::new(BufReader::new(File::open(archive)?));
        tar::Archive::new(gz)
            .unpack(save_dir)
            .map_err(|e| DownloadError::Unpack {
                archive: archive.to_path_buf(),
                err: e,
            })
    }

    debug!("Unpacking {}", archive.display());
    let result = unpack(archive, save_dir);
    if archive.exists() {
        match remove_file(archive) {
            Ok(()) => debug!("Deleted {}", archive.display()),
            Err(e) => warn!("Couldn't delete {}: {e}", archive.display()),
        }
    }
    result
}

fn download_and_unpack(
    client: &Client,
    archive: &Archive,
    save_dir: &Path,
) -> Result<(), DownloadError> {
    let dest: PathBuf = save_dir.join(&archive.name);
    let num_bytes = download_file(client, &archive.url, &dest)?;
    debug!("Downloaded {} ({num_bytes} bytes)", archive.name);
    unpack_and_delete(&dest, save_dir)
}

/// Download every archive listed at `base_url` inside `range` with
/// `num_workers` threads, unpacking each into `save_dir`. Failures of
/// individual archives are collected in the report; only a failure to get the
/// listing is an error.
pub fn download_archives(
    client: &Client,
    base_url: &str,
    save_dir: &Path,
    range: DateRange,
    num_workers: usize,
) -> Result<DownloadReport, DownloadError> {
    create_dir_all(save_dir)?;
    let links = fetch_listing(client, base_url)?;
    let archives = select_archives(base_url, &links, range)?;
    info!(
        "{} of {} listed archives are in {range}",
        archives.len(),
        links.len()
    );
    if archives.is_empty() {
        return Ok(DownloadReport::default());
    }

    let num_workers = num_workers.clamp(1, archives.len());
    let pb = make_progress_bar(archives.len(), "Downloading", "archives");
    let (tx, rx) = bounded::<Archive>(num_workers);

    let results: Vec<(Archive, Result<(), DownloadError>)> = thread::scope(|scope| {
        let handles: Vec<ScopedJoinHandle<Vec<(Archive, Result<(), DownloadError>)>>> = (0
            ..num_workers)
            .map(|i_worker| {
                let rx = rx.clone();
                let pb: &ProgressBar = &pb;
                thread::Builder::new()
                    .name(format!("download{i_worker}"))
                    .spawn_scoped(scope, move || {
                        let mut results = vec![];
                        for archive in rx.iter() {
                            let result = download_and_unpack(client, &archive, save_dir);
                            match &result {
                                Ok(()) => info!("Unpacked {}", archive.name),
                                Err(e) => warn!("Error processing {}: {e}", archive.url),
                            }
                            pb.inc(1);
                            results.push((archive, result));
                        }
                        results
                    })
                    .expect("OS can create threads")
            })
            .collect();
        drop(rx);

        for archive in archives {
            // The workers only hang up if they've all panicked.
            if tx.send(archive).is_err() {
                break;
            }
        }
        drop(tx);

        handles
            .into_iter()
            .enumerate()
            .flat_map(|(i_worker, h)| worker_results(i_worker, h.join()))
            .collect()
    });
    pb.finish_with_message("Downloaded");

    let mut report = DownloadReport::default();
    for (archive, result) in results {
        match result {
            Ok(()) => report.unpacked.push(archive),
            Err(e) => report.failed.push((archive, e.to_string())),
        }
    }
    report.unpacked.sort_by_key(|a| a.date);
    report.failed.sort_by_key(|(a, _)| a.date);
    Ok(report)
}

/// The results of a joined download worker. A worker that panicked loses
/// everything it had done, so say so loudly.
fn worker_results<T>(i_worker: usize, joined: thread::Result<Vec<T>>) -> Vec<T> {
    joined.unwrap_or_else(|panic| {
        let reason = panic
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| panic.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown reason".to_string());
        error!(
            "Download worker {i_worker} panicked ({reason}); the archives it had handled are missing from the report"
        );
        vec![]
    })
}
