// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::{
    fs::{read_to_string, write},
    io::{BufRead, Write},
    net::TcpListener,
};

use flate2::{write::GzEncoder, Compression};
use indoc::indoc;
use tempfile::TempDir;

use super::*;

fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

const LISTING: &str = indoc! {r#"
    <html><head><title>Index of /signalhound2</title></head>
    <body>
    <h1>Index of /signalhound2</h1>
    <a href="?C=N;O=D">Name</a>
    <a href="/southpole_info/">Parent Directory</a>
    <a href="20240515.tar.gz">20240515.tar.gz</a>
    <a href="20240516.tar.gz">20240516.tar.gz</a>
    <a href="20240516.tar.gz">again</a>
    <a href="20240517.tar.gz">20240517.tar.gz</a>
    <a href="notes.txt">notes.txt</a>
    <a href="latest.tar.gz">latest.tar.gz</a>
    </body></html>
"#};

/// A gzipped tar archive containing `20240516/<name>` for each of `names`.
fn make_archive(names: &[&str]) -> Vec<u8> {
    let mut builder = tar::Builder::new(GzEncoder::new(vec![], Compression::default()));
    for name in names {
        let contents = b"Frequency (MHz),Amplitude Min(mW)\n100.0,1e-9\n";
        let mut header = tar::Header::new_gnu();
        header.set_size(contents.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, format!("20240516/{name}"), &contents[..])
            .unwrap();
    }
    builder.into_inner().unwrap().finish().unwrap()
}

/// Serve fixed responses on a local port, forever. Returns the base URL.
fn serve(routes: Vec<(&'static str, u16, Vec<u8>)>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    std::thread::spawn(move || {
        for stream in listener.incoming() {
            let mut stream = match stream {
                Ok(s) => s,
                Err(_) => continue,
            };
            let mut reader = std::io::BufReader::new(stream.try_clone().unwrap());
            let mut request_line = String::new();
            if reader.read_line(&mut request_line).is_err() {
                continue;
            }
            // Skip the headers.
            loop {
                let mut line = String::new();
                match reader.read_line(&mut line) {
                    Ok(0) | Err(_) => break,
                    Ok(_) if line == "\r\n" => break,
                    Ok(_) => (),
                }
            }

            let path = request_line.split_whitespace().nth(1).unwrap_or("/");
            let (status, body) = routes
                .iter()
                .find(|(p, _, _)| *p == path)
                .map(|(_, s, b)| (*s, b.clone()))
                .unwrap_or((404, vec![]));
            let reason = if status == 200 { "OK" } else { "Not Found" };
            let _ = write!(
                stream,
                "HTTP/1.1 {status} {reason}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                body.len()
            );
            let _ = stream.write_all(&body);
        }
    });
    format!("http://{addr}/signalhound2/")
}

fn client() -> Client {
    Client::builder().no_proxy().build().unwrap()
}

#[test]
fn test_parse_listing() {
    assert_eq!(
        parse_listing(LISTING),
        vec![
            "20240515.tar.gz",
            "20240516.tar.gz",
            "20240517.tar.gz",
            "latest.tar.gz"
        ]
    );
    assert!(parse_listing("<html></html>").is_empty());
}

#[test]
fn test_archive_date() {
    assert_eq!(archive_date("20240516.tar.gz"), Some(ymd(2024, 5, 16)));
    assert_eq!(archive_date("20240516_sh2.tar.gz"), Some(ymd(2024, 5, 16)));
    assert_eq!(archive_date("latest.tar.gz"), None);
    assert_eq!(archive_date("2024"), None);
}

#[test]
fn test_select_archives() {
    let links = parse_listing(LISTING);
    let range = DateRange::new(Some(ymd(2024, 5, 16)), Some(ymd(2024, 5, 17))).unwrap();
    let archives = select_archives("http://example.com/sh2/", &links, range).unwrap();
    assert_eq!(
        archives,
        vec![
            Archive {
                name: "20240516.tar.gz".to_string(),
                url: "http://example.com/sh2/20240516.tar.gz".to_string(),
                date: ymd(2024, 5, 16),
            },
            Archive {
                name: "20240517.tar.gz".to_string(),
                url: "http://example.com/sh2/20240517.tar.gz".to_string(),
                date: ymd(2024, 5, 17),
            },
        ]
    );

    // Absolute links keep their own location.
    let links = vec!["/other/20240516.tar.gz".to_string()];
    let archives = select_archives("http://example.com/sh2/", &links, DateRange::default()).unwrap();
    assert_eq!(archives[0].url, "http://example.com/other/20240516.tar.gz");
    assert_eq!(archives[0].name, "20240516.tar.gz");

    let result = select_archives("not a url", &links, DateRange::default());
    assert!(matches!(result, Err(DownloadError::BadUrl { .. })));
}

#[test]
fn test_unpack_and_delete() {
    let tmp_dir = TempDir::new().unwrap();
    let archive = tmp_dir.path().join("20240516.tar.gz");
    write(&archive, make_archive(&["20240516_000000_trace.csv"])).unwrap();

    unpack_and_delete(&archive, tmp_dir.path()).unwrap();
    assert!(!archive.exists());
    let unpacked = tmp_dir.path().join("20240516").join("20240516_000000_trace.csv");
    assert!(read_to_string(unpacked).unwrap().starts_with("Frequency (MHz)"));
}

#[test]
fn test_bad_archive_is_still_deleted() {
    let tmp_dir = TempDir::new().unwrap();
    let archive = tmp_dir.path().join("20240516.tar.gz");
    write(&archive, b"this is not gzip").unwrap();

    let result = unpack_and_delete(&archive, tmp_dir.path());
    assert!(matches!(result, Err(DownloadError::Unpack { .. })));
    assert!(!archive.exists());
}

#[test]
fn test_failed_download_leaves_no_file() {
    let base_url = serve(vec![]);
    let tmp_dir = TempDir::new().unwrap();
    let dest = tmp_dir.path().join("20240516.tar.gz");
    let result = download_file(&client(), &format!("{base_url}20240516.tar.gz"), &dest);
    assert!(matches!(result, Err(DownloadError::Http(_))));
    assert!(!dest.exists());
}

#[test]
fn test_download_archives() {
    let archive = make_archive(&["20240516_000000_trace.csv", "20240516_000015_trace.csv"]);
    let base_url = serve(vec![
        ("/signalhound2/", 200, LISTING.as_bytes().to_vec()),
        ("/signalhound2/20240516.tar.gz", 200, archive),
        // 20240517 is listed but missing.
    ]);
    let tmp_dir = TempDir::new().unwrap();
    let save_dir = tmp_dir.path().join("raw");

    let range = DateRange::since(ymd(2024, 5, 16));
    let report = download_archives(&client(), &base_url, &save_dir, range, 5).unwrap();
    assert_eq!(report.unpacked.len(), 1);
    assert_eq!(report.unpacked[0].date, ymd(2024, 5, 16));
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0.date, ymd(2024, 5, 17));

    let day_dir = save_dir.join("20240516");
    assert!(day_dir.join("20240516_000000_trace.csv").exists());
    assert!(day_dir.join("20240516_000015_trace.csv").exists());
    // No archives are left behind.
    assert!(!save_dir.join("20240516.tar.gz").exists());
    assert!(!save_dir.join("20240517.tar.gz").exists());
}

#[test]
fn test_panicked_worker_results() {
    assert_eq!(worker_results(0, Ok(vec![1, 2])), vec![1, 2]);

    let joined = std::thread::spawn(|| -> Vec<u8> { panic!("unpacking went wrong") }).join();
    assert!(joined.is_err());
    assert!(worker_results(1, joined).is_empty());

    let joined: std::thread::Result<Vec<u8>> = Err(Box::new(42_i32));
    assert!(worker_results(2, joined).is_empty());
}
