//! Input retrieval from local paths or HTTP(S) URLs.
//!
//! Sources ending in `.gz` are gunzipped after they are read.

mod basic;
mod client;

pub use basic::BasicClient;
pub use client::HttpClient;

use anyhow::{Context, Result};
use flate2::read::GzDecoder;
use std::io::Read;
use tracing::debug;

/// GETs `url` and returns the response body. Non-success statuses are errors.
pub async fn fetch_bytes<C: HttpClient>(client: &C, url: &str) -> Result<Vec<u8>> {
    let req = reqwest::Request::new(reqwest::Method::GET, url.parse()?);

    let resp = client.execute(req).await?.error_for_status()?;
    Ok(resp.bytes().await?.to_vec())
}

pub fn is_remote(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

/// Reads a source from disk or over HTTP, decompressing `.gz` payloads.
#[tracing::instrument(skip(client))]
pub async fn fetch_source<C: HttpClient>(client: &C, source: &str) -> Result<Vec<u8>> {
    let bytes = if is_remote(source) {
        fetch_bytes(client, source)
            .await
            .with_context(|| format!("fetching '{source}'"))?
    } else {
        tokio::fs::read(source)
            .await
            .with_context(|| format!("reading '{source}'"))?
    };

    let bytes = if source.ends_with(".gz") {
        gunzip(&bytes).with_context(|| format!("decompressing '{source}'"))?
    } else {
        bytes
    };

    debug!(bytes = bytes.len(), "Source loaded");
    Ok(bytes)
}

fn gunzip(bytes: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    GzDecoder::new(bytes).read_to_end(&mut out)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::env;
    use std::fs;
    use std::io::Write;

    fn temp_path(name: &str) -> String {
        format!("{}/{}", env::temp_dir().display(), name)
    }

    #[test]
    fn test_is_remote() {
        assert!(is_remote("https://example.com/trips.csv"));
        assert!(is_remote("http://example.com/trips.csv"));
        assert!(!is_remote("data/trips.csv"));
        assert!(!is_remote("httpdata/trips.csv"));
    }

    #[tokio::test]
    async fn test_fetch_source_reads_plain_file() {
        let path = temp_path("bikeshare_equity_test_plain.csv");
        fs::write(&path, "a,b\n1,2\n").unwrap();

        let bytes = fetch_source(&BasicClient::new(), &path).await.unwrap();
        assert_eq!(bytes, b"a,b\n1,2\n");

        fs::remove_file(&path).unwrap();
    }

    #[tokio::test]
    async fn test_fetch_source_gunzips() {
        let path = temp_path("bikeshare_equity_test_gz.csv.gz");
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b"a,b\n1,2\n").unwrap();
        fs::write(&path, encoder.finish().unwrap()).unwrap();

        let bytes = fetch_source(&BasicClient::new(), &path).await.unwrap();
        assert_eq!(bytes, b"a,b\n1,2\n");

        fs::remove_file(&path).unwrap();
    }

    #[tokio::test]
    async fn test_fetch_source_missing_file_names_source() {
        let err = fetch_source(&BasicClient::new(), "/nonexistent/trips.csv")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("/nonexistent/trips.csv"));
    }
}
