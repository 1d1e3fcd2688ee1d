//! Lead image download.
//!
//! Images are fetched one at a time into the output directory. A non-success
//! HTTP status is an error; the caller aborts the run rather than write a
//! spreadsheet that points at missing files.
//!
//! # File Names
//!
//! The file name is the last path segment of the image URL. The site serves
//! images through a resizing CDN whose links carry the original location in a
//! `url=` query parameter; when present, that inner URL is used instead:
//!
//! ```text
//! https://cdn.example.com/dims4/resize/320x213!/?url=https%3A%2F%2Fbucket%2Fab%2Fcd%2Fwildfire.jpg
//!   -> wildfire.jpg
//! ```

use std::collections::HashSet;
use std::error::Error;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{error, info, instrument};
use url::Url;

#[derive(Debug)]
pub struct ImageDownloader {
    client: reqwest::Client,
    output_dir: PathBuf,
    used: HashSet<String>,
}

impl ImageDownloader {
    pub fn new(output_dir: &Path) -> Self {
        Self {
            client: reqwest::Client::new(),
            output_dir: output_dir.to_path_buf(),
            used: HashSet::new(),
        }
    }

    /// Download `url` and return the file name it was saved under.
    #[instrument(level = "info", skip(self))]
    pub async fn download(&mut self, url: &str) -> Result<String, Box<dyn Error>> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            error!(%status, "Image download failed");
            return Err(format!("image download from {url} failed with status {status}").into());
        }
        let bytes = response.bytes().await?;

        let name = self.unique_name(&image_file_name(url));
        let path = self.output_dir.join(&name);
        fs::write(&path, &bytes).await?;
        info!(path = %path.display(), bytes = bytes.len(), "Image saved");
        Ok(name)
    }

    /// Reserve `name`, suffixing `-2`, `-3`, … when it was already used.
    fn unique_name(&mut self, name: &str) -> String {
        let (stem, ext) = match name.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => (stem, Some(ext)),
            _ => (name, None),
        };
        let mut candidate = name.to_string();
        let mut n = 1;
        while !self.used.insert(candidate.clone()) {
            n += 1;
            candidate = match ext {
                Some(ext) => format!("{stem}-{n}.{ext}"),
                None => format!("{stem}-{n}"),
            };
        }
        candidate
    }
}

/// Derive a local file name from an image URL.
pub fn image_file_name(url: &str) -> String {
    let Ok(parsed) = Url::parse(url) else {
        return sanitize(last_segment(url));
    };
    let target = parsed
        .query_pairs()
        .find(|(k, _)| k == "url")
        .and_then(|(_, v)| Url::parse(&v).ok())
        .unwrap_or(parsed);

    let segment = target
        .path_segments()
        .and_then(|mut segments| segments.rfind(|s| !s.is_empty()))
        .unwrap_or_default();
    let decoded = urlencoding::decode(segment)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| segment.to_string());
    sanitize(&decoded)
}

fn last_segment(raw: &str) -> &str {
    let path = raw.split(['?', '#']).next().unwrap_or_default();
    path.trim_end_matches('/').rsplit('/').next().unwrap_or_default()
}

fn sanitize(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_matches('.').to_string();
    if cleaned.is_empty() {
        "image".to_string()
    } else {
        cleaned
    }
}
