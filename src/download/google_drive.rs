//! Google Drive downloader backed by the Drive v3 REST API.
//!
//! A download is a metadata probe (`files/{id}?key=…`) that yields the file
//! name, followed by the media transfer (`files/{id}?key=…&alt=media`). Both
//! calls run inside the downloader's rate limiter.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::client::HttpClient;
use super::constants::{GOOGLE_API_BASE_URL, MAX_FILE_SIZE};
use super::error::DownloadError;
use super::filename::{has_accepted_extension, sanitize_filename};
use super::rate_limiter::RateLimiter;
use super::{DownloadOutcome, Downloader, DownloaderPriority};
use crate::link::LinkType;
use crate::resolver::google_drive::canonical_download_url;

/// Subset of the Drive `files.get` response we read.
#[derive(Debug, Deserialize)]
struct FileMetadata {
    name: Option<String>,
}

/// Fetches shared Drive files by id using an API key.
#[derive(Debug)]
pub struct GoogleDriveDownloader {
    api_key: String,
    api_base: String,
    max_file_size: u64,
    client: HttpClient,
    limiter: Arc<RateLimiter>,
}

impl GoogleDriveDownloader {
    /// Creates a downloader against the public Drive API.
    #[must_use]
    pub fn new(api_key: impl Into<String>, limiter: Arc<RateLimiter>) -> Self {
        Self {
            api_key: api_key.into(),
            api_base: GOOGLE_API_BASE_URL.to_string(),
            max_file_size: MAX_FILE_SIZE,
            client: HttpClient::new(),
            limiter,
        }
    }

    /// Points the downloader at a different API host (mock servers, proxies).
    #[must_use]
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    /// Overrides the archive size cap in bytes.
    #[must_use]
    pub fn with_max_file_size(mut self, max_file_size: u64) -> Self {
        self.max_file_size = max_file_size;
        self
    }

    /// Replaces the HTTP client, e.g. one with different timeouts.
    #[must_use]
    pub fn with_client(mut self, client: HttpClient) -> Self {
        self.client = client;
        self
    }

    fn file_url(&self, file_id: &str, media: bool) -> Result<Url, DownloadError> {
        let raw = format!(
            "{}/drive/v3/files/{}",
            self.api_base,
            urlencoding::encode(file_id)
        );
        let mut url = Url::parse(&raw).map_err(|_| DownloadError::invalid_url(raw.clone()))?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("key", &self.api_key);
            if media {
                query.append_pair("alt", "media");
            }
        }
        Ok(url)
    }

    /// Probe, validate, then transfer. Any error aborts the remaining steps.
    async fn fetch(&self, file_id: &str, work_dir: &Path) -> Result<PathBuf, DownloadError> {
        let metadata_url = self.file_url(file_id, false)?;
        let metadata: FileMetadata = self
            .client
            .get_json(&metadata_url)
            .await
            .map_err(|e| DownloadError::missing_metadata(file_id, e.to_string()))?;

        let name = metadata
            .name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .ok_or_else(|| DownloadError::missing_metadata(file_id, "response has no file name"))?;

        if !has_accepted_extension(&name) {
            return Err(DownloadError::unsupported_extension(name));
        }
        debug!(file_id, name = %name, "metadata probe accepted");

        let dest = work_dir.join(sanitize_filename(&name));
        let media_url = self.file_url(file_id, true)?;
        let _bytes = self
            .client
            .download_capped(&media_url, &dest, self.max_file_size)
            .await?;
        Ok(dest)
    }
}

#[async_trait]
impl Downloader for GoogleDriveDownloader {
    fn name(&self) -> &str {
        "google_drive"
    }

    fn link_type(&self) -> LinkType {
        LinkType::GoogleDrive
    }

    fn priority(&self) -> DownloaderPriority {
        DownloaderPriority::Specialized
    }

    #[instrument(skip(self, work_dir), fields(downloader = "google_drive"))]
    async fn download(&self, file_id: &str, work_dir: &Path) -> DownloadOutcome {
        let download_url = canonical_download_url(file_id);
        match self.limiter.run(|| self.fetch(file_id, work_dir)).await {
            Ok(path) => {
                info!(path = %path.display(), "archive downloaded");
                DownloadOutcome::ok(LinkType::GoogleDrive, path, download_url)
            }
            Err(error) => {
                warn!(error = %error, status = %error.status(), "google drive download failed");
                DownloadOutcome::from_error(&error, LinkType::GoogleDrive, download_url)
            }
        }
    }
}
