//! Provider downloaders: fetch a profile archive for a resolved link.
//!
//! Each provider implements the [`Downloader`] trait. Downloaders are collected
//! in a [`DownloaderRegistry`], which tries every downloader that serves a link
//! type in priority order and keeps the most useful outcome.
//!
//! Downloaders never return errors. Whatever happens during a transfer is
//! logged and folded into a [`DownloadOutcome`] whose [`DownloadStatus`] is
//! one of `Ok`, `Retry` (transient provider quota) or `Failed`.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use std::sync::Arc;
//! use link_analyzer::download::{
//!     DownloaderRegistry, GoogleDriveDownloader, RateLimiter,
//! };
//! use link_analyzer::resolver::resolve_link;
//!
//! # async fn example() {
//! let mut registry = DownloaderRegistry::new();
//! registry.register(Box::new(GoogleDriveDownloader::new(
//!     "api-key",
//!     Arc::new(RateLimiter::default()),
//! )));
//!
//! let resolved = resolve_link("https://drive.google.com/file/d/ABC/view").unwrap();
//! let outcome = registry.download(&resolved, Path::new("/tmp/job")).await;
//! println!("{outcome:?}");
//! # }
//! ```

mod client;
pub mod constants;
mod error;
pub mod filename;
mod google_drive;
pub mod rate_limiter;
mod registry;

use std::fmt;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Serialize;

pub use client::HttpClient;
pub use error::DownloadError;
pub use google_drive::GoogleDriveDownloader;
pub use rate_limiter::{RateLimitSettings, RateLimiter};
pub use registry::{DownloaderRegistry, build_default_registry};

use crate::link::LinkType;

/// Result class of a single download attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DownloadStatus {
    /// The archive is on disk.
    Ok,
    /// The provider refused for now (quota); try again in a later batch.
    Retry,
    /// The link cannot be serviced.
    Failed,
}

impl DownloadStatus {
    /// Returns the status as its stored string form.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::Retry => "RETRY",
            Self::Failed => "FAILED",
        }
    }
}

impl fmt::Display for DownloadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a downloader reports back for one link.
///
/// `local_file` is set only when `status` is [`DownloadStatus::Ok`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadOutcome {
    /// Result class.
    pub status: DownloadStatus,
    /// Downloaded archive, present only on success.
    pub local_file: Option<PathBuf>,
    /// Provider that produced the outcome.
    pub link_type: LinkType,
    /// Canonical user-facing download URL.
    pub download_url: String,
}

impl DownloadOutcome {
    /// A successful download at `local_file`.
    #[must_use]
    pub fn ok(link_type: LinkType, local_file: PathBuf, download_url: impl Into<String>) -> Self {
        Self {
            status: DownloadStatus::Ok,
            local_file: Some(local_file),
            link_type,
            download_url: download_url.into(),
        }
    }

    /// A transient refusal.
    #[must_use]
    pub fn retry(link_type: LinkType, download_url: impl Into<String>) -> Self {
        Self {
            status: DownloadStatus::Retry,
            local_file: None,
            link_type,
            download_url: download_url.into(),
        }
    }

    /// A permanent failure.
    #[must_use]
    pub fn failed(link_type: LinkType, download_url: impl Into<String>) -> Self {
        Self {
            status: DownloadStatus::Failed,
            local_file: None,
            link_type,
            download_url: download_url.into(),
        }
    }

    /// Builds the outcome matching a download error's status.
    #[must_use]
    pub fn from_error(
        error: &DownloadError,
        link_type: LinkType,
        download_url: impl Into<String>,
    ) -> Self {
        match error.status() {
            DownloadStatus::Retry => Self::retry(link_type, download_url),
            _ => Self::failed(link_type, download_url),
        }
    }
}

/// Priority level for downloader ordering.
///
/// Derives `Ord` so that `Specialized < General < Fallback` for sorting
/// (try specialized first).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DownloaderPriority {
    /// Provider-specific API downloaders (e.g. Google Drive).
    Specialized = 0,
    /// Generic downloaders for a provider family.
    General = 1,
    /// Last resort, e.g. a plain HTTP fetch.
    Fallback = 2,
}

/// A provider plugin that fetches the archive behind a file id.
///
/// Implementations own their HTTP client and rate limiter.
#[async_trait]
pub trait Downloader: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// The resolved link type this downloader serves.
    fn link_type(&self) -> LinkType;

    /// Ordering within the registry.
    fn priority(&self) -> DownloaderPriority;

    /// Fetches `file_id` into `work_dir`.
    async fn download(&self, file_id: &str, work_dir: &Path) -> DownloadOutcome;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_download_outcome_constructors() {
        let ok = DownloadOutcome::ok(LinkType::GoogleDrive, PathBuf::from("/tmp/a.zip"), "u");
        assert_eq!(ok.status, DownloadStatus::Ok);
        assert_eq!(ok.local_file.as_deref(), Some(Path::new("/tmp/a.zip")));

        let retry = DownloadOutcome::retry(LinkType::GoogleDrive, "u");
        assert_eq!(retry.status, DownloadStatus::Retry);
        assert!(retry.local_file.is_none());

        let failed = DownloadOutcome::failed(LinkType::GoogleDrive, "u");
        assert_eq!(failed.status, DownloadStatus::Failed);
        assert!(failed.local_file.is_none());
    }

    #[test]
    fn test_download_outcome_from_error() {
        let quota = DownloadError::http_status("u", 403);
        assert_eq!(
            DownloadOutcome::from_error(&quota, LinkType::GoogleDrive, "u").status,
            DownloadStatus::Retry
        );
        let missing = DownloadError::http_status("u", 404);
        assert_eq!(
            DownloadOutcome::from_error(&missing, LinkType::GoogleDrive, "u").status,
            DownloadStatus::Failed
        );
    }

    #[test]
    fn test_priority_ordering() {
        assert!(DownloaderPriority::Specialized < DownloaderPriority::General);
        assert!(DownloaderPriority::General < DownloaderPriority::Fallback);
    }

    #[test]
    fn test_download_status_display() {
        assert_eq!(DownloadStatus::Ok.to_string(), "OK");
        assert_eq!(DownloadStatus::Retry.to_string(), "RETRY");
        assert_eq!(DownloadStatus::Failed.to_string(), "FAILED");
    }
}
