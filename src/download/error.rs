//! Error types for the download module.
//!
//! Provider plugins never surface these to the orchestrator directly; they are
//! logged and collapsed into a [`DownloadStatus`] via [`DownloadError::status`].

use std::path::PathBuf;

use thiserror::Error;

use super::DownloadStatus;

/// Errors that can occur while probing or transferring a provider file.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// Network-level error (DNS resolution, connection refused, TLS errors, etc.)
    #[error("network error downloading {url}: {source}")]
    Network {
        /// The URL that failed.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// Request timed out before completion.
    #[error("timeout downloading {url}")]
    Timeout {
        /// The URL that timed out.
        url: String,
    },

    /// The provider refused access, which it does when its quota trips.
    #[error("provider quota exceeded (HTTP 403) downloading {url}")]
    QuotaExceeded {
        /// The URL that was refused.
        url: String,
    },

    /// Any other non-success HTTP response.
    #[error("HTTP {status} downloading {url}")]
    HttpStatus {
        /// The URL that returned an error status.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// The metadata probe did not yield a usable filename.
    #[error("no file metadata for {file_id}: {reason}")]
    MissingMetadata {
        /// Provider file identifier.
        file_id: String,
        /// What was wrong with the metadata response.
        reason: String,
    },

    /// The file does not carry an accepted archive extension.
    #[error("unsupported file type: {filename}")]
    UnsupportedExtension {
        /// Filename reported by the provider.
        filename: String,
    },

    /// The payload exceeded the size cap (declared or while streaming).
    #[error("payload too large downloading {url}: {bytes} bytes exceeds limit of {limit}")]
    TooLarge {
        /// The URL being transferred.
        url: String,
        /// Bytes declared or received when the cap was hit.
        bytes: u64,
        /// The configured cap.
        limit: u64,
    },

    /// File system error during download (create file, write, etc.)
    #[error("IO error writing to {path}: {source}")]
    Io {
        /// The file path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The provider URL could not be built.
    #[error("invalid URL: {url}")]
    InvalidUrl {
        /// The invalid URL string.
        url: String,
    },
}

impl DownloadError {
    /// Creates a network or timeout error from a reqwest error.
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        let url = url.into();
        if source.is_timeout() {
            Self::timeout(url)
        } else {
            Self::Network { url, source }
        }
    }

    /// Creates an error for a non-success HTTP status, promoting 403 to quota.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        let url = url.into();
        if status == 403 {
            Self::QuotaExceeded { url }
        } else {
            Self::HttpStatus { url, status }
        }
    }

    /// Creates a timeout error.
    pub fn timeout(url: impl Into<String>) -> Self {
        Self::Timeout { url: url.into() }
    }

    /// Creates a missing-metadata error.
    pub fn missing_metadata(file_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MissingMetadata {
            file_id: file_id.into(),
            reason: reason.into(),
        }
    }

    /// Creates an unsupported-extension error.
    pub fn unsupported_extension(filename: impl Into<String>) -> Self {
        Self::UnsupportedExtension {
            filename: filename.into(),
        }
    }

    /// Creates a size-cap error.
    pub fn too_large(url: impl Into<String>, bytes: u64, limit: u64) -> Self {
        Self::TooLarge {
            url: url.into(),
            bytes,
            limit,
        }
    }

    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Collapses the error into the plugin outcome taxonomy.
    ///
    /// Only a provider quota refusal is transient; everything else, timeouts
    /// included, is a permanent failure for this link.
    #[must_use]
    pub fn status(&self) -> DownloadStatus {
        match self {
            Self::QuotaExceeded { .. } => DownloadStatus::Retry,
            _ => DownloadStatus::Failed,
        }
    }
}

// No `From<reqwest::Error>` / `From<std::io::Error>`: every variant needs the
// url or path, which the source errors do not carry.
