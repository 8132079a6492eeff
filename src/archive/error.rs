//! Error types for archive extraction.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while unpacking an archive.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// The archive file could not be opened.
    #[error("cannot open archive {path}: {source}")]
    Open {
        /// Archive path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The archive is not a readable zip container.
    #[error("corrupt or unsupported archive {path}: {source}")]
    Corrupt {
        /// Archive path.
        path: PathBuf,
        /// The underlying zip error.
        #[source]
        source: zip::result::ZipError,
    },

    /// Writing an extracted member failed.
    #[error("IO error extracting to {path}: {source}")]
    Io {
        /// Output path being written.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Uncompressed output exceeded the configured cap.
    #[error("archive {path} expands beyond {limit} bytes")]
    TooLarge {
        /// Archive path.
        path: PathBuf,
        /// The configured cap.
        limit: u64,
    },
}

impl ArchiveError {
    pub(crate) fn open(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Open {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn corrupt(path: impl Into<PathBuf>, source: zip::result::ZipError) -> Self {
        Self::Corrupt {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn too_large(path: impl Into<PathBuf>, limit: u64) -> Self {
        Self::TooLarge {
            path: path.into(),
            limit,
        }
    }
}
