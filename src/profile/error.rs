//! Error types for profile document parsing.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while reading a lighting configuration document.
#[derive(Debug, Error)]
pub enum ProfileError {
    /// The document could not be read.
    #[error("cannot read profile document {path}: {source}")]
    Io {
        /// Document path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The document is not well-formed XML.
    #[error("malformed XML at byte {position}: {message}")]
    Xml {
        /// Reader offset where parsing stopped.
        position: u64,
        /// Description of the problem.
        message: String,
    },
}

impl ProfileError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn xml(position: u64, message: impl Into<String>) -> Self {
        Self::Xml {
            position,
            message: message.into(),
        }
    }
}
