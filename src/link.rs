//! Candidate link types and status definitions.
//!
//! A [`CandidateLink`] is a URL discovered in a post's comments. It is owned by
//! the persistence layer; analysis only ever produces an updated copy.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Analysis status of a candidate link.
///
/// `New` and `Retry` are the only states picked up by a batch. Everything
/// else is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LinkStatus {
    /// Discovered, never analyzed.
    New,
    /// The provider signalled a transient quota condition; one more attempt allowed.
    Retry,
    /// The download succeeded.
    Ok,
    /// Permanent failure (bad link, oversized payload, wrong file type).
    Failed,
    /// A second consecutive quota failure. Never retried again.
    RetryFailed,
    /// No known provider can service the URL.
    Unsupported,
}

impl LinkStatus {
    /// Returns the database string representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "NEW",
            Self::Retry => "RETRY",
            Self::Ok => "OK",
            Self::Failed => "FAILED",
            Self::RetryFailed => "RETRY_FAILED",
            Self::Unsupported => "UNSUPPORTED",
        }
    }

    /// Returns true if a batch should (re)analyze a link in this state.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::New | Self::Retry)
    }
}

impl fmt::Display for LinkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for LinkStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NEW" => Ok(Self::New),
            "RETRY" => Ok(Self::Retry),
            "OK" => Ok(Self::Ok),
            "FAILED" => Ok(Self::Failed),
            "RETRY_FAILED" => Ok(Self::RetryFailed),
            "UNSUPPORTED" => Ok(Self::Unsupported),
            _ => Err(format!("invalid link status: {s}")),
        }
    }
}

/// Which provider serviced a link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LinkType {
    /// Not yet attributed to any provider.
    #[serde(rename = "NEW")]
    New,
    /// Google Drive file links.
    #[serde(rename = "GOOGLE")]
    GoogleDrive,
}

impl LinkType {
    /// Returns the database string representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "NEW",
            Self::GoogleDrive => "GOOGLE",
        }
    }
}

impl fmt::Display for LinkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for LinkType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NEW" => Ok(Self::New),
            "GOOGLE" => Ok(Self::GoogleDrive),
            _ => Err(format!("invalid link type: {s}")),
        }
    }
}

/// A URL found in a post's comments, tracked through its analysis lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateLink {
    /// Identity assigned by the store.
    pub id: i64,
    /// Identifier of the post the comment belongs to.
    pub parent_post_id: String,
    /// Raw URL as it appeared in the comment.
    pub original_url: String,
    /// Provider that serviced the link.
    pub link_type: LinkType,
    /// Current analysis status.
    pub link_status: LinkStatus,
}

impl CandidateLink {
    /// Creates a freshly discovered link (`NEW`/`NEW`).
    #[must_use]
    pub fn new(id: i64, parent_post_id: impl Into<String>, original_url: impl Into<String>) -> Self {
        Self {
            id,
            parent_post_id: parent_post_id.into(),
            original_url: original_url.into(),
            link_type: LinkType::New,
            link_status: LinkStatus::New,
        }
    }

    /// Returns a copy with the given type and status.
    #[must_use]
    pub fn with_result(&self, link_type: LinkType, link_status: LinkStatus) -> Self {
        Self {
            link_type,
            link_status,
            ..self.clone()
        }
    }
}
