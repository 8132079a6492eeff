//! Link resolution: decide which provider can service a raw comment URL.
//!
//! Resolution is pure pattern matching over known URL shapes. No network I/O
//! happens here, and malformed input simply resolves to nothing.
//!
//! # Example
//!
//! ```
//! use link_analyzer::resolver::resolve_link;
//! use link_analyzer::LinkType;
//!
//! let resolved = resolve_link("https://drive.google.com/file/d/ABC123/view").unwrap();
//! assert_eq!(resolved.link_type, LinkType::GoogleDrive);
//! assert_eq!(resolved.file_id, "ABC123");
//!
//! assert!(resolve_link("https://example.com/profile.zip").is_none());
//! ```

pub mod google_drive;
mod utils;

use tracing::debug;

use crate::link::LinkType;

/// A URL attributed to a provider, with the provider's file identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLink {
    /// Provider that recognized the URL.
    pub link_type: LinkType,
    /// Provider-specific file identifier.
    pub file_id: String,
}

impl ResolvedLink {
    /// Creates a resolved link.
    #[must_use]
    pub fn new(link_type: LinkType, file_id: impl Into<String>) -> Self {
        Self {
            link_type,
            file_id: file_id.into(),
        }
    }
}

type Recognizer = fn(&str) -> Option<String>;

/// Provider recognizers in priority order.
const RECOGNIZERS: &[(LinkType, Recognizer)] =
    &[(LinkType::GoogleDrive, google_drive::extract_file_id)];

/// Resolves a raw URL to the first provider that recognizes it.
///
/// Returns `None` when no provider matches ("unsupported").
#[must_use]
pub fn resolve_link(url: &str) -> Option<ResolvedLink> {
    let resolved = RECOGNIZERS.iter().find_map(|(link_type, recognize)| {
        recognize(url)
            .filter(|id| !id.is_empty())
            .map(|id| ResolvedLink::new(*link_type, id))
    });
    if resolved.is_none() {
        debug!(url, "no provider recognizes url");
    }
    resolved
}
