//! User-Agent string for provider API traffic.

/// Project URL for User-Agent identification (good citizenship; RFC 9308).
const PROJECT_UA_URL: &str = "https://github.com/fierce/link-analyzer";

/// Default User-Agent for provider requests (identifies the tool).
#[must_use]
pub(crate) fn default_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("link-analyzer/{version} (profile-indexer; +{PROJECT_UA_URL})")
}
