//! Constants for the download module (size caps, timeouts, rate limiting).

use std::time::Duration;

/// Largest archive accepted from a provider, in bytes.
pub const MAX_FILE_SIZE: u64 = 3_000_000;

/// Archive extensions a provider download may carry (compared ASCII case-insensitively).
pub const ACCEPTED_EXTENSIONS: [&str; 2] = [".ChromaEffects", ".zip"];

/// Default HTTP connect timeout (10 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default per-request timeout for provider calls (10 seconds).
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Google Drive quota: permits per refresh interval.
pub const DEFAULT_RESERVOIR: u32 = 50;

/// Google Drive quota: reservoir refresh interval.
pub const DEFAULT_RESERVOIR_REFRESH: Duration = Duration::from_secs(10);

/// Google Drive quota: transfers in flight at once.
pub const DEFAULT_MAX_CONCURRENT: usize = 1;

/// Google Drive quota: minimum delay between request starts.
pub const DEFAULT_MIN_SPACING: Duration = Duration::from_millis(250);

/// Base URL of the Google Drive v3 REST API.
pub const GOOGLE_API_BASE_URL: &str = "https://www.googleapis.com";
