//! Runtime configuration for the analysis pipeline.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::archive::DEFAULT_MAX_EXTRACTED_BYTES;
use crate::download::RateLimitSettings;
use crate::download::constants::{
    CONNECT_TIMEOUT_SECS, GOOGLE_API_BASE_URL, MAX_FILE_SIZE, REQUEST_TIMEOUT_SECS,
};

/// Default root for per-job working directories.
pub const DEFAULT_DOWNLOAD_ROOT: &str = "./downloads";

/// Default destination for archives that yielded a profile.
pub const DEFAULT_ARCHIVE_DIR: &str = "./profile-archives";

/// Invalid configuration values.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A numeric value is outside its accepted range.
    #[error("invalid config value for `{field}`: {value}. Expected range: {expected}")]
    OutOfRange {
        /// Configuration field name.
        field: &'static str,
        /// The rejected value.
        value: u128,
        /// Human-readable accepted range.
        expected: &'static str,
    },

    /// A path setting is empty.
    #[error("invalid config value for `{field}`: path must not be empty")]
    EmptyPath {
        /// Configuration field name.
        field: &'static str,
    },

    /// The API base is not an absolute http(s) URL.
    #[error("invalid config value for `google_api_base`: {value}")]
    InvalidApiBase {
        /// The rejected value.
        value: String,
    },
}

impl ConfigError {
    fn out_of_range(field: &'static str, value: impl Into<u128>, expected: &'static str) -> Self {
        Self::OutOfRange {
            field,
            value: value.into(),
            expected,
        }
    }
}

/// Settings for resolving, downloading and unpacking candidate links.
#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    /// Parent of per-job working directories.
    pub download_root: PathBuf,
    /// Where archives that produced a profile are kept.
    pub archive_dir: PathBuf,
    /// Google API key; Drive downloads are disabled without one.
    pub google_api_key: Option<String>,
    /// Google API host, overridable for mocks.
    pub google_api_base: String,
    /// Largest archive accepted, in bytes.
    pub max_file_size: u64,
    /// Largest total uncompressed size of one archive, in bytes.
    pub max_extracted_bytes: u64,
    /// HTTP connect timeout in seconds.
    pub connect_timeout_secs: u64,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
    /// Provider quota shape.
    pub rate_limit: RateLimitSettings,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            download_root: PathBuf::from(DEFAULT_DOWNLOAD_ROOT),
            archive_dir: PathBuf::from(DEFAULT_ARCHIVE_DIR),
            google_api_key: None,
            google_api_base: GOOGLE_API_BASE_URL.to_string(),
            max_file_size: MAX_FILE_SIZE,
            max_extracted_bytes: DEFAULT_MAX_EXTRACTED_BYTES,
            connect_timeout_secs: CONNECT_TIMEOUT_SECS,
            request_timeout_secs: REQUEST_TIMEOUT_SECS,
            rate_limit: RateLimitSettings::default(),
        }
    }
}

impl AnalyzerConfig {
    /// Validates config values against runtime constraints.
    ///
    /// # Errors
    ///
    /// Returns the first `ConfigError` found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.download_root.as_os_str().is_empty() {
            return Err(ConfigError::EmptyPath {
                field: "download_root",
            });
        }
        if self.archive_dir.as_os_str().is_empty() {
            return Err(ConfigError::EmptyPath {
                field: "archive_dir",
            });
        }

        match Url::parse(&self.google_api_base) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            _ => {
                return Err(ConfigError::InvalidApiBase {
                    value: self.google_api_base.clone(),
                });
            }
        }

        if !(1..=100_000_000).contains(&self.max_file_size) {
            return Err(ConfigError::out_of_range(
                "max_file_size",
                self.max_file_size,
                "1..=100000000",
            ));
        }
        if !(1..=1_000_000_000).contains(&self.max_extracted_bytes) {
            return Err(ConfigError::out_of_range(
                "max_extracted_bytes",
                self.max_extracted_bytes,
                "1..=1000000000",
            ));
        }

        validate_timeout_secs("connect_timeout_secs", self.connect_timeout_secs)?;
        validate_timeout_secs("request_timeout_secs", self.request_timeout_secs)?;
        validate_rate_limit(&self.rate_limit)?;

        Ok(())
    }
}

fn validate_timeout_secs(field: &'static str, value: u64) -> Result<(), ConfigError> {
    if !(1..=3600).contains(&value) {
        return Err(ConfigError::out_of_range(field, value, "1..=3600"));
    }
    Ok(())
}

fn validate_rate_limit(settings: &RateLimitSettings) -> Result<(), ConfigError> {
    if settings.reservoir == 0 {
        return Err(ConfigError::out_of_range(
            "rate_limit.reservoir",
            settings.reservoir,
            "1..",
        ));
    }
    if settings.refresh_interval.is_zero() || settings.refresh_interval > Duration::from_secs(3600)
    {
        return Err(ConfigError::out_of_range(
            "rate_limit.refresh_interval_ms",
            settings.refresh_interval.as_millis(),
            "1..=3600000",
        ));
    }
    if !(1..=64).contains(&settings.max_concurrent) {
        return Err(ConfigError::out_of_range(
            "rate_limit.max_concurrent",
            settings.max_concurrent as u128,
            "1..=64",
        ));
    }
    if settings.min_spacing > Duration::from_secs(60) {
        return Err(ConfigError::out_of_range(
            "rate_limit.min_spacing_ms",
            settings.min_spacing.as_millis(),
            "0..=60000",
        ));
    }
    Ok(())
}
