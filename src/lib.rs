//! Link Analyzer Library
//!
//! Finds lighting-effect profiles shared as links in community posts: each
//! candidate link is resolved to a file-hosting provider, downloaded under the
//! provider's quota, unpacked, and its XML configuration documents parsed
//! into a profile record.
//!
//! # Architecture
//!
//! - [`resolver`] - Recognize provider URLs and extract file ids
//! - [`download`] - Downloader plugins, registry and rate limiter
//! - [`archive`] - Bounded zip extraction
//! - [`profile`] - Lighting configuration parsing and the profile model
//! - [`files`] - Per-job directories, archiving and cleanup
//! - [`analyzer`] - One link from URL to status and profile
//! - [`store`] / [`db`] - SQLite persistence for links and profiles
//! - [`batch`] - Sequential batch over pending links

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod analyzer;
pub mod archive;
pub mod batch;
pub mod config;
pub mod db;
pub mod download;
pub mod files;
pub mod link;
pub mod profile;
pub mod resolver;
pub mod store;
#[cfg(test)]
pub mod test_support;
pub(crate) mod user_agent;

// Re-export commonly used types
pub use analyzer::{LinkAnalysis, LinkAnalyzer, next_status};
pub use archive::{ArchiveError, extract_archive};
pub use batch::{BatchReport, run_batch, run_batch_with_progress};
pub use config::{AnalyzerConfig, ConfigError};
pub use db::{Database, DbError};
pub use download::{
    DownloadError, DownloadOutcome, DownloadStatus, Downloader, DownloaderPriority,
    DownloaderRegistry, GoogleDriveDownloader, HttpClient, RateLimitSettings, RateLimiter,
    build_default_registry,
};
pub use link::{CandidateLink, LinkStatus, LinkType};
pub use profile::{LightingEffect, ProfileError, ProfileStub, parse_profile_file};
pub use resolver::{ResolvedLink, resolve_link};
pub use store::{LinkRepository, LinkStore, StoreError};
