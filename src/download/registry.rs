//! Downloader registry: the plugin chain behind one resolved link.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info};

use super::client::HttpClient;
use super::{DownloadOutcome, DownloadStatus, Downloader, GoogleDriveDownloader, RateLimiter};
use crate::config::AnalyzerConfig;
use crate::resolver::ResolvedLink;

/// A priority-ordered collection of downloaders.
///
/// Downloaders are tried in priority order (Specialized first, then General,
/// then Fallback). Within the same priority level, registration order is
/// preserved.
pub struct DownloaderRegistry {
    downloaders: Vec<Box<dyn Downloader>>,
}

impl DownloaderRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            downloaders: Vec::new(),
        }
    }

    /// Registers a downloader.
    #[tracing::instrument(skip(self, downloader), fields(downloader_name))]
    pub fn register(&mut self, downloader: Box<dyn Downloader>) {
        tracing::Span::current().record("downloader_name", downloader.name());
        debug!(
            name = downloader.name(),
            link_type = %downloader.link_type(),
            priority = ?downloader.priority(),
            "Registering downloader"
        );
        self.downloaders.push(downloader);
        // Stable sort keeps registration order within a priority level.
        self.downloaders.sort_by_key(|d| d.priority());
    }

    /// Returns the number of registered downloaders.
    #[must_use]
    pub fn downloader_count(&self) -> usize {
        self.downloaders.len()
    }

    /// Returns true if no downloaders are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.downloaders.is_empty()
    }

    /// Returns the downloaders serving `link`, in the order they will be tried.
    #[must_use]
    pub fn find_handlers(&self, link: &ResolvedLink) -> Vec<&dyn Downloader> {
        self.downloaders
            .iter()
            .filter(|d| d.link_type() == link.link_type)
            .map(|d| &**d)
            .collect()
    }

    /// Runs the plugin chain for `link`.
    ///
    /// The first outcome is kept unless a later downloader reports `Ok` or
    /// `Retry`; the chain stops at the first `Ok` or `Retry`. Returns `None`
    /// when no downloader serves the link's type.
    #[tracing::instrument(skip(self, work_dir), fields(link_type = %link.link_type, file_id = %link.file_id))]
    pub async fn download(&self, link: &ResolvedLink, work_dir: &Path) -> Option<DownloadOutcome> {
        let handlers = self.find_handlers(link);
        if handlers.is_empty() {
            debug!("no downloader serves this link type");
            return None;
        }

        let mut kept: Option<DownloadOutcome> = None;
        for handler in handlers {
            debug!(downloader = handler.name(), "Trying downloader");
            let outcome = handler.download(&link.file_id, work_dir).await;
            let status = outcome.status;
            let decisive = matches!(status, DownloadStatus::Ok | DownloadStatus::Retry);
            if decisive || kept.is_none() {
                kept = Some(outcome);
            }
            if decisive {
                info!(
                    downloader = handler.name(),
                    status = %status,
                    "downloader chain settled"
                );
                break;
            }
            debug!(downloader = handler.name(), "downloader failed, trying next");
        }
        kept
    }
}

impl std::fmt::Debug for DownloaderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.downloaders.iter().map(|d| d.name()).collect();
        f.debug_struct("DownloaderRegistry")
            .field("downloader_count", &self.downloaders.len())
            .field("downloaders", &names)
            .finish()
    }
}

impl Default for DownloaderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Builds the registry for a configuration.
///
/// The Google Drive downloader is registered only when an API key is set;
/// without one every Drive link resolves to "no downloader".
#[must_use]
pub fn build_default_registry(config: &AnalyzerConfig) -> DownloaderRegistry {
    let mut registry = DownloaderRegistry::new();

    match config.google_api_key.as_deref().map(str::trim) {
        Some(key) if !key.is_empty() => {
            let limiter = Arc::new(RateLimiter::new(config.rate_limit));
            let client = HttpClient::new_with_timeouts(
                config.connect_timeout_secs,
                config.request_timeout_secs,
            );
            registry.register(Box::new(
                GoogleDriveDownloader::new(key, limiter)
                    .with_api_base(config.google_api_base.clone())
                    .with_max_file_size(config.max_file_size)
                    .with_client(client),
            ));
        }
        _ => debug!("no Google API key configured; Google Drive downloads disabled"),
    }

    registry
}
