//! Link analysis: turn one candidate link into an updated status and,
//! when the archive holds usable data, a profile stub.
//!
//! The flow for one link:
//!
//! 1. Resolve the URL to a provider. No provider means `UNSUPPORTED`.
//! 2. Create a per-job working directory under the download root.
//! 3. Run the downloader chain inside that directory.
//! 4. On success, on a blocking thread: unpack the archive, parse every
//!    `.xml` member, discard the members, then archive the original file if
//!    it produced effects or discard it otherwise.
//! 5. Drop the job directory, which removes anything still inside it.
//!
//! Analysis never returns an error. Every internal failure is logged and
//! reflected in the resulting [`LinkStatus`].

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::archive::extract_archive_with_limit;
use crate::config::AnalyzerConfig;
use crate::download::filename::is_xml_member;
use crate::download::{DownloadStatus, DownloaderRegistry, build_default_registry};
use crate::files::{FileLifecycle, JobDir};
use crate::link::{CandidateLink, LinkStatus, LinkType};
use crate::profile::{LightingEffect, ProfileStub, parse_profile_file};
use crate::resolver::resolve_link;

/// Result of analyzing one link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkAnalysis {
    /// The link with its new type and status.
    pub link: CandidateLink,
    /// Profile extracted from the archive, if any document was usable.
    pub profile: Option<ProfileStub>,
}

/// Computes a link's next status from its previous one and the download result.
///
/// A quota refusal is retried once: `RETRY` after `RETRY` becomes
/// `RETRY_FAILED`.
#[must_use]
pub fn next_status(previous: LinkStatus, outcome: DownloadStatus) -> LinkStatus {
    match outcome {
        DownloadStatus::Ok => LinkStatus::Ok,
        DownloadStatus::Failed => LinkStatus::Failed,
        DownloadStatus::Retry if previous == LinkStatus::Retry => LinkStatus::RetryFailed,
        DownloadStatus::Retry => LinkStatus::Retry,
    }
}

/// Drives resolution, download, extraction, parsing and cleanup for links.
#[derive(Debug)]
pub struct LinkAnalyzer {
    registry: DownloaderRegistry,
    lifecycle: FileLifecycle,
    download_root: PathBuf,
    max_extracted_bytes: u64,
}

impl LinkAnalyzer {
    /// Creates an analyzer with an explicit downloader registry.
    #[must_use]
    pub fn new(registry: DownloaderRegistry, config: &AnalyzerConfig) -> Self {
        Self {
            registry,
            lifecycle: FileLifecycle::new(&config.archive_dir),
            download_root: config.download_root.clone(),
            max_extracted_bytes: config.max_extracted_bytes,
        }
    }

    /// Creates an analyzer with the downloaders the configuration enables.
    #[must_use]
    pub fn from_config(config: &AnalyzerConfig) -> Self {
        Self::new(build_default_registry(config), config)
    }

    /// Analyzes one link. Never fails; problems surface as the returned status.
    #[instrument(skip(self, link), fields(link_id = link.id, url = %link.original_url))]
    pub async fn analyze(&self, link: &CandidateLink) -> LinkAnalysis {
        let Some(resolved) = resolve_link(&link.original_url) else {
            info!("no provider for link");
            return unsupported(link);
        };

        let job = match JobDir::create(&self.download_root) {
            Ok(job) => job,
            Err(error) => {
                warn!(
                    root = %self.download_root.display(),
                    error = %error,
                    "cannot create job directory"
                );
                return LinkAnalysis {
                    link: link.with_result(resolved.link_type, LinkStatus::Failed),
                    profile: None,
                };
            }
        };

        let Some(outcome) = self.registry.download(&resolved, job.path()).await else {
            info!(link_type = %resolved.link_type, "no downloader for provider");
            return unsupported(link);
        };

        let status = next_status(link.link_status, outcome.status);
        debug!(previous = %link.link_status, next = %status, "status transition");

        let effects = match outcome.local_file {
            Some(file) if outcome.status == DownloadStatus::Ok => {
                self.process_download(job, file).await
            }
            _ => Vec::new(),
        };

        let profile = ProfileStub::new(link, outcome.download_url, effects);
        info!(
            status = %status,
            profile = profile.is_some(),
            "link analyzed"
        );
        LinkAnalysis {
            link: link.with_result(outcome.link_type, status),
            profile,
        }
    }

    /// Runs the synchronous archive steps off the async runtime.
    ///
    /// Takes ownership of the job directory so it is removed on that thread.
    async fn process_download(&self, job: JobDir, file: PathBuf) -> Vec<LightingEffect> {
        let lifecycle = self.lifecycle.clone();
        let max_bytes = self.max_extracted_bytes;
        let task =
            tokio::task::spawn_blocking(move || process_archive(&job, &file, &lifecycle, max_bytes));
        match task.await {
            Ok(effects) => effects,
            Err(error) => {
                warn!(error = %error, "archive processing task failed");
                Vec::new()
            }
        }
    }
}

fn unsupported(link: &CandidateLink) -> LinkAnalysis {
    LinkAnalysis {
        link: link.with_result(LinkType::New, LinkStatus::Unsupported),
        profile: None,
    }
}

/// Extract, parse and clean up one downloaded archive.
fn process_archive(
    job: &JobDir,
    archive: &Path,
    lifecycle: &FileLifecycle,
    max_bytes: u64,
) -> Vec<LightingEffect> {
    let extract_dir = job.extract_dir();
    let members = extract_archive_with_limit(archive, &extract_dir, max_bytes);
    debug!(members = members.len(), "archive extracted");

    let mut effects = Vec::new();
    for member in members {
        let path = extract_dir.join(&member);
        if is_xml_member(&path) {
            match parse_profile_file(&path) {
                Ok(effect) if effect.is_usable() => effects.push(effect),
                Ok(_) => debug!(member = %member.display(), "document has no devices or colours"),
                Err(error) => warn!(member = %member.display(), error = %error, "skipping unreadable document"),
            }
        } else {
            debug!(member = %member.display(), "skipping non-XML member");
        }
        lifecycle.discard(&path);
    }

    if effects.is_empty() {
        lifecycle.discard(archive);
    } else if let Some(kept) = lifecycle.archive(archive) {
        debug!(path = %kept.display(), "profile archive kept");
    }
    effects
}
