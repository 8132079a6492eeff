//! Sequential batch over every pending candidate link.
//!
//! Links are analyzed one at a time in id order. Each result is written back
//! before the next link starts, and the batch stops as soon as a link comes
//! back `RETRY`: the provider quota is exhausted, so the rest would fail too.

use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::analyzer::{LinkAnalysis, LinkAnalyzer};
use crate::link::LinkStatus;
use crate::store::{LinkRepository, StoreError};

/// Counters for one batch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    /// Links analyzed and written back.
    pub processed: usize,
    /// Links whose download succeeded.
    pub analyzed: usize,
    /// Profiles newly stored.
    pub imported: usize,
    /// True if the batch stopped early on a quota refusal.
    pub halted_on_retry: bool,
}

/// Runs one batch.
///
/// # Errors
///
/// Returns the first [`StoreError`]; links already written stay written.
pub async fn run_batch(
    repo: &dyn LinkRepository,
    analyzer: &LinkAnalyzer,
) -> Result<BatchReport, StoreError> {
    run_batch_with_progress(repo, analyzer, |_| {}).await
}

/// Runs one batch, calling `on_link` after each link is persisted.
///
/// # Errors
///
/// Returns the first [`StoreError`]; links already written stay written.
#[instrument(skip_all)]
pub async fn run_batch_with_progress(
    repo: &dyn LinkRepository,
    analyzer: &LinkAnalyzer,
    mut on_link: impl FnMut(&LinkAnalysis) + Send,
) -> Result<BatchReport, StoreError> {
    let pending = repo.pending_links().await?;
    info!(pending = pending.len(), "starting batch");

    let mut report = BatchReport::default();
    for link in &pending {
        let analysis = analyzer.analyze(link).await;
        repo.update_link(&analysis.link).await?;
        report.processed += 1;

        if analysis.link.link_status == LinkStatus::Ok {
            report.analyzed += 1;
        }
        if let Some(profile) = &analysis.profile {
            if repo.insert_profile(profile).await? {
                report.imported += 1;
            }
        }
        on_link(&analysis);

        if analysis.link.link_status == LinkStatus::Retry {
            warn!(
                link_id = analysis.link.id,
                remaining = pending.len() - report.processed,
                "provider quota exhausted; stopping batch"
            );
            report.halted_on_retry = true;
            break;
        }
    }

    info!(
        processed = report.processed,
        analyzed = report.analyzed,
        imported = report.imported,
        halted_on_retry = report.halted_on_retry,
        "batch finished"
    );
    Ok(report)
}
