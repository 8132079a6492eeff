//! Archive extraction for downloaded profile containers.
//!
//! `.ChromaEffects` files are plain zip containers, so both accepted suffixes
//! go through the same extractor. Extraction never fails the caller:
//! [`extract_archive`] logs problems and returns an empty list, while
//! [`try_extract_archive`] exposes the typed [`ArchiveError`].
//!
//! Guards applied to every archive:
//! - members whose names would escape the output directory are skipped
//! - directory entries are created but not reported
//! - total uncompressed output is capped; exceeding it removes everything
//!   written so far and fails the extraction

mod error;

use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use tracing::{debug, instrument, warn};
use zip::ZipArchive;

pub use error::ArchiveError;

/// Default cap on total uncompressed bytes written for one archive (50 MB).
pub const DEFAULT_MAX_EXTRACTED_BYTES: u64 = 50 * 1024 * 1024;

/// Extracts `archive` into `out_dir` with the default output cap.
///
/// Returns member paths relative to `out_dir`; any error yields an empty list.
#[must_use]
pub fn extract_archive(archive: &Path, out_dir: &Path) -> Vec<PathBuf> {
    extract_archive_with_limit(archive, out_dir, DEFAULT_MAX_EXTRACTED_BYTES)
}

/// Like [`extract_archive`] with an explicit output cap.
#[must_use]
pub fn extract_archive_with_limit(archive: &Path, out_dir: &Path, max_bytes: u64) -> Vec<PathBuf> {
    match try_extract_archive(archive, out_dir, max_bytes) {
        Ok(members) => members,
        Err(error) => {
            warn!(error = %error, "archive extraction failed");
            Vec::new()
        }
    }
}

/// Extracts `archive` into `out_dir`, returning member paths relative to `out_dir`.
///
/// # Errors
///
/// Returns `ArchiveError` when the archive cannot be opened or read, a member
/// cannot be written, or the output exceeds `max_bytes`.
#[instrument(skip_all, fields(archive = %archive.display(), out_dir = %out_dir.display()))]
pub fn try_extract_archive(
    archive: &Path,
    out_dir: &Path,
    max_bytes: u64,
) -> Result<Vec<PathBuf>, ArchiveError> {
    let file = File::open(archive).map_err(|e| ArchiveError::open(archive, e))?;
    let mut zip = ZipArchive::new(file).map_err(|e| ArchiveError::corrupt(archive, e))?;
    fs::create_dir_all(out_dir).map_err(|e| ArchiveError::io(out_dir, e))?;

    let mut written: Vec<PathBuf> = Vec::new();
    let result = extract_members(&mut zip, archive, out_dir, max_bytes, &mut written);

    if result.is_err() {
        for member in &written {
            let _ = fs::remove_file(out_dir.join(member));
        }
    }
    result.map(|()| written)
}

fn extract_members(
    zip: &mut ZipArchive<File>,
    archive: &Path,
    out_dir: &Path,
    max_bytes: u64,
    written: &mut Vec<PathBuf>,
) -> Result<(), ArchiveError> {
    let mut total: u64 = 0;

    for index in 0..zip.len() {
        let mut entry = zip
            .by_index(index)
            .map_err(|e| ArchiveError::corrupt(archive, e))?;

        let Some(relative) = entry.enclosed_name() else {
            warn!(member = entry.name(), "skipping archive member outside output directory");
            continue;
        };
        let target = out_dir.join(&relative);

        if entry.is_dir() {
            fs::create_dir_all(&target).map_err(|e| ArchiveError::io(&target, e))?;
            continue;
        }

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|e| ArchiveError::io(parent, e))?;
        }

        let remaining = max_bytes.saturating_sub(total);
        let mut out = File::create(&target).map_err(|e| ArchiveError::io(&target, e))?;
        written.push(relative.clone());

        // Read one byte past the budget so an overflow is detectable.
        let copied = io::copy(&mut (&mut entry).take(remaining.saturating_add(1)), &mut out)
            .map_err(|e| ArchiveError::io(&target, e))?;
        total = total.saturating_add(copied);
        if total > max_bytes {
            return Err(ArchiveError::too_large(archive, max_bytes));
        }

        debug!(member = %relative.display(), bytes = copied, "extracted member");
    }

    Ok(())
}
