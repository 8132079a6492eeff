//! Filesystem lifecycle for downloaded archives and their extracted members.
//!
//! Every analysis job works inside its own [`JobDir`], which is removed when
//! dropped. Archives that produced a profile are moved out to the archive
//! directory first by [`FileLifecycle::archive`].

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::{debug, info, warn};

/// Keeps or discards files once a job is done with them.
#[derive(Debug, Clone)]
pub struct FileLifecycle {
    archive_dir: PathBuf,
}

impl FileLifecycle {
    #[must_use]
    pub fn new(archive_dir: impl Into<PathBuf>) -> Self {
        Self {
            archive_dir: archive_dir.into(),
        }
    }

    /// Moves `file` into the archive directory, returning its new path.
    ///
    /// Falls back to copy-then-remove when a rename is not possible (e.g.
    /// across filesystems). If a file with the same name is already archived
    /// the move is skipped. Failures are logged, never returned.
    pub fn archive(&self, file: &Path) -> Option<PathBuf> {
        let Some(name) = file.file_name() else {
            warn!(path = %file.display(), "cannot archive a path without a file name");
            return None;
        };

        if let Err(error) = fs::create_dir_all(&self.archive_dir) {
            warn!(dir = %self.archive_dir.display(), error = %error, "cannot create archive directory");
            return None;
        }

        let destination = self.archive_dir.join(name);
        if destination.exists() {
            warn!(
                destination = %destination.display(),
                "archive destination already exists; keeping the existing file"
            );
            return None;
        }

        match move_file(file, &destination) {
            Ok(()) => {
                info!(from = %file.display(), to = %destination.display(), "archived profile file");
                Some(destination)
            }
            Err(error) => {
                warn!(path = %file.display(), error = %error, "failed to archive file");
                None
            }
        }
    }

    /// Removes `file`, logging anything other than "not found".
    pub fn discard(&self, file: &Path) {
        match fs::remove_file(file) {
            Ok(()) => debug!(path = %file.display(), "discarded file"),
            Err(error) if error.kind() == io::ErrorKind::NotFound => {}
            Err(error) => warn!(path = %file.display(), error = %error, "failed to discard file"),
        }
    }
}

fn move_file(from: &Path, to: &Path) -> io::Result<()> {
    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(rename_error) => {
            debug!(error = %rename_error, "rename failed, copying instead");
            fs::copy(from, to)?;
            if let Err(error) = fs::remove_file(from) {
                // Leave one copy only.
                let _ = fs::remove_file(to);
                return Err(error);
            }
            Ok(())
        }
    }
}

/// A per-job working directory, removed with everything in it on drop.
#[derive(Debug)]
pub struct JobDir {
    dir: TempDir,
}

impl JobDir {
    /// Creates `job-XXXX` under `download_root`, creating the root if needed.
    ///
    /// # Errors
    ///
    /// Returns the IO error when the root or job directory cannot be created.
    pub fn create(download_root: &Path) -> io::Result<Self> {
        fs::create_dir_all(download_root)?;
        let dir = tempfile::Builder::new()
            .prefix("job-")
            .tempdir_in(download_root)?;
        debug!(path = %dir.path().display(), "created job directory");
        Ok(Self { dir })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Where archive members are unpacked.
    #[must_use]
    pub fn extract_dir(&self) -> PathBuf {
        self.dir.path().join("extracted")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_archive_moves_file_and_creates_dir() {
        let root = TempDir::new().unwrap();
        let source = root.path().join("p.zip");
        fs::write(&source, b"zip").unwrap();
        let lifecycle = FileLifecycle::new(root.path().join("archives"));

        let archived = lifecycle.archive(&source).unwrap();

        assert_eq!(archived, root.path().join("archives/p.zip"));
        assert!(!source.exists());
        assert_eq!(fs::read(archived).unwrap(), b"zip");
    }

    #[test]
    fn test_archive_skips_existing_destination() {
        let root = TempDir::new().unwrap();
        let archives = root.path().join("archives");
        fs::create_dir_all(&archives).unwrap();
        fs::write(archives.join("p.zip"), b"old").unwrap();
        let source = root.path().join("p.zip");
        fs::write(&source, b"new").unwrap();

        assert!(FileLifecycle::new(&archives).archive(&source).is_none());
        assert_eq!(fs::read(archives.join("p.zip")).unwrap(), b"old");
        assert!(source.exists(), "source is left for the job directory to clean up");
    }

    #[test]
    fn test_archive_missing_source_returns_none() {
        let root = TempDir::new().unwrap();
        let lifecycle = FileLifecycle::new(root.path().join("archives"));
        assert!(lifecycle.archive(&root.path().join("nope.zip")).is_none());
    }

    #[test]
    fn test_discard_removes_and_tolerates_missing() {
        let root = TempDir::new().unwrap();
        let file = root.path().join("x.xml");
        fs::write(&file, b"x").unwrap();
        let lifecycle = FileLifecycle::new(root.path());

        lifecycle.discard(&file);
        assert!(!file.exists());
        lifecycle.discard(&file);
    }

    #[test]
    fn test_job_dir_removed_on_drop() {
        let root = TempDir::new().unwrap();
        let downloads = root.path().join("downloads");
        let path = {
            let job = JobDir::create(&downloads).unwrap();
            fs::create_dir_all(job.extract_dir()).unwrap();
            fs::write(job.extract_dir().join("leftover.xml"), b"x").unwrap();
            assert!(
                job.path()
                    .file_name()
                    .unwrap()
                    .to_string_lossy()
                    .starts_with("job-")
            );
            job.path().to_path_buf()
        };
        assert!(!path.exists());
        assert!(downloads.exists());
    }

    #[test]
    fn test_job_dirs_are_distinct() {
        let root = TempDir::new().unwrap();
        let a = JobDir::create(root.path()).unwrap();
        let b = JobDir::create(root.path()).unwrap();
        assert_ne!(a.path(), b.path());
    }
}
