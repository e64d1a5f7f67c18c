//! Temporary artifact lifecycle.
//!
//! A [`TempArtifact`] owns exactly one file on disk and deletes it when
//! released or dropped. An [`ArtifactSet`] collects the artifacts of one job
//! (uploaded source, cut windows, concat manifest) and releases all of them on
//! every exit path. Release failures are logged and never escalated, so a
//! failed delete can neither hide the job's own outcome nor stop the remaining
//! deletes.

use crate::Result;
use std::io;
use std::path::{Path, PathBuf};

/// Handle owning one temporary file.
///
/// Releasing is idempotent: once released the handle never touches the
/// filesystem again, even if a new file later appears at the same path.
#[derive(Debug)]
pub struct TempArtifact {
    path: PathBuf,
    released: bool,
}

impl TempArtifact {
    /// Create a new, empty, uniquely named file in `dir`.
    ///
    /// The name is `<prefix><random><suffix>`.
    pub fn create_in(dir: &Path, prefix: &str, suffix: &str) -> Result<Self> {
        let path = tempfile::Builder::new()
            .prefix(prefix)
            .suffix(suffix)
            .tempfile_in(dir)?
            .into_temp_path()
            .keep()
            .map_err(|e| e.error)?;

        Ok(Self::adopt(path))
    }

    /// Take ownership of an existing path.
    pub fn adopt(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            released: false,
        }
    }

    /// Path of the owned file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the file has already been released.
    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Delete the file.
    ///
    /// A file that is already gone counts as released. Calling this again
    /// after it succeeded is a no-op.
    pub fn release(&mut self) -> io::Result<()> {
        if self.released {
            return Ok(());
        }

        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                self.released = true;
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                self.released = true;
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Stop owning the file and return its path.
    ///
    /// The file is left on disk; this is how the final output leaves the
    /// lifecycle manager's control.
    pub fn persist(mut self) -> PathBuf {
        self.released = true;
        std::mem::take(&mut self.path)
    }
}

impl Drop for TempArtifact {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            tracing::warn!("Failed to remove temporary file {}: {}", self.path.display(), e);
        }
    }
}

/// Outcome of [`ArtifactSet::release_all`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReleaseSummary {
    /// Artifacts deleted (or already gone).
    pub released: usize,
    /// Artifacts whose deletion failed.
    pub failed: usize,
}

/// All temporary artifacts owned by one job.
#[derive(Debug, Default)]
pub struct ArtifactSet {
    artifacts: Vec<TempArtifact>,
}

impl ArtifactSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new temp file in `dir` and track it.
    ///
    /// Returns the path of the new file.
    pub fn create(&mut self, dir: &Path, prefix: &str, suffix: &str) -> Result<PathBuf> {
        let artifact = TempArtifact::create_in(dir, prefix, suffix)?;
        let path = artifact.path().to_path_buf();
        self.artifacts.push(artifact);
        Ok(path)
    }

    /// Track an existing path.
    pub fn adopt(&mut self, path: impl Into<PathBuf>) {
        self.artifacts.push(TempArtifact::adopt(path));
    }

    /// Track an artifact created elsewhere.
    pub fn track(&mut self, artifact: TempArtifact) {
        self.artifacts.push(artifact);
    }

    /// Paths of all tracked artifacts, in tracking order.
    pub fn paths(&self) -> Vec<&Path> {
        self.artifacts.iter().map(TempArtifact::path).collect()
    }

    /// Number of tracked artifacts.
    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    /// Whether nothing is tracked.
    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }

    /// Release every tracked artifact.
    ///
    /// Each release is attempted independently; failures are logged and
    /// counted. Safe to call more than once.
    pub fn release_all(&mut self) -> ReleaseSummary {
        let mut summary = ReleaseSummary::default();

        for artifact in &mut self.artifacts {
            if artifact.is_released() {
                continue;
            }
            match artifact.release() {
                Ok(()) => summary.released += 1,
                Err(e) => {
                    summary.failed += 1;
                    tracing::warn!(
                        "Failed to remove temporary file {}: {}",
                        artifact.path().display(),
                        e
                    );
                }
            }
        }

        if summary.failed > 0 {
            tracing::warn!(
                "Cleanup finished with {} of {} temporary files left behind",
                summary.failed,
                summary.released + summary.failed
            );
        } else if summary.released > 0 {
            tracing::debug!("Removed {} temporary files", summary.released);
        }

        summary
    }
}

impl Drop for ArtifactSet {
    fn drop(&mut self) {
        self.release_all();
    }
}
