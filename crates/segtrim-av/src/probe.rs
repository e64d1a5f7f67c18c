//! Duration probing.
//!
//! Only the container's total duration matters to a job, so the probe asks
//! ffprobe for exactly `format=duration` in bare-value form instead of parsing
//! full stream JSON.

use crate::command::ToolCommand;
use crate::{Error, Result};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// Total playable duration of a media file, in seconds.
///
/// Always finite and non-negative.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct MediaDuration(f64);

impl MediaDuration {
    /// Create a duration from seconds.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Probe`] for negative, NaN or infinite values.
    pub fn from_secs(secs: f64) -> Result<Self> {
        if !secs.is_finite() || secs < 0.0 {
            return Err(Error::probe(format!("invalid duration: {secs}")));
        }
        Ok(Self(secs))
    }

    /// Duration in seconds.
    pub fn as_secs(&self) -> f64 {
        self.0
    }
}

impl fmt::Display for MediaDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}s", self.0)
    }
}

/// Capability to determine the duration of a media file.
pub trait DurationProbe: Send + Sync {
    /// Return the total duration of the file at `path`.
    fn probe(&self, path: &Path) -> Result<MediaDuration>;
}

/// [`DurationProbe`] backed by the ffprobe CLI.
#[derive(Debug, Clone)]
pub struct FfprobeProber {
    program: PathBuf,
}

impl FfprobeProber {
    /// Use the given ffprobe executable.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Arguments passed to ffprobe for `path`.
    pub fn args(path: &Path) -> Vec<String> {
        vec![
            "-v".to_string(),
            "error".to_string(),
            "-show_entries".to_string(),
            "format=duration".to_string(),
            "-of".to_string(),
            "default=noprint_wrappers=1:nokey=1".to_string(),
            path.display().to_string(),
        ]
    }
}

impl Default for FfprobeProber {
    fn default() -> Self {
        Self::new("ffprobe")
    }
}

impl DurationProbe for FfprobeProber {
    fn probe(&self, path: &Path) -> Result<MediaDuration> {
        if !path.exists() {
            return Err(Error::file_not_found(path));
        }

        let output = ToolCommand::new(self.program.clone())
            .args(Self::args(path))
            .execute()
            .map_err(|e| match e {
                Error::ToolFailed { message, .. } => Error::probe(message),
                other => Error::probe(other.to_string()),
            })?;

        let duration = parse_duration(&output.stdout)?;
        tracing::debug!("Probed {}: {}", path.display(), duration);
        Ok(duration)
    }
}

/// Parse ffprobe's bare `format=duration` output.
///
/// ffprobe prints `N/A` for streams without a known duration; that is
/// reported as a probe failure like any other non-numeric output.
pub fn parse_duration(stdout: &str) -> Result<MediaDuration> {
    let value = stdout
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .ok_or_else(|| Error::probe("ffprobe produced no output"))?;

    let secs: f64 = value
        .parse()
        .map_err(|_| Error::probe(format!("non-numeric duration: {value:?}")))?;

    MediaDuration::from_secs(secs)
}
