//! Joining cut segments into the final output.

use crate::artifact::{ArtifactSet, TempArtifact};
use crate::transform::MediaTransform;
use crate::{Error, Result};
use chrono::{DateTime, Local};
use segtrim_common::paths::sanitize_stem;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

const MAX_NAME_ATTEMPTS: u32 = 10_000;

/// Name of a final output file: `{stem}_{YYYYmmdd_HHMMSS}.{ext}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputName {
    stem: String,
    timestamp: String,
    extension: String,
}

impl OutputName {
    /// Build the name from the user-supplied original file name.
    ///
    /// ```
    /// use chrono::{Local, TimeZone};
    /// use segtrim_av::OutputName;
    ///
    /// let at = Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
    /// let name = OutputName::new("holiday clip.mov", "mp4", at);
    /// assert_eq!(name.file_name(), "holiday_clip_20240309_140507.mp4");
    /// ```
    pub fn new(original_name: &str, extension: &str, at: DateTime<Local>) -> Self {
        Self {
            stem: sanitize_stem(original_name),
            timestamp: at.format("%Y%m%d_%H%M%S").to_string(),
            extension: extension.trim_start_matches('.').to_string(),
        }
    }

    /// The file name without any directory.
    pub fn file_name(&self) -> String {
        format!("{}_{}.{}", self.stem, self.timestamp, self.extension)
    }

    /// Claim a fresh output file in `dir`.
    ///
    /// The file is created empty with `create_new`, so two jobs for the same
    /// name in the same second get `_1`, `_2`, ... instead of sharing a path.
    /// The returned artifact owns the reservation; dropping it removes the
    /// file.
    pub fn reserve_in(&self, dir: &Path) -> Result<TempArtifact> {
        for n in 0..MAX_NAME_ATTEMPTS {
            let path = dir.join(self.candidate(n));
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(_) => return Ok(TempArtifact::adopt(path)),
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e.into()),
            }
        }

        Err(Error::Io(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!(
                "no free output name for {} in {}",
                self.file_name(),
                dir.display()
            ),
        )))
    }

    fn candidate(&self, n: u32) -> String {
        if n == 0 {
            self.file_name()
        } else {
            format!("{}_{}_{}.{}", self.stem, self.timestamp, n, self.extension)
        }
    }
}

/// Body of an ffmpeg concat demuxer list.
///
/// Single quotes inside a path are closed, escaped and reopened.
pub fn manifest_contents<P: AsRef<Path>>(segments: &[P]) -> String {
    segments
        .iter()
        .map(|p| {
            let path = p.as_ref().display().to_string().replace('\'', r"'\''");
            format!("file '{path}'\n")
        })
        .collect()
}

/// ffmpeg arguments for joining via a manifest with stream copy.
pub fn concat_args(manifest: &Path, output: &Path) -> Vec<String> {
    vec![
        "-y".to_string(),
        "-f".to_string(),
        "concat".to_string(),
        "-safe".to_string(),
        "0".to_string(),
        "-i".to_string(),
        manifest.display().to_string(),
        "-c".to_string(),
        "copy".to_string(),
        output.display().to_string(),
    ]
}

/// Joins segments with the concat demuxer.
pub struct Concatenator<'a> {
    transform: &'a dyn MediaTransform,
    scratch: &'a Path,
}

impl<'a> Concatenator<'a> {
    pub fn new(transform: &'a dyn MediaTransform, scratch: &'a Path) -> Self {
        Self { transform, scratch }
    }

    /// Join `segments`, in order, into the reserved `output`.
    ///
    /// The manifest is tracked in `artifacts` so the caller's cleanup removes
    /// it. If joining fails, `output` is dropped and the reservation or any
    /// partial file goes with it.
    pub fn concatenate<P: AsRef<Path>>(
        &self,
        segments: &[P],
        output: TempArtifact,
        artifacts: &mut ArtifactSet,
    ) -> Result<PathBuf> {
        if segments.is_empty() {
            return Err(Error::invalid_parameters("no segments to join"));
        }

        let wrap = |e: Error| Error::Concat {
            message: e.diagnostic(),
        };

        let manifest = artifacts
            .create(self.scratch, "segtrim-list-", ".txt")
            .map_err(wrap)?;
        std::fs::File::create(&manifest)
            .and_then(|mut f| f.write_all(manifest_contents(segments).as_bytes()))
            .map_err(|e| wrap(Error::Io(e)))?;

        tracing::debug!(
            "Joining {} segments into {}",
            segments.len(),
            output.path().display()
        );
        self.transform
            .run(&concat_args(&manifest, output.path()))
            .map_err(wrap)?;

        Ok(output.persist())
    }
}
