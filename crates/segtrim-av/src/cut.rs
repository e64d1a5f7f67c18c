//! Cutting one plan window into its own file.
//!
//! Cuts are re-encoded rather than stream-copied, so every segment starts on
//! a keyframe and shares codec parameters with its siblings. That is what
//! makes the later stream-copy concat safe.

use crate::artifact::TempArtifact;
use crate::plan::PlanWindow;
use crate::transform::MediaTransform;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Prefix for cut segment file names.
pub const SEGMENT_PREFIX: &str = "segtrim-seg-";

/// Video and audio encoders used when cutting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodecPair {
    pub video: String,
    pub audio: String,
}

impl Default for CodecPair {
    fn default() -> Self {
        Self {
            video: "libx264".to_string(),
            audio: "aac".to_string(),
        }
    }
}

/// Cuts windows of one input into temp files in a scratch directory.
pub struct Cutter<'a> {
    transform: &'a dyn MediaTransform,
    codecs: &'a CodecPair,
    scratch: &'a Path,
    extension: &'a str,
}

impl<'a> Cutter<'a> {
    pub fn new(
        transform: &'a dyn MediaTransform,
        codecs: &'a CodecPair,
        scratch: &'a Path,
        extension: &'a str,
    ) -> Self {
        Self {
            transform,
            codecs,
            scratch,
            extension,
        }
    }

    /// Cut `window` out of `input`.
    ///
    /// The returned artifact owns the segment file. On failure any partial
    /// output has already been removed.
    pub fn cut(&self, input: &Path, window: &PlanWindow) -> Result<TempArtifact> {
        let wrap = |e: Error| Error::Cut {
            index: window.index,
            start: window.start,
            message: e.diagnostic(),
        };

        let prefix = format!("{}{:04}-", SEGMENT_PREFIX, window.index);
        let suffix = format!(".{}", self.extension);
        let artifact = TempArtifact::create_in(self.scratch, &prefix, &suffix).map_err(wrap)?;

        let args = cut_args(input, window, self.codecs, artifact.path());
        tracing::debug!(
            "Cutting window {} ({}s + {}s) to {}",
            window.index,
            fmt_seconds(window.start),
            fmt_seconds(window.cut_length),
            artifact.path().display()
        );

        // Dropping `artifact` on the error path removes the partial file.
        self.transform.run(&args).map_err(wrap)?;
        Ok(artifact)
    }
}

/// ffmpeg arguments for cutting one window.
///
/// Seeking is placed before `-i` for input-side seeking.
pub fn cut_args(input: &Path, window: &PlanWindow, codecs: &CodecPair, output: &Path) -> Vec<String> {
    vec![
        "-y".to_string(),
        "-ss".to_string(),
        fmt_seconds(window.start),
        "-t".to_string(),
        fmt_seconds(window.cut_length),
        "-i".to_string(),
        input.display().to_string(),
        "-c:v".to_string(),
        codecs.video.clone(),
        "-c:a".to_string(),
        codecs.audio.clone(),
        output.display().to_string(),
    ]
}

/// Format seconds for the command line with microsecond precision.
///
/// A positive value never prints as `0`; anything below a microsecond falls
/// back to the full decimal representation.
///
/// ```
/// use segtrim_av::cut::fmt_seconds;
///
/// assert_eq!(fmt_seconds(30.0), "30");
/// assert_eq!(fmt_seconds(0.5), "0.5");
/// assert_eq!(fmt_seconds(12.3456), "12.3456");
/// assert_eq!(fmt_seconds(0.0004), "0.0004");
/// ```
pub fn fmt_seconds(secs: f64) -> String {
    let s = format!("{secs:.6}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s.is_empty() || s == "-" || s == "-0" || s == "0" {
        if secs > 0.0 {
            secs.to_string()
        } else {
            "0".to_string()
        }
    } else {
        s.to_string()
    }
}
