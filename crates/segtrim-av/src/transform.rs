//! The media transform capability.
//!
//! Cutting and joining both run ffmpeg with a different argument list. Jobs
//! only see this trait, so tests can substitute a scripted transform that
//! never spawns a process.

use crate::command::{ToolCommand, ToolOutput};
use crate::Result;
use std::path::{Path, PathBuf};

/// Capability to run one media transformation.
pub trait MediaTransform: Send + Sync {
    /// Run the transformation with the given arguments.
    ///
    /// The last argument is always the output path.
    fn run(&self, args: &[String]) -> Result<ToolOutput>;
}

/// [`MediaTransform`] backed by the ffmpeg CLI.
#[derive(Debug, Clone)]
pub struct FfmpegTransform {
    program: PathBuf,
}

impl FfmpegTransform {
    /// Use the given ffmpeg executable.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// The executable this transform runs.
    pub fn program(&self) -> &Path {
        &self.program
    }
}

impl Default for FfmpegTransform {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

impl MediaTransform for FfmpegTransform {
    fn run(&self, args: &[String]) -> Result<ToolOutput> {
        ToolCommand::new(self.program.clone())
            .args(args.iter().cloned())
            .execute()
    }
}
