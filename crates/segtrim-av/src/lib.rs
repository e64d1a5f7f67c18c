//! # segtrim-av
//!
//! The segment/trim/concat engine.
//!
//! This crate provides functionality for:
//! - Probing the total duration of a media file (ffprobe)
//! - Planning fixed-stride windows with a trailing removal interval
//! - Cutting each window with a fixed codec pair (ffmpeg re-encode)
//! - Joining the cuts in order with a stream-copy concat
//! - Releasing every temporary file a job created, on every exit path
//!
//! ## Features
//!
//! - `testing` - Scripted stand-ins for ffprobe/ffmpeg, for tests that must
//!   not depend on installed tools
//!
//! ## Example
//!
//! ```no_run
//! use segtrim_av::{
//!     CancelToken, FfmpegTransform, FfprobeProber, JobOutcome, JobPaths, JobRequest,
//!     ProcessingOptions, SegmentJob, SegmentParams,
//! };
//! use std::sync::Arc;
//!
//! let job = SegmentJob::new(
//!     Arc::new(FfprobeProber::default()),
//!     Arc::new(FfmpegTransform::default()),
//!     ProcessingOptions::default(),
//!     JobPaths::new("output"),
//! );
//! let params = SegmentParams::new(30, 5)?;
//! let run = job.run(
//!     JobRequest::borrowed("/videos/talk.mp4", "talk.mp4", params),
//!     &CancelToken::new(),
//! );
//! if let JobOutcome::Produced { output, .. } = run.result? {
//!     println!("Wrote {}", output.display());
//! }
//! # Ok::<(), segtrim_av::Error>(())
//! ```

pub mod artifact;
mod command;
pub mod concat;
pub mod cut;
mod error;
pub mod job;
pub mod plan;
pub mod probe;
pub mod tools;
pub mod transform;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

// Re-exports
pub use artifact::{ArtifactSet, ReleaseSummary, TempArtifact};
pub use command::{ToolCommand, ToolOutput};
pub use concat::{Concatenator, OutputName};
pub use cut::{CodecPair, Cutter};
pub use error::{Error, Result};
pub use job::{
    CancelToken, JobOutcome, JobPaths, JobReport, JobRequest, JobRun, JobSource, JobState,
    ProcessingOptions, SegmentJob,
};
pub use plan::{plan, PlanWindow, SegmentParams, SegmentPlan};
pub use probe::{DurationProbe, FfprobeProber, MediaDuration};
pub use tools::{check_tool, check_tool_at, get_tool_path, require_tool, resolve_tool, ToolInfo};
pub use transform::{FfmpegTransform, MediaTransform};
