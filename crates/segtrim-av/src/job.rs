//! Job orchestration.
//!
//! A [`SegmentJob`] drives one request through
//! `Received → Probing → Planning → Cutting(i) → Concatenating` and ends in
//! `Finalized`, `NoOutput` or `Failed`. Whatever the ending, every temporary
//! artifact the job acquired is released before [`SegmentJob::run`] returns.
//! Only the final output survives.

use crate::artifact::{ArtifactSet, ReleaseSummary, TempArtifact};
use crate::concat::{Concatenator, OutputName};
use crate::cut::{CodecPair, Cutter};
use crate::plan::{SegmentParams, SegmentPlan};
use crate::probe::{DurationProbe, MediaDuration};
use crate::transform::MediaTransform;
use crate::{Error, Result};
use chrono::Local;
use rayon::prelude::*;
use segtrim_common::JobId;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Where a job is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum JobState {
    Received,
    Probing,
    Planning,
    Cutting { index: usize, total: usize },
    Concatenating,
    Finalized,
    NoOutput,
    Failed,
}

impl JobState {
    /// Whether the job has ended.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finalized | Self::NoOutput | Self::Failed)
    }
}

/// The source file of a job.
#[derive(Debug)]
pub enum JobSource {
    /// An upload owned by the job; deleted during cleanup.
    Owned(TempArtifact),
    /// A file owned by someone else; never touched.
    Borrowed(PathBuf),
}

impl JobSource {
    fn path(&self) -> &Path {
        match self {
            Self::Owned(artifact) => artifact.path(),
            Self::Borrowed(path) => path,
        }
    }
}

/// Input to one job.
#[derive(Debug)]
pub struct JobRequest {
    pub id: JobId,
    pub source: JobSource,
    /// Name the user knows the file by; the output name is derived from it.
    pub original_name: String,
    pub params: SegmentParams,
}

impl JobRequest {
    /// A job over an uploaded file that is deleted once the job ends.
    pub fn owned(upload: TempArtifact, original_name: impl Into<String>, params: SegmentParams) -> Self {
        Self {
            id: JobId::new(),
            source: JobSource::Owned(upload),
            original_name: original_name.into(),
            params,
        }
    }

    /// A job over a file that is left in place.
    pub fn borrowed(path: impl Into<PathBuf>, original_name: impl Into<String>, params: SegmentParams) -> Self {
        Self {
            id: JobId::new(),
            source: JobSource::Borrowed(path.into()),
            original_name: original_name.into(),
            params,
        }
    }

    /// Use a caller-chosen job ID, e.g. one already shown to a client.
    pub fn with_id(mut self, id: JobId) -> Self {
        self.id = id;
        self
    }
}

/// Encoding and scheduling options shared by all jobs.
#[derive(Debug, Clone)]
pub struct ProcessingOptions {
    pub codecs: CodecPair,
    /// Extension of segment and output files, without the dot.
    pub output_extension: String,
    /// Cuts run at once. 1 keeps the job strictly sequential.
    pub parallel_cuts: usize,
}

impl Default for ProcessingOptions {
    fn default() -> Self {
        Self {
            codecs: CodecPair::default(),
            output_extension: "mp4".to_string(),
            parallel_cuts: 1,
        }
    }
}

/// Directories a job writes to.
#[derive(Debug, Clone)]
pub struct JobPaths {
    /// Final outputs land here.
    pub output_dir: PathBuf,
    /// Parent of per-job scratch directories; the system temp dir if unset.
    pub scratch_root: Option<PathBuf>,
}

impl JobPaths {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            scratch_root: None,
        }
    }

    pub fn with_scratch_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.scratch_root = Some(root.into());
        self
    }
}

/// Successful end of a job.
#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome {
    /// The joined output, now outside the job's control.
    Produced { output: PathBuf, segments: usize },
    /// Every window was too short to survive removal.
    NoOutput,
}

/// What happened during a job, for logs and the stats API.
#[derive(Debug, Clone, Serialize)]
pub struct JobReport {
    pub id: JobId,
    pub original_name: String,
    pub transitions: Vec<JobState>,
    pub duration: Option<MediaDuration>,
    pub plan: Option<SegmentPlan>,
    #[serde(serialize_with = "serialize_millis")]
    pub elapsed: Duration,
    #[serde(skip)]
    pub cleanup: ReleaseSummary,
}

impl JobReport {
    /// Last recorded state.
    pub fn final_state(&self) -> JobState {
        self.transitions
            .last()
            .copied()
            .unwrap_or(JobState::Received)
    }
}

fn serialize_millis<S: serde::Serializer>(d: &Duration, s: S) -> std::result::Result<S::Ok, S::Error> {
    s.serialize_u64(d.as_millis() as u64)
}

/// Result of [`SegmentJob::run`]: the outcome and the report, always both.
#[derive(Debug)]
pub struct JobRun {
    pub result: Result<JobOutcome>,
    pub report: JobReport,
}

/// Cooperative cancellation flag, checked between stages and windows.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(Error::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Records state transitions; shared with cut workers in parallel mode.
struct Transitions {
    id: JobId,
    states: Mutex<Vec<JobState>>,
}

impl Transitions {
    fn new(id: JobId) -> Self {
        Self {
            id,
            states: Mutex::new(vec![JobState::Received]),
        }
    }

    fn push(&self, state: JobState) {
        tracing::debug!(job = %self.id.short(), ?state, "Job state changed");
        self.states
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(state);
    }

    fn into_inner(self) -> Vec<JobState> {
        self.states.into_inner().unwrap_or_else(|e| e.into_inner())
    }
}

/// Runs segment/trim jobs with a fixed probe, transform and configuration.
///
/// Holds no per-job state, so one instance can run many jobs at once.
pub struct SegmentJob {
    prober: Arc<dyn DurationProbe>,
    transform: Arc<dyn MediaTransform>,
    options: ProcessingOptions,
    paths: JobPaths,
}

impl SegmentJob {
    pub fn new(
        prober: Arc<dyn DurationProbe>,
        transform: Arc<dyn MediaTransform>,
        options: ProcessingOptions,
        paths: JobPaths,
    ) -> Self {
        Self {
            prober,
            transform,
            options,
            paths,
        }
    }

    pub fn options(&self) -> &ProcessingOptions {
        &self.options
    }

    pub fn paths(&self) -> &JobPaths {
        &self.paths
    }

    /// Run one job to completion. Blocks until every external tool exits.
    pub fn run(&self, request: JobRequest, cancel: &CancelToken) -> JobRun {
        let started = Instant::now();
        let JobRequest {
            id,
            source,
            original_name,
            params,
        } = request;
        let transitions = Transitions::new(id);

        tracing::info!(
            job = %id.short(),
            "Starting job for {} (segment {}s, removal {}s)",
            original_name,
            params.segment_length(),
            params.removal_interval()
        );

        let mut artifacts = ArtifactSet::new();
        let source_path = source.path().to_path_buf();
        if let JobSource::Owned(upload) = source {
            artifacts.track(upload);
        }

        let mut duration = None;
        let mut plan = None;

        let result = self.scratch_dir(&id).and_then(|scratch| {
            let result = self.execute(
                &source_path,
                &original_name,
                &params,
                scratch.path(),
                &mut artifacts,
                &transitions,
                cancel,
                &mut duration,
                &mut plan,
            );
            // Segment and manifest files live in scratch; release them first.
            artifacts.release_all();
            if let Err(e) = scratch.close() {
                tracing::warn!(job = %id.short(), "Failed to remove scratch directory: {}", e);
            }
            result
        });

        let cleanup = artifacts.release_all();

        match &result {
            Ok(JobOutcome::Produced { output, segments }) => {
                transitions.push(JobState::Finalized);
                tracing::info!(
                    job = %id.short(),
                    "Joined {} segments into {}",
                    segments,
                    output.display()
                );
            }
            Ok(JobOutcome::NoOutput) => {
                transitions.push(JobState::NoOutput);
                tracing::info!(job = %id.short(), "No segments survived removal");
            }
            Err(e) => {
                transitions.push(JobState::Failed);
                tracing::error!(job = %id.short(), stage = e.stage(), "Job failed: {}", e);
            }
        }

        JobRun {
            result,
            report: JobReport {
                id,
                original_name,
                transitions: transitions.into_inner(),
                duration,
                plan,
                elapsed: started.elapsed(),
                cleanup,
            },
        }
    }

    fn scratch_dir(&self, id: &JobId) -> Result<tempfile::TempDir> {
        let prefix = format!("segtrim-job-{}-", id.short());
        let mut builder = tempfile::Builder::new();
        builder.prefix(&prefix);
        let dir = match &self.paths.scratch_root {
            Some(root) => {
                std::fs::create_dir_all(root)?;
                builder.tempdir_in(root)?
            }
            None => builder.tempdir()?,
        };
        Ok(dir)
    }

    #[allow(clippy::too_many_arguments)]
    fn execute(
        &self,
        source: &Path,
        original_name: &str,
        params: &SegmentParams,
        scratch: &Path,
        artifacts: &mut ArtifactSet,
        transitions: &Transitions,
        cancel: &CancelToken,
        duration_out: &mut Option<MediaDuration>,
        plan_out: &mut Option<SegmentPlan>,
    ) -> Result<JobOutcome> {
        cancel.check()?;
        transitions.push(JobState::Probing);
        let duration = self.prober.probe(source)?;
        *duration_out = Some(duration);

        cancel.check()?;
        transitions.push(JobState::Planning);
        let plan = SegmentPlan::build(duration, params)?;
        *plan_out = Some(plan.clone());
        tracing::debug!(
            "Planned {} windows over {} ({:.3}s kept)",
            plan.len(),
            duration,
            plan.total_cut_length()
        );

        if plan.is_empty() {
            return Ok(JobOutcome::NoOutput);
        }

        let segments = if self.options.parallel_cuts > 1 {
            self.cut_parallel(source, &plan, scratch, artifacts, transitions, cancel)?
        } else {
            self.cut_sequential(source, &plan, scratch, artifacts, transitions, cancel)?
        };

        cancel.check()?;
        transitions.push(JobState::Concatenating);
        std::fs::create_dir_all(&self.paths.output_dir)?;
        let output = OutputName::new(original_name, &self.options.output_extension, Local::now())
            .reserve_in(&self.paths.output_dir)?;

        let output = Concatenator::new(self.transform.as_ref(), scratch)
            .concatenate(&segments, output, artifacts)?;

        Ok(JobOutcome::Produced {
            output,
            segments: segments.len(),
        })
    }

    fn cutter<'a>(&'a self, scratch: &'a Path) -> Cutter<'a> {
        Cutter::new(
            self.transform.as_ref(),
            &self.options.codecs,
            scratch,
            &self.options.output_extension,
        )
    }

    fn cut_sequential(
        &self,
        source: &Path,
        plan: &SegmentPlan,
        scratch: &Path,
        artifacts: &mut ArtifactSet,
        transitions: &Transitions,
        cancel: &CancelToken,
    ) -> Result<Vec<PathBuf>> {
        let cutter = self.cutter(scratch);
        let mut segments = Vec::with_capacity(plan.len());

        for window in plan.windows() {
            cancel.check()?;
            transitions.push(JobState::Cutting {
                index: window.index,
                total: plan.len(),
            });
            let artifact = cutter.cut(source, window)?;
            segments.push(artifact.path().to_path_buf());
            artifacts.track(artifact);
        }

        Ok(segments)
    }

    fn cut_parallel(
        &self,
        source: &Path,
        plan: &SegmentPlan,
        scratch: &Path,
        artifacts: &mut ArtifactSet,
        transitions: &Transitions,
        cancel: &CancelToken,
    ) -> Result<Vec<PathBuf>> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.options.parallel_cuts)
            .thread_name(|i| format!("segtrim-cut-{i}"))
            .build()
            .map_err(|e| Error::Io(std::io::Error::other(e)))?;

        let cutter = self.cutter(scratch);
        let failed = AtomicBool::new(false);
        let total = plan.len();

        // Indexed collect keeps results in window order.
        let results: Vec<Result<Option<TempArtifact>>> = pool.install(|| {
            plan.windows()
                .par_iter()
                .map(|window| {
                    if cancel.is_cancelled() || failed.load(Ordering::SeqCst) {
                        return Ok(None);
                    }
                    transitions.push(JobState::Cutting {
                        index: window.index,
                        total,
                    });
                    let result = cutter.cut(source, window);
                    if result.is_err() {
                        failed.store(true, Ordering::SeqCst);
                    }
                    result.map(Some)
                })
                .collect()
        });

        let mut segments = Vec::with_capacity(total);
        let mut first_error = None;
        for result in results {
            match result {
                Ok(Some(artifact)) => {
                    segments.push(artifact.path().to_path_buf());
                    artifacts.track(artifact);
                }
                Ok(None) => {}
                Err(e) => {
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
            }
        }

        if let Some(e) = first_error {
            return Err(e);
        }
        cancel.check()?;
        Ok(segments)
    }
}
