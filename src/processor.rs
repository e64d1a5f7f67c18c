//! Runs segment jobs on behalf of the HTTP layer and the CLI.

use crate::config::Config;
use crate::state::{AppState, JobRecord};
use segtrim_av::{
    resolve_tool, CancelToken, DurationProbe, FfmpegTransform, FfprobeProber, JobPaths, JobRequest,
    JobRun, MediaTransform, SegmentJob,
};
use std::sync::Arc;

/// Owns the configured [`SegmentJob`] and records every run in [`AppState`].
#[derive(Clone)]
pub struct JobRunner {
    job: Arc<SegmentJob>,
    state: Arc<AppState>,
}

impl JobRunner {
    /// Build a runner backed by ffprobe/ffmpeg as configured.
    pub fn from_config(config: &Config, state: Arc<AppState>) -> Self {
        let ffprobe = resolve_tool("ffprobe", config.tools.ffprobe_path.as_deref());
        let ffmpeg = resolve_tool("ffmpeg", config.tools.ffmpeg_path.as_deref());
        tracing::debug!("Using ffprobe at {:?}, ffmpeg at {:?}", ffprobe, ffmpeg);

        Self::with_tools(
            config,
            Arc::new(FfprobeProber::new(ffprobe)),
            Arc::new(FfmpegTransform::new(ffmpeg)),
            state,
        )
    }

    /// Build a runner with explicit probe and transform implementations.
    pub fn with_tools(
        config: &Config,
        prober: Arc<dyn DurationProbe>,
        transform: Arc<dyn MediaTransform>,
        state: Arc<AppState>,
    ) -> Self {
        let mut paths = JobPaths::new(&config.storage.output_dir);
        if let Some(ref scratch) = config.storage.scratch_dir {
            paths = paths.with_scratch_root(scratch);
        }
        let job = SegmentJob::new(prober, transform, config.processing.options(), paths);

        Self {
            job: Arc::new(job),
            state,
        }
    }

    pub fn state(&self) -> &Arc<AppState> {
        &self.state
    }

    /// Run a job on the current thread.
    pub fn run_blocking(&self, request: JobRequest, cancel: &CancelToken) -> JobRun {
        run_recorded(&self.job, &self.state, request, cancel)
    }

    /// Run a job on the blocking thread pool.
    ///
    /// If the returned future is dropped before the job ends (the client went
    /// away), the job is cancelled at its next checkpoint and still cleans up.
    pub async fn run(&self, request: JobRequest) -> segtrim_common::Result<JobRun> {
        let cancel = CancelToken::new();
        let guard = CancelOnDrop(Some(cancel.clone()));
        let job = self.job.clone();
        let state = self.state.clone();

        let run = tokio::task::spawn_blocking(move || run_recorded(&job, &state, request, &cancel))
            .await
            .map_err(|e| segtrim_common::Error::internal(format!("job task failed: {e}")))?;

        guard.disarm();
        Ok(run)
    }
}

fn run_recorded(
    job: &SegmentJob,
    state: &AppState,
    request: JobRequest,
    cancel: &CancelToken,
) -> JobRun {
    state.start_job(JobRecord::new(
        request.id,
        &request.original_name,
        request.params.segment_length(),
        request.params.removal_interval(),
    ));
    let run = job.run(request, cancel);
    state.finish_job(&run.report, &run.result);
    run
}

/// Trips the token when dropped unless disarmed.
struct CancelOnDrop(Option<CancelToken>);

impl CancelOnDrop {
    fn disarm(mut self) {
        self.0 = None;
    }
}

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        if let Some(token) = self.0.take() {
            tracing::info!("Request dropped, cancelling job");
            token.cancel();
        }
    }
}
