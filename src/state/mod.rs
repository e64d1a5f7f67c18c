//! In-memory job bookkeeping for the stats and jobs API.
//!
//! Nothing here is persisted; a restart starts from empty counters.

mod types;

pub use types::*;

use parking_lot::RwLock;
use segtrim_av::{JobOutcome, JobReport};
use segtrim_common::JobId;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

const MAX_HISTORY_SIZE: usize = 200;

pub struct AppState {
    active: RwLock<HashMap<JobId, JobRecord>>,
    history: RwLock<VecDeque<JobRecord>>,
    stats: RwLock<JobStats>,
}

impl AppState {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            active: RwLock::new(HashMap::new()),
            history: RwLock::new(VecDeque::new()),
            stats: RwLock::new(JobStats::default()),
        })
    }

    /// Register a job that is about to run.
    pub fn start_job(&self, record: JobRecord) {
        tracing::debug!("Job {} started for {}", record.id.short(), record.file_name);
        self.active.write().insert(record.id, record);
    }

    /// Move a job to history with its final outcome.
    pub fn finish_job(&self, report: &JobReport, result: &segtrim_av::Result<JobOutcome>) {
        let Some(mut record) = self.active.write().remove(&report.id) else {
            tracing::warn!("Finished unknown job {}", report.id);
            return;
        };

        record.source_duration_secs = report.duration.map(|d| d.as_secs());
        record.elapsed_ms = Some(report.elapsed.as_millis() as u64);

        match result {
            Ok(JobOutcome::Produced { output, segments }) => {
                let name = output
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_default();
                record.complete(name, *segments);
            }
            Ok(JobOutcome::NoOutput) => record.no_output(),
            Err(segtrim_av::Error::Cancelled) => record.cancel(),
            Err(e) => record.fail(e.stage()),
        }

        self.stats
            .write()
            .record(record.status, record.segments.unwrap_or(0));
        self.add_to_history(record);
    }

    fn add_to_history(&self, record: JobRecord) {
        let mut history = self.history.write();
        history.push_front(record);
        while history.len() > MAX_HISTORY_SIZE {
            history.pop_back();
        }
    }

    pub fn get_job(&self, id: JobId) -> Option<JobRecord> {
        if let Some(record) = self.active.read().get(&id) {
            return Some(record.clone());
        }
        self.history.read().iter().find(|r| r.id == id).cloned()
    }

    pub fn get_active_jobs(&self) -> Vec<JobRecord> {
        self.active.read().values().cloned().collect()
    }

    /// Most recent first.
    pub fn get_history(&self, limit: usize) -> Vec<JobRecord> {
        self.history.read().iter().take(limit).cloned().collect()
    }

    pub fn get_stats(&self) -> JobStats {
        self.stats.read().clone()
    }
}
