use chrono::{DateTime, Utc};
use segtrim_common::JobId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRecord {
    pub id: JobId,
    pub file_name: String,
    pub segment_length: u32,
    pub removal_interval: u32,
    pub status: JobStatus,
    /// Windows joined into the output
    pub segments: Option<usize>,
    /// File name under the output directory, when one was produced
    pub output_name: Option<String>,
    pub source_duration_secs: Option<f64>,
    /// Client-safe failure message; tool output and paths stay in the log
    pub error: Option<String>,
    /// Pipeline stage that failed (probe, cut, concat, ...)
    pub failed_stage: Option<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub elapsed_ms: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Running,
    Completed,
    NoOutput,
    Failed,
    Cancelled,
}

impl JobRecord {
    pub fn new(id: JobId, file_name: &str, segment_length: u32, removal_interval: u32) -> Self {
        Self {
            id,
            file_name: file_name.to_string(),
            segment_length,
            removal_interval,
            status: JobStatus::Running,
            segments: None,
            output_name: None,
            source_duration_secs: None,
            error: None,
            failed_stage: None,
            created_at: Utc::now(),
            completed_at: None,
            elapsed_ms: None,
        }
    }

    pub fn complete(&mut self, output_name: String, segments: usize) {
        self.status = JobStatus::Completed;
        self.output_name = Some(output_name);
        self.segments = Some(segments);
        self.completed_at = Some(Utc::now());
    }

    pub fn no_output(&mut self) {
        self.status = JobStatus::NoOutput;
        self.segments = Some(0);
        self.completed_at = Some(Utc::now());
    }

    pub fn fail(&mut self, stage: &str) {
        self.status = JobStatus::Failed;
        self.error = Some(format!(
            "Processing failed at the {stage} stage. Check the server logs."
        ));
        self.failed_stage = Some(stage.to_string());
        self.completed_at = Some(Utc::now());
    }

    pub fn cancel(&mut self) {
        self.status = JobStatus::Cancelled;
        self.completed_at = Some(Utc::now());
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct JobStats {
    pub total_processed: u64,
    pub produced: u64,
    pub no_output: u64,
    pub failed: u64,
    pub cancelled: u64,
    pub segments_joined: u64,
}

impl JobStats {
    pub fn success_rate(&self) -> f32 {
        if self.total_processed == 0 {
            return 0.0;
        }
        ((self.produced + self.no_output) as f32 / self.total_processed as f32) * 100.0
    }

    pub fn record(&mut self, status: JobStatus, segments: usize) {
        if status == JobStatus::Running {
            return;
        }
        self.total_processed += 1;
        match status {
            JobStatus::Completed => {
                self.produced += 1;
                self.segments_joined += segments as u64;
            }
            JobStatus::NoOutput => self.no_output += 1,
            JobStatus::Failed => self.failed += 1,
            JobStatus::Cancelled => self.cancelled += 1,
            JobStatus::Running => {}
        }
    }
}
