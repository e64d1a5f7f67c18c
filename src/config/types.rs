use segtrim_av::{CodecPair, ProcessingOptions};
use segtrim_common::paths::default_video_extensions;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub processing: ProcessingConfig,

    #[serde(default)]
    pub tools: ToolsConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Largest accepted upload, in megabytes
    #[serde(default = "default_max_upload_mb")]
    pub max_upload_mb: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    5000
}
fn default_max_upload_mb() -> u64 {
    2048
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_upload_mb: default_max_upload_mb(),
        }
    }
}

impl ServerConfig {
    /// Upload limit in bytes.
    pub fn max_upload_bytes(&self) -> usize {
        usize::try_from(self.max_upload_mb.saturating_mul(1024 * 1024)).unwrap_or(usize::MAX)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Where uploads are spooled while their job runs
    #[serde(default = "default_upload_dir")]
    pub upload_dir: PathBuf,

    /// Where finished outputs are kept for download
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Parent of per-job scratch directories (system temp dir if unset)
    #[serde(default)]
    pub scratch_dir: Option<PathBuf>,
}

fn default_upload_dir() -> PathBuf {
    PathBuf::from("uploads")
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            upload_dir: default_upload_dir(),
            output_dir: default_output_dir(),
            scratch_dir: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProcessingConfig {
    /// Encoder for cut segments (default: "libx264")
    #[serde(default = "default_video_codec")]
    pub video_codec: String,

    /// Encoder for cut segments (default: "aac")
    #[serde(default = "default_audio_codec")]
    pub audio_codec: String,

    /// Windows cut at once; 1 keeps each job sequential
    #[serde(default = "default_parallel_cuts")]
    pub parallel_cuts: usize,

    /// Accepted upload extensions, without the dot
    #[serde(default = "default_allowed_extensions")]
    pub allowed_extensions: Vec<String>,
}

fn default_video_codec() -> String {
    "libx264".to_string()
}

fn default_audio_codec() -> String {
    "aac".to_string()
}

fn default_parallel_cuts() -> usize {
    1
}

fn default_allowed_extensions() -> Vec<String> {
    default_video_extensions()
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            video_codec: default_video_codec(),
            audio_codec: default_audio_codec(),
            parallel_cuts: default_parallel_cuts(),
            allowed_extensions: default_allowed_extensions(),
        }
    }
}

impl ProcessingConfig {
    /// Options handed to every job.
    pub fn options(&self) -> ProcessingOptions {
        ProcessingOptions {
            codecs: CodecPair {
                video: self.video_codec.clone(),
                audio: self.audio_codec.clone(),
            },
            parallel_cuts: self.parallel_cuts,
            ..ProcessingOptions::default()
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ToolsConfig {
    #[serde(default)]
    pub ffmpeg_path: Option<PathBuf>,

    #[serde(default)]
    pub ffprobe_path: Option<PathBuf>,
}
