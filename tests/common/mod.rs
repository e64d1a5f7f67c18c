//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`], which builds a full [`AppContext`] over
//! temporary upload/output directories and scripted probe/transform
//! stand-ins, so no test needs ffmpeg installed.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::body::Body;
use axum::http::Request;
use axum::Router;
use http_body_util::BodyExt;
use segtrim::config::Config;
use segtrim::processor::JobRunner;
use segtrim::server::{create_router, AppContext};
use segtrim::state::AppState;
use segtrim_av::testing::{FixedProbe, ScriptedTransform};
use segtrim_av::DurationProbe;
use tempfile::TempDir;

pub const BOUNDARY: &str = "segtrim-test-boundary";

pub struct TestHarness {
    pub ctx: AppContext,
    pub transform: Arc<ScriptedTransform>,
    root: TempDir,
}

impl TestHarness {
    /// Harness whose probe reports `duration` seconds for every upload.
    pub fn new(duration: f64) -> Self {
        Self::with_tools(FixedProbe(duration), ScriptedTransform::new())
    }

    pub fn with_tools(probe: impl DurationProbe + 'static, transform: ScriptedTransform) -> Self {
        let root = tempfile::tempdir().expect("failed to create temp dir");
        let mut config = Config::default();
        config.storage.upload_dir = root.path().join("uploads");
        config.storage.output_dir = root.path().join("output");
        config.storage.scratch_dir = Some(root.path().join("scratch"));
        segtrim::config::ensure_storage_dirs(&config).expect("failed to create dirs");

        let transform = Arc::new(transform);
        let runner = JobRunner::with_tools(
            &config,
            Arc::new(probe),
            transform.clone(),
            AppState::new(),
        );
        let ctx = AppContext::with_runner(config, runner);

        Self {
            ctx,
            transform,
            root,
        }
    }

    pub fn router(&self) -> Router {
        create_router(self.ctx.clone())
    }

    pub fn upload_dir(&self) -> PathBuf {
        self.ctx.config.storage.upload_dir.clone()
    }

    pub fn output_dir(&self) -> PathBuf {
        self.ctx.config.storage.output_dir.clone()
    }

    pub fn scratch_dir(&self) -> PathBuf {
        self.root.path().join("scratch")
    }
}

/// Entries of a directory, empty if it does not exist.
pub fn list(dir: &Path) -> Vec<PathBuf> {
    match std::fs::read_dir(dir) {
        Ok(entries) => entries.map(|e| e.unwrap().path()).collect(),
        Err(_) => Vec::new(),
    }
}

/// One part of a multipart form.
pub enum Part<'a> {
    Text(&'a str, &'a str),
    File(&'a str, &'a str, &'a [u8]),
}

/// Encode a multipart/form-data body.
pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
            Part::File(name, file_name, data) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\n\
                         Content-Type: application/octet-stream\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(data);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

/// POST / with the given form parts.
pub fn upload_request(parts: &[Part<'_>]) -> Request<Body> {
    Request::post("/")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(parts)))
        .unwrap()
}

/// The usual three-field upload.
pub fn video_upload(file_name: &str, segment: &str, removal: &str) -> Request<Body> {
    upload_request(&[
        Part::File("file", file_name, b"fake video bytes"),
        Part::Text("segmento_duracao", segment),
        Part::Text("intervalo_remocao", removal),
    ])
}

pub async fn body_bytes(body: Body) -> Vec<u8> {
    body.collect().await.unwrap().to_bytes().to_vec()
}

pub async fn body_json(body: Body) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(body).await).unwrap()
}
