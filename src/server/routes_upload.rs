//! Upload form and job submission.

use crate::server::error::ApiError;
use crate::server::AppContext;
use axum::{
    extract::{Multipart, State},
    response::{Html, IntoResponse},
    routing::get,
    Json, Router,
};
use segtrim_av::{JobOutcome, JobRequest, SegmentParams, TempArtifact};
use segtrim_common::paths::{extension_of, is_allowed_video};
use segtrim_common::Error;
use serde::Serialize;
use std::path::Path;
use tokio::io::AsyncWriteExt;

const INDEX_HTML: &str = include_str!("../../assets/index.html");

/// Form field carrying the video.
pub const FIELD_FILE: &str = "file";
/// Form field carrying the segment length in seconds.
pub const FIELD_SEGMENT: &str = "segmento_duracao";
/// Form field carrying the removal interval in seconds.
pub const FIELD_REMOVAL: &str = "intervalo_remocao";

pub fn upload_routes() -> Router<AppContext> {
    Router::new().route("/", get(index).post(upload))
}

async fn index() -> impl IntoResponse {
    Html(INDEX_HTML)
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub message: String,
    pub download_link: Option<String>,
    pub segments: usize,
}

/// An upload spooled to disk, with the name the client gave it.
struct SpooledUpload {
    artifact: TempArtifact,
    original_name: String,
}

async fn upload(
    State(ctx): State<AppContext>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let allowed = ctx.config.processing.allowed_extensions.as_slice();
    let mut upload: Option<SpooledUpload> = None;
    let mut segment: Option<String> = None;
    let mut removal: Option<String> = None;

    while let Some(mut field) = multipart.next_field().await? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some(FIELD_FILE) => {
                let original_name = field.file_name().unwrap_or_default().to_string();
                if original_name.is_empty() || !is_allowed_video(Path::new(&original_name), allowed)
                {
                    return Err(invalid_file(allowed));
                }
                let ext = extension_of(Path::new(&original_name)).unwrap_or_default();

                let artifact = TempArtifact::create_in(
                    &ctx.config.storage.upload_dir,
                    "segtrim-upload-",
                    &format!(".{ext}"),
                )
                .map_err(|e| Error::internal(format!("cannot spool upload: {e}")))?;

                let mut file = tokio::fs::File::create(artifact.path()).await.map_err(Error::from)?;
                let mut bytes = 0u64;
                while let Some(chunk) = field.chunk().await? {
                    bytes += chunk.len() as u64;
                    file.write_all(&chunk).await.map_err(Error::from)?;
                }
                file.flush().await.map_err(Error::from)?;
                tracing::debug!("Received {} ({} bytes)", original_name, bytes);

                upload = Some(SpooledUpload {
                    artifact,
                    original_name,
                });
            }
            Some(FIELD_SEGMENT) => segment = Some(field.text().await?),
            Some(FIELD_REMOVAL) => removal = Some(field.text().await?),
            _ => {}
        }
    }

    let Some(upload) = upload else {
        return Err(invalid_file(allowed));
    };
    let params = parse_params(segment.as_deref(), removal.as_deref())?;

    tracing::info!(
        "Processing upload {} (segment {}s, removal {}s)",
        upload.original_name,
        params.segment_length(),
        params.removal_interval()
    );

    let request = JobRequest::owned(upload.artifact, upload.original_name, params);
    let run = ctx.runner.run(request).await?;

    match run.result {
        Ok(JobOutcome::Produced { output, segments }) => {
            let name = output
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            Ok(Json(UploadResponse {
                message: "Video cut successfully!".to_string(),
                download_link: Some(format!("/download/{name}")),
                segments,
            }))
        }
        Ok(JobOutcome::NoOutput) => Ok(Json(UploadResponse {
            message: "No segments produced: every segment was shorter than the removal interval."
                .to_string(),
            download_link: None,
            segments: 0,
        })),
        Err(e) => {
            tracing::error!(job = %run.report.id.short(), stage = e.stage(), "Cutting failed: {}", e);
            Err(Error::processing("Error while cutting the video. Check the server logs.").into())
        }
    }
}

fn invalid_file<S: AsRef<str>>(allowed: &[S]) -> ApiError {
    let list: Vec<&str> = allowed.iter().map(AsRef::as_ref).collect();
    Error::validation(format!(
        "Invalid or missing file. Upload a video file ({}).",
        list.join(", ")
    ))
    .into()
}

/// Parse and validate the two integer form fields.
pub fn parse_params(segment: Option<&str>, removal: Option<&str>) -> Result<SegmentParams, Error> {
    let parse = |v: Option<&str>| v.map(str::trim).and_then(|v| v.parse::<u32>().ok());

    let (Some(segment), Some(removal)) = (parse(segment), parse(removal)) else {
        return Err(Error::validation(
            "Segment length and removal interval must be whole numbers.",
        ));
    };

    if segment == 0 {
        return Err(Error::validation("Segment length must be greater than zero."));
    }
    if removal >= segment {
        return Err(Error::validation(
            "The removal interval must be shorter than the segment length.",
        ));
    }

    SegmentParams::new(segment, removal).map_err(|e| Error::validation(e.to_string()))
}
