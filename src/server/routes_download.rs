//! Serving finished outputs.

use crate::server::error::ApiError;
use crate::server::AppContext;
use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, StatusCode},
    response::Response,
    routing::get,
    Router,
};
use segtrim_common::paths::{extension_of, is_safe_file_name};
use segtrim_common::Error;
use tokio::fs::File;
use tokio_util::io::ReaderStream;

pub fn download_routes() -> Router<AppContext> {
    Router::new().route("/download/:filename", get(download))
}

/// Stream an output file as an attachment.
async fn download(
    State(ctx): State<AppContext>,
    Path(filename): Path<String>,
) -> Result<Response, ApiError> {
    if !is_safe_file_name(&filename) {
        return Err(Error::validation("Invalid file name.").into());
    }

    let path = ctx.config.storage.output_dir.join(&filename);
    let metadata = match tokio::fs::metadata(&path).await {
        Ok(m) if m.is_file() => m,
        _ => {
            tracing::warn!("Requested output not found: {}", filename);
            return Err(Error::not_found(filename).into());
        }
    };

    let file = File::open(&path).await.map_err(Error::from)?;
    tracing::info!("Sending {} ({} bytes)", filename, metadata.len());

    let body = Body::from_stream(ReaderStream::new(file));
    let content_type = content_type_for(&filename);

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_LENGTH, metadata.len().to_string())
        .header(header::CONTENT_DISPOSITION, content_disposition(&filename))
        .body(body)
        .map_err(|e| Error::internal(e.to_string()).into())
}

/// `attachment` disposition with an ASCII fallback name and the exact UTF-8
/// name in `filename*`.
fn content_disposition(filename: &str) -> String {
    let fallback: String = filename
        .chars()
        .map(|c| {
            if c.is_ascii_graphic() && c != '"' && c != '\\' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback,
        urlencoding::encode(filename)
    )
}

/// MIME type from the file extension.
fn content_type_for(filename: &str) -> &'static str {
    match extension_of(std::path::Path::new(filename)).as_deref() {
        Some("mp4") => "video/mp4",
        Some("mov") => "video/quicktime",
        Some("mkv") => "video/x-matroska",
        Some("avi") => "video/x-msvideo",
        _ => "application/octet-stream",
    }
}
