//! HTTP surface tests: upload form, job submission, downloads and the JSON API.
//!
//! Every request goes through the real router via `oneshot`; ffprobe and
//! ffmpeg are replaced by the scripted stand-ins from `segtrim_av::testing`.

mod common;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use common::{body_bytes, body_json, list, upload_request, video_upload, Part, TestHarness};
use segtrim_av::testing::{FailingProbe, ScriptedTransform};
use segtrim_av::{DurationProbe, MediaDuration};
use std::path::Path;
use tower::ServiceExt;

#[tokio::test]
async fn test_index_serves_form() {
    let harness = TestHarness::new(90.0);
    let response = harness
        .router()
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let html = String::from_utf8(body_bytes(response.into_body()).await).unwrap();
    assert!(html.contains("segmento_duracao"));
    assert!(html.contains("intervalo_remocao"));
    assert!(html.contains("name=\"file\""));
}

#[tokio::test]
async fn test_health_endpoints() {
    let harness = TestHarness::new(90.0);

    let response = harness
        .router()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = harness
        .router()
        .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response.into_body()).await;
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["stats"]["total_processed"], 0);
}

#[tokio::test]
async fn test_upload_produces_downloadable_output() {
    let harness = TestHarness::new(90.0);

    let response = harness
        .router()
        .oneshot(video_upload("My Holiday.mp4", "30", "5"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response.into_body()).await;
    assert_eq!(json["message"], "Video cut successfully!");
    assert_eq!(json["segments"], 3);
    let link = json["download_link"].as_str().unwrap().to_string();
    assert!(link.starts_with("/download/My_Holiday_"), "{link}");
    assert!(link.ends_with(".mp4"), "{link}");

    let response = harness
        .router()
        .oneshot(Request::get(link.as_str()).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "video/mp4"
    );
    let disposition = response
        .headers()
        .get(header::CONTENT_DISPOSITION)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.starts_with("attachment;"), "{disposition}");

    let bytes = body_bytes(response.into_body()).await;
    assert_eq!(bytes, b"[0+25][30+25][60+25]");
}

#[tokio::test]
async fn test_upload_leaves_only_the_output() {
    let harness = TestHarness::new(90.0);

    let response = harness
        .router()
        .oneshot(video_upload("clip.mov", "30", "5"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    assert!(list(&harness.upload_dir()).is_empty());
    assert!(list(&harness.scratch_dir()).is_empty());
    assert_eq!(list(&harness.output_dir()).len(), 1);
}

#[tokio::test]
async fn test_job_is_recorded() {
    let harness = TestHarness::new(90.0);

    harness
        .router()
        .oneshot(video_upload("clip.mp4", "30", "5"))
        .await
        .unwrap();

    let response = harness
        .router()
        .oneshot(Request::get("/api/jobs").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let json = body_json(response.into_body()).await;
    assert_eq!(json["active"].as_array().unwrap().len(), 0);
    let history = json["history"].as_array().unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["status"], "completed");
    assert_eq!(history[0]["segments"], 3);

    let id = history[0]["id"].as_str().unwrap().to_string();
    let response = harness
        .router()
        .oneshot(
            Request::get(format!("/api/jobs/{id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = harness
        .router()
        .oneshot(Request::get("/api/stats").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let stats = body_json(response.into_body()).await;
    assert_eq!(stats["total_processed"], 1);
    assert_eq!(stats["produced"], 1);
    assert_eq!(stats["segments_joined"], 3);
}

#[tokio::test]
async fn test_upload_with_no_windows_returns_no_link() {
    // Every window would be shorter than the removal interval: 4s source, 10s segments.
    let harness = TestHarness::with_tools(
        segtrim_av::testing::FixedProbe(4.0),
        ScriptedTransform::new(),
    );

    let response = harness
        .router()
        .oneshot(video_upload("short.mp4", "10", "5"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response.into_body()).await;
    assert!(json["download_link"].is_null());
    assert_eq!(json["segments"], 0);
    assert_eq!(harness.transform.concat_calls(), 0);
    assert!(list(&harness.output_dir()).is_empty());
    assert!(list(&harness.upload_dir()).is_empty());
}

#[tokio::test]
async fn test_upload_rejects_bad_extension() {
    let harness = TestHarness::new(90.0);

    let response = harness
        .router()
        .oneshot(video_upload("notes.txt", "30", "5"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response.into_body()).await;
    assert!(json["error"].as_str().unwrap().contains("Invalid or missing file"));
    assert_eq!(harness.transform.cut_calls(), 0);
}

#[tokio::test]
async fn test_upload_rejects_missing_file() {
    let harness = TestHarness::new(90.0);

    let response = harness
        .router()
        .oneshot(upload_request(&[
            Part::Text("segmento_duracao", "30"),
            Part::Text("intervalo_remocao", "5"),
        ]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_upload_rejects_bad_parameters() {
    let harness = TestHarness::new(90.0);

    for (segment, removal) in [("abc", "5"), ("30", "2.5"), ("10", "10"), ("5", "9"), ("0", "0")] {
        let response = harness
            .router()
            .oneshot(video_upload("clip.mp4", segment, removal))
            .await
            .unwrap();
        assert_eq!(
            response.status(),
            StatusCode::BAD_REQUEST,
            "segment={segment} removal={removal}"
        );
    }

    // Rejected uploads are not left behind.
    assert!(list(&harness.upload_dir()).is_empty());
    assert_eq!(harness.transform.cut_calls(), 0);
}

#[tokio::test]
async fn test_processing_failure_is_generic_500() {
    let harness = TestHarness::with_tools(
        segtrim_av::testing::FixedProbe(90.0),
        ScriptedTransform::new().fail_on_cut(1),
    );

    let response = harness
        .router()
        .oneshot(video_upload("clip.mp4", "30", "5"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let json = body_json(response.into_body()).await;
    let message = json["error"].as_str().unwrap();
    assert!(message.contains("Check the server logs"));
    assert!(!message.contains("Conversion failed"));

    assert!(list(&harness.upload_dir()).is_empty());
    assert!(list(&harness.output_dir()).is_empty());
    assert!(list(&harness.scratch_dir()).is_empty());
}

#[tokio::test]
async fn test_probe_failure_is_500() {
    let harness = TestHarness::with_tools(
        FailingProbe("moov atom not found".to_string()),
        ScriptedTransform::new(),
    );

    let response = harness
        .router()
        .oneshot(video_upload("broken.mp4", "30", "5"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(list(&harness.upload_dir()).is_empty());

    let response = harness
        .router()
        .oneshot(Request::get("/api/stats").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let stats = body_json(response.into_body()).await;
    assert_eq!(stats["failed"], 1);
}

#[tokio::test]
async fn test_download_rejects_traversal() {
    let harness = TestHarness::new(90.0);

    let response = harness
        .router()
        .oneshot(
            Request::get("/download/..%2Fsecret.mp4")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_download_missing_file() {
    let harness = TestHarness::new(90.0);

    let response = harness
        .router()
        .oneshot(
            Request::get("/download/nothing_20250101_000000.mp4")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_plan_preview() {
    let harness = TestHarness::new(90.0);

    let response = harness
        .router()
        .oneshot(
            Request::get("/api/plan?duration=72&segment=30&removal=5")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response.into_body()).await;
    let windows = json["windows"].as_array().unwrap();
    assert_eq!(windows.len(), 3);
    assert_eq!(windows[0]["start"], 0.0);
    assert_eq!(windows[2]["start"], 60.0);
    assert_eq!(windows[2]["cut_length"], 7.0);

    let response = harness
        .router()
        .oneshot(
            Request::get("/api/plan?duration=65&segment=5&removal=5")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_get_job_invalid_and_unknown() {
    let harness = TestHarness::new(90.0);

    let response = harness
        .router()
        .oneshot(Request::get("/api/jobs/not-a-uuid").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = harness
        .router()
        .oneshot(
            Request::get("/api/jobs/00000000-0000-0000-0000-000000000000")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_plan_preview_rejects_oversized_plans() {
    let harness = TestHarness::new(90.0);

    let response = harness
        .router()
        .oneshot(
            Request::get("/api/plan?duration=20000000&segment=1&removal=0")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response.into_body()).await;
    assert!(json["error"].as_str().unwrap().contains("limited"));

    // Exactly at the limit is still served.
    let limit = segtrim::server::routes_api::MAX_PREVIEW_WINDOWS;
    let response = harness
        .router()
        .oneshot(
            Request::get(format!("/api/plan?duration={limit}&segment=1&removal=0"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

/// Fails the way ffprobe does on a corrupt file: the message names the input.
struct PathEchoingProbe;

impl DurationProbe for PathEchoingProbe {
    fn probe(&self, path: &Path) -> segtrim_av::Result<MediaDuration> {
        Err(segtrim_av::Error::probe(format!(
            "{}: Invalid data found when processing input",
            path.display()
        )))
    }
}

#[tokio::test]
async fn test_failed_job_record_hides_server_paths() {
    let harness = TestHarness::with_tools(PathEchoingProbe, ScriptedTransform::new());

    let response = harness
        .router()
        .oneshot(video_upload("broken.mp4", "30", "5"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let response = harness
        .router()
        .oneshot(Request::get("/api/jobs").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let json = body_json(response.into_body()).await;
    let record = &json["history"][0];
    assert_eq!(record["status"], "failed");
    assert_eq!(record["failed_stage"], "probe");

    let error = record["error"].as_str().unwrap();
    let upload_dir = harness.upload_dir().display().to_string();
    assert!(!error.contains(&upload_dir), "{error}");
    assert!(!error.contains("segtrim-upload-"), "{error}");
    assert!(!error.contains("Invalid data"), "{error}");
}

#[tokio::test]
async fn test_unicode_names_survive_to_download() {
    let harness = TestHarness::new(40.0);

    let response = harness
        .router()
        .oneshot(video_upload("Reunião.mp4", "10", "2"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response.into_body()).await;
    let link = json["download_link"].as_str().unwrap();
    let name = link.strip_prefix("/download/").unwrap().to_string();
    assert!(name.starts_with("Reunião_"), "{name}");

    let response = harness
        .router()
        .oneshot(
            Request::get(format!("/download/{}", urlencoding::encode(&name)))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let disposition = response
        .headers()
        .get(header::CONTENT_DISPOSITION)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.contains("filename*=UTF-8''Reuni%C3%A3o_"), "{disposition}");
    assert_eq!(
        body_bytes(response.into_body()).await,
        b"[0+8][10+8][20+8][30+8]"
    );
}
