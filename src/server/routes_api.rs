use crate::server::error::ApiError;
use crate::server::AppContext;
use crate::state::JobRecord;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use segtrim_common::{Error, JobId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub fn api_routes() -> Router<AppContext> {
    Router::new()
        .route("/health", get(health))
        .route("/stats", get(stats))
        .route("/jobs", get(list_jobs))
        .route("/jobs/:id", get(get_job))
        .route("/tools", get(get_tools))
        .route("/plan", get(preview_plan))
}

async fn health(State(ctx): State<AppContext>) -> impl IntoResponse {
    let stats = ctx.state.get_stats();
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "stats": {
            "total_processed": stats.total_processed,
            "success_rate": stats.success_rate()
        }
    }))
}

async fn stats(State(ctx): State<AppContext>) -> impl IntoResponse {
    Json(ctx.state.get_stats())
}

#[derive(Deserialize)]
struct ListJobsQuery {
    limit: Option<usize>,
}

#[derive(Serialize)]
struct JobsResponse {
    active: Vec<JobRecord>,
    history: Vec<JobRecord>,
}

async fn list_jobs(
    State(ctx): State<AppContext>,
    Query(params): Query<ListJobsQuery>,
) -> impl IntoResponse {
    let limit = params.limit.unwrap_or(50);
    Json(JobsResponse {
        active: ctx.state.get_active_jobs(),
        history: ctx.state.get_history(limit),
    })
}

async fn get_job(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> Result<Json<JobRecord>, ApiError> {
    let uuid: Uuid = id
        .parse()
        .map_err(|_| Error::validation("Invalid job ID"))?;

    ctx.state
        .get_job(JobId::from(uuid))
        .map(Json)
        .ok_or_else(|| Error::not_found(id).into())
}

async fn get_tools(State(ctx): State<AppContext>) -> impl IntoResponse {
    let tools = &ctx.config.tools;
    let ffmpeg = segtrim_av::resolve_tool("ffmpeg", tools.ffmpeg_path.as_deref());
    let ffprobe = segtrim_av::resolve_tool("ffprobe", tools.ffprobe_path.as_deref());
    Json(vec![
        segtrim_av::check_tool_at("ffmpeg", &ffmpeg),
        segtrim_av::check_tool_at("ffprobe", &ffprobe),
    ])
}

#[derive(Deserialize)]
struct PlanQuery {
    duration: f64,
    segment: u32,
    removal: u32,
}

/// Largest plan `/api/plan` will build.
pub const MAX_PREVIEW_WINDOWS: u64 = 10_000;

/// Preview the windows a job would cut, without any media.
async fn preview_plan(Query(q): Query<PlanQuery>) -> Result<impl IntoResponse, ApiError> {
    let params = segtrim_av::SegmentParams::new(q.segment, q.removal)
        .map_err(|e| Error::validation(e.to_string()))?;
    let duration = segtrim_av::MediaDuration::from_secs(q.duration)
        .map_err(|e| Error::validation(e.to_string()))?;
    if params.segment_count(duration) > MAX_PREVIEW_WINDOWS {
        return Err(Error::validation(format!(
            "Preview is limited to {MAX_PREVIEW_WINDOWS} segments; use a longer segment length."
        ))
        .into());
    }
    let plan = segtrim_av::SegmentPlan::build(duration, &params)
        .map_err(|e| Error::validation(e.to_string()))?;

    Ok(Json(serde_json::json!({
        "windows": plan.windows(),
        "kept_secs": plan.total_cut_length(),
    })))
}
