//! Job observation endpoints: the polling surface through which callers see
//! asynchronous outcomes.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use serde::Deserialize;

use pixelproof_core::JobId;
use pixelproof_queue::JobStatus;

use crate::app::errors;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_jobs))
        .route("/stats", get(job_stats))
        .route("/:id", get(get_job))
}

#[derive(Debug, Deserialize)]
pub struct ListJobsQuery {
    pub status: Option<String>,
}

fn parse_job_status(s: &str) -> Option<JobStatus> {
    match s {
        "PENDING" => Some(JobStatus::Pending),
        "RUNNING" => Some(JobStatus::Running),
        "COMPLETED" => Some(JobStatus::Completed),
        "FAILED" => Some(JobStatus::Failed),
        "RETRYING" => Some(JobStatus::Retrying),
        "CANCELLED" => Some(JobStatus::Cancelled),
        _ => None,
    }
}

pub async fn list_jobs(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<ListJobsQuery>,
) -> axum::response::Response {
    let filter = match query.status.as_deref() {
        Some(raw) => match parse_job_status(raw) {
            Some(status) => Some(status),
            None => {
                return errors::json_error(
                    StatusCode::BAD_REQUEST,
                    "invalid_status",
                    "status must be one of: PENDING, RUNNING, COMPLETED, FAILED, RETRYING, CANCELLED",
                );
            }
        },
        None => None,
    };

    let jobs = services.queue.list_jobs(filter);
    (StatusCode::OK, Json(serde_json::json!({ "jobs": jobs }))).into_response()
}

pub async fn get_job(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let Ok(id) = id.parse::<JobId>() else {
        return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid job id");
    };

    match services.queue.get_job(id) {
        Some(job) => (StatusCode::OK, Json(job)).into_response(),
        None => errors::json_error(StatusCode::NOT_FOUND, "not_found", "job not found"),
    }
}

pub async fn job_stats(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    (StatusCode::OK, Json(services.queue.stats())).into_response()
}
