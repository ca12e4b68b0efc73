use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};

use pixelproof_core::{ProjectId, SnapshotId};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_project).get(list_projects))
        .route("/:identifier", get(get_project))
        .route("/:identifier/snapshots", get(list_snapshots))
        .route("/:identifier/snapshots/:snapshot_id", get(get_snapshot))
}

pub async fn create_project(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::CreateProjectRequest>,
) -> axum::response::Response {
    match services.projects.create(body.name, body.url) {
        Ok(project) => {
            (StatusCode::CREATED, Json(dto::project_to_json(&project))).into_response()
        }
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_project(
    Extension(services): Extension<Arc<AppServices>>,
    Path(identifier): Path<String>,
) -> axum::response::Response {
    match services.projects.find_by_identifier(&identifier) {
        Ok(Some(project)) => (StatusCode::OK, Json(dto::project_to_json(&project))).into_response(),
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "project not found"),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn list_projects(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.projects.list() {
        Ok(projects) => {
            let summaries: Vec<_> = projects.iter().map(dto::project_summary_to_json).collect();
            (
                StatusCode::OK,
                Json(serde_json::json!({ "projects": summaries })),
            )
                .into_response()
        }
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn list_snapshots(
    Extension(services): Extension<Arc<AppServices>>,
    Path(identifier): Path<String>,
) -> axum::response::Response {
    let Ok(project_id) = identifier.parse::<ProjectId>() else {
        return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid project id");
    };

    match services.snapshots.list_by_project(project_id) {
        Ok(snapshots) => {
            let items: Vec<_> = snapshots.iter().map(dto::snapshot_to_json).collect();
            (
                StatusCode::OK,
                Json(serde_json::json!({ "snapshots": items })),
            )
                .into_response()
        }
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_snapshot(
    Extension(services): Extension<Arc<AppServices>>,
    Path((identifier, snapshot_id)): Path<(String, String)>,
) -> axum::response::Response {
    let Ok(project_id) = identifier.parse::<ProjectId>() else {
        return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid project id");
    };
    let Ok(snapshot_id) = snapshot_id.parse::<SnapshotId>() else {
        return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid snapshot id");
    };

    match services.snapshots.find(project_id, snapshot_id) {
        Ok(Some(snapshot)) => {
            (StatusCode::OK, Json(dto::snapshot_to_json(&snapshot))).into_response()
        }
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "snapshot not found"),
        Err(e) => errors::service_error_to_response(e),
    }
}
