use std::sync::Arc;

use axum::{
    Json, Router, extract::Extension, http::StatusCode, response::IntoResponse, routing::post,
};

use pixelproof_core::ProjectId;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new().route("/", post(create_snapshot))
}

pub async fn create_snapshot(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::CreateSnapshotRequest>,
) -> axum::response::Response {
    let Ok(project_id) = body.project_id.parse::<ProjectId>() else {
        return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid project id");
    };

    match services.snapshots.create(project_id, body.full_scan) {
        Ok(snapshot) => (
            StatusCode::CREATED,
            Json(serde_json::json!({
                "snapshotUuid": snapshot.uuid(),
                "projectUuid": snapshot.project_uuid(),
                "status": snapshot.status(),
            })),
        )
            .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
