//! Request/response DTOs and JSON mapping helpers.

use serde::Deserialize;
use serde_json::{Value, json};

use pixelproof_project::Project;
use pixelproof_snapshot::Snapshot;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct CreateProjectRequest {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSnapshotRequest {
    pub project_id: String,
    #[serde(default)]
    pub full_scan: bool,
}

// -------------------------
// Response mapping
// -------------------------

pub fn project_to_json(project: &Project) -> Value {
    json!({
        "uuid": project.uuid(),
        "name": project.name(),
        "url": project.url(),
        "status": project.status(),
        "created_at": project.created_at().to_rfc3339(),
        "updated_at": project.updated_at().to_rfc3339(),
    })
}

pub fn project_summary_to_json(project: &Project) -> Value {
    json!({
        "uuid": project.uuid(),
        "name": project.name(),
        "status": project.status(),
        "created_at": project.created_at().to_rfc3339(),
    })
}

pub fn snapshot_to_json(snapshot: &Snapshot) -> Value {
    json!({
        "uuid": snapshot.uuid(),
        "project_uuid": snapshot.project_uuid(),
        "full_scan": snapshot.full_scan(),
        "status": snapshot.status(),
        "created_at": snapshot.created_at().to_rfc3339(),
        "updated_at": snapshot.updated_at().to_rfc3339(),
    })
}
