use axum::Router;

pub mod jobs;
pub mod projects;
pub mod snapshots;
pub mod system;

/// Router for all `/api` endpoints.
pub fn router() -> Router {
    Router::new()
        .nest("/projects", projects::router())
        .nest("/snapshots", snapshots::router())
        .nest("/jobs", jobs::router())
}
