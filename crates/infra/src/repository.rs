//! Repository contracts consumed by the service layer and the capture
//! runner.
//!
//! Absence is `Ok(None)` / an empty vec, never an error; `RepositoryError`
//! is reserved for infrastructure faults.

use thiserror::Error;

use pixelproof_core::{ProjectId, SnapshotId};
use pixelproof_project::Project;
use pixelproof_snapshot::Snapshot;

/// Infrastructure-level storage error.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed record: {0}")]
    Record(#[from] serde_json::Error),
}

pub type RepoResult<T> = Result<T, RepositoryError>;

/// Durable storage for projects.
///
/// The repository owns the durable record; in-memory entities are transient
/// working copies reconciled by explicit `save` calls. Saving an existing
/// identifier overwrites in place.
pub trait ProjectRepository: Send + Sync {
    fn save(&self, project: &Project) -> RepoResult<()>;
    fn find_by_uuid(&self, id: ProjectId) -> RepoResult<Option<Project>>;
    fn find_by_name(&self, name: &str) -> RepoResult<Option<Project>>;
    fn list_all(&self) -> RepoResult<Vec<Project>>;
}

/// Durable storage for snapshots, grouped under their project.
pub trait SnapshotRepository: Send + Sync {
    fn save(&self, project_id: ProjectId, snapshot: &Snapshot) -> RepoResult<()>;
    fn find_by_uuid(
        &self,
        project_id: ProjectId,
        snapshot_id: SnapshotId,
    ) -> RepoResult<Option<Snapshot>>;
    fn list_by_project(&self, project_id: ProjectId) -> RepoResult<Vec<Snapshot>>;
}
