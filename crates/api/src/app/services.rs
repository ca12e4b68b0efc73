//! Service layer: translates API requests into entity construction,
//! repository calls, and (for snapshots) job enqueue.

use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use pixelproof_core::{DomainError, ProjectId, SnapshotId};
use pixelproof_infra::{ProjectRepository, RepositoryError, SnapshotJobPayload, SnapshotRepository};
use pixelproof_project::Project;
use pixelproof_queue::{InMemoryQueue, Job, JobType};
use pixelproof_snapshot::Snapshot;

/// Error surface of the service layer.
///
/// Domain errors are deterministic rejections (validation, conflicts,
/// absence); store errors are infrastructure faults.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Store(#[from] RepositoryError),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

pub struct ProjectService {
    projects: Arc<dyn ProjectRepository>,
}

impl ProjectService {
    pub fn new(projects: Arc<dyn ProjectRepository>) -> Self {
        Self { projects }
    }

    /// Create and persist a project.
    ///
    /// `name` is a unique secondary lookup key, so duplicates are rejected
    /// with a conflict before anything is saved.
    pub fn create(&self, name: String, url: String) -> ServiceResult<Project> {
        let project = Project::create(name, url)?;
        if self.projects.find_by_name(project.name())?.is_some() {
            return Err(DomainError::conflict("project name already exists").into());
        }
        self.projects.save(&project)?;
        info!(project = %project.uuid(), name = project.name(), "project created");
        Ok(project)
    }

    /// Look up by UUID first, falling back to the name key.
    pub fn find_by_identifier(&self, identifier: &str) -> ServiceResult<Option<Project>> {
        if let Ok(id) = identifier.parse::<ProjectId>() {
            if let Some(project) = self.projects.find_by_uuid(id)? {
                return Ok(Some(project));
            }
        }
        Ok(self.projects.find_by_name(identifier)?)
    }

    pub fn list(&self) -> ServiceResult<Vec<Project>> {
        Ok(self.projects.list_all()?)
    }
}

pub struct SnapshotService {
    projects: Arc<dyn ProjectRepository>,
    snapshots: Arc<dyn SnapshotRepository>,
    queue: Arc<InMemoryQueue>,
}

impl SnapshotService {
    pub fn new(
        projects: Arc<dyn ProjectRepository>,
        snapshots: Arc<dyn SnapshotRepository>,
        queue: Arc<InMemoryQueue>,
    ) -> Self {
        Self {
            projects,
            snapshots,
            queue,
        }
    }

    /// Create a pending snapshot for an existing project and enqueue its
    /// capture job.
    ///
    /// The project-existence check here is the foreign-key contract the
    /// snapshot entity itself does not enforce.
    pub fn create(&self, project_id: ProjectId, full_scan: bool) -> ServiceResult<Snapshot> {
        let project = self
            .projects
            .find_by_uuid(project_id)?
            .ok_or(DomainError::NotFound)?;

        let snapshot = Snapshot::create(project_id, full_scan);
        self.snapshots.save(project_id, &snapshot)?;

        let payload = SnapshotJobPayload {
            project_uuid: project_id,
            snapshot_uuid: snapshot.uuid(),
            url: project.url().to_string(),
        };
        let job_type = if full_scan {
            JobType::SnapshotCrawl
        } else {
            JobType::SnapshotSingle
        };
        let payload = payload.to_value().map_err(RepositoryError::from)?;
        let job_id = self.queue.enqueue(Job::new(job_type, payload));

        info!(
            job_id = %job_id,
            snapshot = %snapshot.uuid(),
            project = %project_id,
            full_scan,
            "snapshot job enqueued"
        );
        Ok(snapshot)
    }

    pub fn find(
        &self,
        project_id: ProjectId,
        snapshot_id: SnapshotId,
    ) -> ServiceResult<Option<Snapshot>> {
        Ok(self.snapshots.find_by_uuid(project_id, snapshot_id)?)
    }

    pub fn list_by_project(&self, project_id: ProjectId) -> ServiceResult<Vec<Snapshot>> {
        Ok(self.snapshots.list_by_project(project_id)?)
    }
}

/// Everything the route handlers need, wired once at startup.
pub struct AppServices {
    pub projects: ProjectService,
    pub snapshots: SnapshotService,
    pub queue: Arc<InMemoryQueue>,
}

impl AppServices {
    pub fn new(
        projects: Arc<dyn ProjectRepository>,
        snapshots: Arc<dyn SnapshotRepository>,
        queue: Arc<InMemoryQueue>,
    ) -> Self {
        Self {
            projects: ProjectService::new(projects.clone()),
            snapshots: SnapshotService::new(projects, snapshots, queue.clone()),
            queue,
        }
    }
}
