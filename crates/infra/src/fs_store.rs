//! Filesystem-backed repositories.
//!
//! Layout:
//! - `<root>/projects/<uuid>/project.json`
//! - `<root>/projects/<project_uuid>/snapshots/<uuid>/index.json`
//!
//! Records carry every entity attribute (timestamps RFC 3339, statuses as
//! their string names) and rehydrate through the entities' `restore`
//! factories, bypassing constructor validation by design.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use pixelproof_core::{ProjectId, SnapshotId};
use pixelproof_project::{Project, ProjectStatus};
use pixelproof_snapshot::{Snapshot, SnapshotStatus};

use crate::repository::{ProjectRepository, RepoResult, SnapshotRepository};

const PROJECT_FILE: &str = "project.json";
const SNAPSHOT_FILE: &str = "index.json";

#[derive(Debug, Serialize, Deserialize)]
struct ProjectRecord {
    uuid: ProjectId,
    name: String,
    url: String,
    status: ProjectStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ProjectRecord {
    fn from_entity(project: &Project) -> Self {
        Self {
            uuid: project.uuid(),
            name: project.name().to_string(),
            url: project.url().to_string(),
            status: project.status(),
            created_at: project.created_at(),
            updated_at: project.updated_at(),
        }
    }

    fn into_entity(self) -> Project {
        Project::restore(
            self.uuid,
            self.name,
            self.url,
            self.status,
            self.created_at,
            self.updated_at,
        )
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct SnapshotRecord {
    uuid: SnapshotId,
    project_uuid: ProjectId,
    full_scan: bool,
    status: SnapshotStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl SnapshotRecord {
    fn from_entity(snapshot: &Snapshot) -> Self {
        Self {
            uuid: snapshot.uuid(),
            project_uuid: snapshot.project_uuid(),
            full_scan: snapshot.full_scan(),
            status: snapshot.status(),
            created_at: snapshot.created_at(),
            updated_at: snapshot.updated_at(),
        }
    }

    fn into_entity(self) -> Snapshot {
        Snapshot::restore(
            self.uuid,
            self.project_uuid,
            self.full_scan,
            self.status,
            self.created_at,
            self.updated_at,
        )
    }
}

fn write_record<T: Serialize>(path: &Path, record: &T) -> RepoResult<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    let bytes = serde_json::to_vec_pretty(record)?;
    fs::write(path, bytes)?;
    Ok(())
}

fn read_record<T: for<'de> Deserialize<'de>>(path: &Path) -> RepoResult<Option<T>> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    Ok(Some(serde_json::from_slice(&bytes)?))
}

/// Subdirectories of `dir`, empty when `dir` itself is missing.
fn subdirs(dir: &Path) -> RepoResult<Vec<PathBuf>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut dirs = Vec::new();
    for entry in entries {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            dirs.push(entry.path());
        }
    }
    Ok(dirs)
}

/// Stores each project as pretty-printed JSON in its own directory.
#[derive(Debug)]
pub struct FilesystemProjectRepository {
    root: PathBuf,
}

impl FilesystemProjectRepository {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn projects_dir(&self) -> PathBuf {
        self.root.join("projects")
    }

    fn project_file(&self, id: ProjectId) -> PathBuf {
        self.projects_dir().join(id.to_string()).join(PROJECT_FILE)
    }
}

impl ProjectRepository for FilesystemProjectRepository {
    fn save(&self, project: &Project) -> RepoResult<()> {
        write_record(
            &self.project_file(project.uuid()),
            &ProjectRecord::from_entity(project),
        )
    }

    fn find_by_uuid(&self, id: ProjectId) -> RepoResult<Option<Project>> {
        let record: Option<ProjectRecord> = read_record(&self.project_file(id))?;
        Ok(record.map(ProjectRecord::into_entity))
    }

    fn find_by_name(&self, name: &str) -> RepoResult<Option<Project>> {
        Ok(self
            .list_all()?
            .into_iter()
            .find(|project| project.name() == name))
    }

    fn list_all(&self) -> RepoResult<Vec<Project>> {
        let mut projects = Vec::new();
        for dir in subdirs(&self.projects_dir())? {
            match read_record::<ProjectRecord>(&dir.join(PROJECT_FILE))? {
                Some(record) => projects.push(record.into_entity()),
                None => {
                    // A project directory without its record is likely a
                    // half-finished save; skip it rather than fail the list.
                    warn!(dir = %dir.display(), "project directory without record");
                }
            }
        }
        projects.sort_by_key(Project::created_at);
        Ok(projects)
    }
}

/// Stores each snapshot under its project's directory.
#[derive(Debug)]
pub struct FilesystemSnapshotRepository {
    root: PathBuf,
}

impl FilesystemSnapshotRepository {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn snapshots_dir(&self, project_id: ProjectId) -> PathBuf {
        self.root
            .join("projects")
            .join(project_id.to_string())
            .join("snapshots")
    }

    fn snapshot_file(&self, project_id: ProjectId, snapshot_id: SnapshotId) -> PathBuf {
        self.snapshots_dir(project_id)
            .join(snapshot_id.to_string())
            .join(SNAPSHOT_FILE)
    }
}

impl SnapshotRepository for FilesystemSnapshotRepository {
    fn save(&self, project_id: ProjectId, snapshot: &Snapshot) -> RepoResult<()> {
        write_record(
            &self.snapshot_file(project_id, snapshot.uuid()),
            &SnapshotRecord::from_entity(snapshot),
        )
    }

    fn find_by_uuid(
        &self,
        project_id: ProjectId,
        snapshot_id: SnapshotId,
    ) -> RepoResult<Option<Snapshot>> {
        let record: Option<SnapshotRecord> =
            read_record(&self.snapshot_file(project_id, snapshot_id))?;
        Ok(record.map(SnapshotRecord::into_entity))
    }

    fn list_by_project(&self, project_id: ProjectId) -> RepoResult<Vec<Snapshot>> {
        let mut snapshots = Vec::new();
        for dir in subdirs(&self.snapshots_dir(project_id))? {
            match read_record::<SnapshotRecord>(&dir.join(SNAPSHOT_FILE))? {
                Some(record) => snapshots.push(record.into_entity()),
                None => {
                    warn!(dir = %dir.display(), "snapshot directory without record");
                }
            }
        }
        snapshots.sort_by_key(Snapshot::created_at);
        Ok(snapshots)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repos() -> (
        tempfile::TempDir,
        FilesystemProjectRepository,
        FilesystemSnapshotRepository,
    ) {
        let dir = tempfile::tempdir().unwrap();
        let projects = FilesystemProjectRepository::new(dir.path());
        let snapshots = FilesystemSnapshotRepository::new(dir.path());
        (dir, projects, snapshots)
    }

    #[test]
    fn project_round_trip() {
        let (_dir, repo, _) = repos();
        let mut project = Project::create("my-site", "https://example.com").unwrap();
        project.update_status(ProjectStatus::Running);
        repo.save(&project).unwrap();

        let loaded = repo.find_by_uuid(project.uuid()).unwrap().unwrap();
        assert_eq!(loaded, project);
        assert_eq!(loaded.status(), ProjectStatus::Running);
    }

    #[test]
    fn save_overwrites_in_place() {
        let (_dir, repo, _) = repos();
        let mut project = Project::create("site", "https://example.com").unwrap();
        repo.save(&project).unwrap();

        project.update_status(ProjectStatus::Completed);
        repo.save(&project).unwrap();

        let all = repo.list_all().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].status(), ProjectStatus::Completed);
    }

    #[test]
    fn missing_project_is_absent_not_error() {
        let (_dir, repo, _) = repos();
        assert!(repo.find_by_uuid(ProjectId::new()).unwrap().is_none());
        assert!(repo.find_by_name("nobody").unwrap().is_none());
        assert!(repo.list_all().unwrap().is_empty());
    }

    #[test]
    fn find_by_name_matches_exactly() {
        let (_dir, repo, _) = repos();
        let a = Project::create("alpha", "https://a.example.com").unwrap();
        let b = Project::create("alpha-2", "https://b.example.com").unwrap();
        repo.save(&a).unwrap();
        repo.save(&b).unwrap();

        let found = repo.find_by_name("alpha").unwrap().unwrap();
        assert_eq!(found.uuid(), a.uuid());
        assert!(repo.find_by_name("alph").unwrap().is_none());
    }

    #[test]
    fn list_all_sorts_by_creation() {
        let (_dir, repo, _) = repos();
        let first = Project::create("first", "https://example.com").unwrap();
        let second = Project::create("second", "https://example.com").unwrap();
        // Save out of order.
        repo.save(&second).unwrap();
        repo.save(&first).unwrap();

        let names: Vec<_> = repo
            .list_all()
            .unwrap()
            .into_iter()
            .map(|p| p.name().to_string())
            .collect();
        assert_eq!(names, vec!["first", "second"]);
    }

    #[test]
    fn snapshot_round_trip_under_project() {
        let (_dir, projects, snapshots) = repos();
        let project = Project::create("site", "https://example.com").unwrap();
        projects.save(&project).unwrap();

        let mut snapshot = Snapshot::create(project.uuid(), true);
        snapshot.mark_in_progress();
        snapshots.save(project.uuid(), &snapshot).unwrap();

        let loaded = snapshots
            .find_by_uuid(project.uuid(), snapshot.uuid())
            .unwrap()
            .unwrap();
        assert_eq!(loaded, snapshot);
        assert_eq!(loaded.status(), SnapshotStatus::InProgress);

        let listed = snapshots.list_by_project(project.uuid()).unwrap();
        assert_eq!(listed.len(), 1);
    }

    #[test]
    fn snapshots_are_scoped_to_their_project() {
        let (_dir, _, snapshots) = repos();
        let project_a = ProjectId::new();
        let project_b = ProjectId::new();

        let snapshot = Snapshot::create(project_a, false);
        snapshots.save(project_a, &snapshot).unwrap();

        assert!(
            snapshots
                .find_by_uuid(project_b, snapshot.uuid())
                .unwrap()
                .is_none()
        );
        assert!(snapshots.list_by_project(project_b).unwrap().is_empty());
    }

    #[test]
    fn record_serializes_status_names_and_rfc3339() {
        let (dir, repo, _) = repos();
        let project = Project::create("site", "https://example.com").unwrap();
        repo.save(&project).unwrap();

        let path = dir
            .path()
            .join("projects")
            .join(project.uuid().to_string())
            .join("project.json");
        let raw: serde_json::Value =
            serde_json::from_slice(&std::fs::read(path).unwrap()).unwrap();

        assert_eq!(raw["status"], "CREATED");
        assert_eq!(raw["name"], "site");
        // chrono serializes DateTime<Utc> as RFC 3339.
        assert!(raw["created_at"].as_str().unwrap().contains('T'));
    }
}
