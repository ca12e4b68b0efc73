use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use pixelproof_core::{Entity, ProjectId, SnapshotId};

/// Snapshot status lifecycle.
///
/// `Queued` is a recognized value no current flow sets (a snapshot stays
/// `Pending` between save and first claim); kept as an extension point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SnapshotStatus {
    Pending,
    Queued,
    InProgress,
    Completed,
    Partial,
    Failed,
}

impl SnapshotStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SnapshotStatus::Completed | SnapshotStatus::Partial | SnapshotStatus::Failed
        )
    }
}

/// One capture run against a project.
///
/// `full_scan` selects whole-domain crawl over single-page capture. The
/// referenced project must exist at creation time; that cross-entity check is
/// the service layer's contract, not enforced here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    uuid: SnapshotId,
    project_uuid: ProjectId,
    full_scan: bool,
    status: SnapshotStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Snapshot {
    /// Create a new pending snapshot.
    pub fn create(project_uuid: ProjectId, full_scan: bool) -> Self {
        let now = Utc::now();
        Self {
            uuid: SnapshotId::new(),
            project_uuid,
            full_scan,
            status: SnapshotStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    /// Rebuild a snapshot from trusted storage; no validation.
    pub fn restore(
        uuid: SnapshotId,
        project_uuid: ProjectId,
        full_scan: bool,
        status: SnapshotStatus,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            uuid,
            project_uuid,
            full_scan,
            status,
            created_at,
            updated_at,
        }
    }

    pub fn uuid(&self) -> SnapshotId {
        self.uuid
    }

    pub fn project_uuid(&self) -> ProjectId {
        self.project_uuid
    }

    pub fn full_scan(&self) -> bool {
        self.full_scan
    }

    pub fn status(&self) -> SnapshotStatus {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Execution has started.
    pub fn mark_in_progress(&mut self) {
        self.set_status(SnapshotStatus::InProgress);
    }

    /// Capture finished with every page succeeding.
    pub fn mark_completed(&mut self) {
        self.set_status(SnapshotStatus::Completed);
    }

    /// Capture finished, but some pages failed.
    pub fn mark_partial(&mut self) {
        self.set_status(SnapshotStatus::Partial);
    }

    /// Capture failed terminally.
    pub fn mark_failed(&mut self) {
        self.set_status(SnapshotStatus::Failed);
    }

    fn set_status(&mut self, status: SnapshotStatus) {
        self.status = status;
        self.updated_at = Utc::now();
    }
}

impl Entity for Snapshot {
    type Id = SnapshotId;

    fn id(&self) -> &Self::Id {
        &self.uuid
    }
}
