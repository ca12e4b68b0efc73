//! Capture job handlers and the wiring from job outcomes back into
//! snapshot/project state.
//!
//! The actual browser capture/crawl is a named placeholder; everything
//! around it (payload schema, state transitions, failure propagation) is the
//! real contract the future engine slots into.

use std::sync::Arc;

use anyhow::{Context, anyhow};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use pixelproof_core::{ProjectId, SnapshotId};
use pixelproof_project::ProjectStatus;
use pixelproof_queue::{Job, JobObserver};

use crate::repository::{ProjectRepository, SnapshotRepository};

/// Payload agreed between the enqueue side (snapshot service) and the
/// execute side (capture runner).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotJobPayload {
    pub project_uuid: ProjectId,
    pub snapshot_uuid: SnapshotId,
    pub url: String,
}

impl SnapshotJobPayload {
    pub fn to_value(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }

    pub fn from_value(value: &serde_json::Value) -> serde_json::Result<Self> {
        Self::deserialize(value)
    }
}

/// Page counts produced by a capture run; decides `Completed` vs `Partial`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CaptureReport {
    pub pages_captured: u32,
    pub pages_failed: u32,
}

/// Capture a single page.
///
/// Placeholder for the browser automation engine; deterministic until that
/// lands.
pub fn capture_page(url: &str) -> anyhow::Result<CaptureReport> {
    debug!(url, "capturing single page");
    Ok(CaptureReport {
        pages_captured: 1,
        pages_failed: 0,
    })
}

/// Crawl the whole domain and capture every discovered page.
///
/// Placeholder, same as [`capture_page`].
pub fn crawl_site(url: &str) -> anyhow::Result<CaptureReport> {
    debug!(url, "crawling site");
    Ok(CaptureReport {
        pages_captured: 5,
        pages_failed: 0,
    })
}

/// Executes capture jobs and reflects their outcome onto the snapshot and
/// project the job was raised for.
///
/// Handler errors (malformed payload, missing snapshot record, capture
/// failure) flow back to the worker and its retry policy; this type never
/// decides retry vs terminal itself.
pub struct CaptureRunner {
    projects: Arc<dyn ProjectRepository>,
    snapshots: Arc<dyn SnapshotRepository>,
}

impl CaptureRunner {
    pub fn new(
        projects: Arc<dyn ProjectRepository>,
        snapshots: Arc<dyn SnapshotRepository>,
    ) -> Self {
        Self {
            projects,
            snapshots,
        }
    }

    /// Handler for `SNAPSHOT_SINGLE` jobs.
    pub fn run_single(&self, job: &Job) -> anyhow::Result<()> {
        self.run(job, capture_page)
    }

    /// Handler for `SNAPSHOT_CRAWL` jobs.
    pub fn run_crawl(&self, job: &Job) -> anyhow::Result<()> {
        self.run(job, crawl_site)
    }

    fn run(
        &self,
        job: &Job,
        capture: fn(&str) -> anyhow::Result<CaptureReport>,
    ) -> anyhow::Result<()> {
        let payload = SnapshotJobPayload::from_value(&job.payload)
            .context("malformed snapshot job payload")?;

        let mut snapshot = self
            .snapshots
            .find_by_uuid(payload.project_uuid, payload.snapshot_uuid)?
            .ok_or_else(|| anyhow!("snapshot {} not found", payload.snapshot_uuid))?;

        snapshot.mark_in_progress();
        self.snapshots.save(payload.project_uuid, &snapshot)?;

        if let Some(mut project) = self.projects.find_by_uuid(payload.project_uuid)? {
            project.update_status(ProjectStatus::Running);
            self.projects.save(&project)?;
        }

        let report = capture(&payload.url)?;

        if report.pages_failed > 0 {
            snapshot.mark_partial();
        } else {
            snapshot.mark_completed();
        }
        self.snapshots.save(payload.project_uuid, &snapshot)?;

        if let Some(mut project) = self.projects.find_by_uuid(payload.project_uuid)? {
            project.update_status(ProjectStatus::Completed);
            self.projects.save(&project)?;
        }

        info!(
            snapshot = %payload.snapshot_uuid,
            pages_captured = report.pages_captured,
            pages_failed = report.pages_failed,
            "capture finished"
        );
        Ok(())
    }
}

impl JobObserver for CaptureRunner {
    /// Terminal job failure: mark the snapshot and project failed.
    ///
    /// A *retrying* job deliberately gets no callback effect here; the
    /// snapshot stays `InProgress` for the next attempt.
    fn on_failed(&self, job: &Job) {
        let Ok(payload) = SnapshotJobPayload::from_value(&job.payload) else {
            warn!(job_id = %job.id, "failed job carried malformed payload");
            return;
        };

        match self
            .snapshots
            .find_by_uuid(payload.project_uuid, payload.snapshot_uuid)
        {
            Ok(Some(mut snapshot)) => {
                snapshot.mark_failed();
                if let Err(e) = self.snapshots.save(payload.project_uuid, &snapshot) {
                    error!(snapshot = %payload.snapshot_uuid, error = %e, "failed to persist snapshot failure");
                }
            }
            Ok(None) => {
                warn!(snapshot = %payload.snapshot_uuid, "failed job references unknown snapshot");
            }
            Err(e) => {
                error!(snapshot = %payload.snapshot_uuid, error = %e, "failed to load snapshot for failure marking");
            }
        }

        match self.projects.find_by_uuid(payload.project_uuid) {
            Ok(Some(mut project)) => {
                project.update_status(ProjectStatus::Failed);
                if let Err(e) = self.projects.save(&project) {
                    error!(project = %payload.project_uuid, error = %e, "failed to persist project failure");
                }
            }
            Ok(None) => {}
            Err(e) => {
                error!(project = %payload.project_uuid, error = %e, "failed to load project for failure marking");
            }
        }
    }
}
