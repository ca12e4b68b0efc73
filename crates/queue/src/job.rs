//! Core job types and retry bookkeeping.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use pixelproof_core::{Entity, JobId};

/// Retry ceiling applied when a job is created without an explicit one.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Job kind, used to route a claimed job to its handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobType {
    /// Capture a single page.
    SnapshotSingle,
    /// Crawl and capture the whole domain.
    SnapshotCrawl,
}

/// Job execution status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    /// Waiting to be claimed.
    Pending,
    /// Claimed by a worker, executing.
    Running,
    /// Finished successfully.
    Completed,
    /// Exhausted retries (or failed fast); terminal.
    Failed,
    /// Failed but eligible for another attempt.
    Retrying,
    /// Cancelled; terminal. No operation currently produces this status —
    /// it is an extension point.
    Cancelled,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Failed | JobStatus::Cancelled
        )
    }

    /// Whether `dequeue` may claim a job in this status.
    ///
    /// `Retrying` is PENDING-equivalent: a retried job re-enters the
    /// claimable pool through its write-back, with no separate re-enqueue
    /// step.
    pub fn is_claimable(&self) -> bool {
        matches!(self, JobStatus::Pending | JobStatus::Retrying)
    }
}

/// A unit of asynchronous work.
///
/// The payload is opaque here; only the handler registered for `job_type`
/// interprets it. Transitions are unconditional and the entity does not
/// self-enforce the retry ceiling — callers check [`Job::can_retry`] first,
/// so custom exhaustion policies stay expressible.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    #[serde(rename = "type")]
    pub job_type: JobType,
    pub payload: serde_json::Value,
    pub status: JobStatus,
    pub retry_count: u32,
    pub max_retries: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    /// Create a new pending job with the default retry ceiling.
    pub fn new(job_type: JobType, payload: serde_json::Value) -> Self {
        let now = Utc::now();
        Self {
            id: JobId::new(),
            job_type,
            payload,
            status: JobStatus::Pending,
            retry_count: 0,
            max_retries: DEFAULT_MAX_RETRIES,
            created_at: now,
            updated_at: now,
        }
    }

    /// Override the retry ceiling.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn mark_running(&mut self) {
        self.status = JobStatus::Running;
        self.touch();
    }

    pub fn mark_completed(&mut self) {
        self.status = JobStatus::Completed;
        self.touch();
    }

    pub fn mark_failed(&mut self) {
        self.status = JobStatus::Failed;
        self.touch();
    }

    /// Record another attempt and return to the claimable pool.
    ///
    /// Does not consult the retry ceiling; that decision belongs to the
    /// caller via [`Job::can_retry`].
    pub fn mark_for_retry(&mut self) {
        self.retry_count += 1;
        self.status = JobStatus::Retrying;
        self.touch();
    }

    /// True while attempts remain below the retry ceiling.
    pub fn can_retry(&self) -> bool {
        self.retry_count < self.max_retries
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

impl Entity for Job {
    type Id = JobId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
