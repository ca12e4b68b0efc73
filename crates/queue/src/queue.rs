//! In-memory job queue with exclusive claim semantics.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde::Serialize;

use pixelproof_core::JobId;

use crate::job::{Job, JobStatus};

/// Per-status job counts, for the jobs API.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct QueueStats {
    pub pending: usize,
    pub running: usize,
    pub completed: usize,
    pub failed: usize,
    pub retrying: usize,
    pub cancelled: usize,
}

#[derive(Debug, Default)]
struct QueueInner {
    jobs: HashMap<JobId, Job>,
    /// Enqueue order; claims are FIFO within the claimable population.
    order: Vec<JobId>,
}

/// Holds all known jobs keyed by identifier.
///
/// An explicitly owned object: inject it (as `Arc<InMemoryQueue>`) into the
/// worker and into whatever enqueues jobs, never a process-wide singleton, so
/// independent queues can coexist in tests.
///
/// The single mutex makes claims exclusive and atomic with the status flip;
/// that is the sole concurrency guarantee offered. The O(n) claimable scan is
/// accepted at single-process dispatcher scale.
#[derive(Debug, Default)]
pub struct InMemoryQueue {
    inner: Mutex<QueueInner>,
}

impl InMemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arc() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Insert a job keyed by its own identifier.
    ///
    /// A duplicate identifier overwrites the stored job in place, keeping its
    /// original position in the enqueue order. Not expected in normal
    /// operation since identifiers are unique at creation.
    pub fn enqueue(&self, job: Job) -> JobId {
        let mut inner = self.inner.lock().unwrap();
        let id = job.id;
        if inner.jobs.insert(id, job).is_none() {
            inner.order.push(id);
        }
        id
    }

    /// Claim the next claimable job, atomically flipping it to `Running`.
    ///
    /// Scans in enqueue order and takes the first `Pending` or `Retrying`
    /// job. Two concurrent calls never return the same job. Returns `None`
    /// when nothing is claimable.
    pub fn dequeue(&self) -> Option<Job> {
        let mut inner = self.inner.lock().unwrap();
        let inner = &mut *inner;

        let id = inner
            .order
            .iter()
            .copied()
            .find(|id| {
                inner
                    .jobs
                    .get(id)
                    .is_some_and(|job| job.status.is_claimable())
            })?;

        let job = inner.jobs.get_mut(&id)?;
        job.mark_running();
        Some(job.clone())
    }

    /// Point lookup, no status filtering.
    pub fn get_job(&self, id: JobId) -> Option<Job> {
        self.inner.lock().unwrap().jobs.get(&id).cloned()
    }

    /// All jobs in enqueue order, optionally filtered by status.
    pub fn list_jobs(&self, filter: Option<JobStatus>) -> Vec<Job> {
        let inner = self.inner.lock().unwrap();
        inner
            .order
            .iter()
            .filter_map(|id| inner.jobs.get(id))
            .filter(|job| filter.is_none_or(|status| job.status == status))
            .cloned()
            .collect()
    }

    /// Write back a claimed job's mutated state.
    ///
    /// `dequeue` hands out clones, so the worker pushes transitions back here.
    /// Returns `false` if the identifier is unknown.
    pub fn update(&self, job: &Job) -> bool {
        let mut inner = self.inner.lock().unwrap();
        if inner.jobs.contains_key(&job.id) {
            inner.jobs.insert(job.id, job.clone());
            true
        } else {
            false
        }
    }

    pub fn stats(&self) -> QueueStats {
        let inner = self.inner.lock().unwrap();
        let mut stats = QueueStats::default();
        for job in inner.jobs.values() {
            match job.status {
                JobStatus::Pending => stats.pending += 1,
                JobStatus::Running => stats.running += 1,
                JobStatus::Completed => stats.completed += 1,
                JobStatus::Failed => stats.failed += 1,
                JobStatus::Retrying => stats.retrying += 1,
                JobStatus::Cancelled => stats.cancelled += 1,
            }
        }
        stats
    }
}
