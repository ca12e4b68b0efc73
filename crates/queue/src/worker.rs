//! Polling worker loop: claims jobs, dispatches to type handlers, applies
//! the retry/terminal policy.

use std::collections::HashMap;
use std::sync::{Arc, mpsc};
use std::thread;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::job::{Job, JobType};
use crate::queue::InMemoryQueue;

/// Job handler function type.
///
/// A handler receives the claimed job (payload included) and reports success
/// or an error; errors drive the retry policy and never escape the loop.
pub type JobHandler = Box<dyn Fn(&Job) -> anyhow::Result<()> + Send + Sync>;

/// Hook invoked after a job transition has been applied and written back.
///
/// This is how job outcomes propagate to the entities the job was executing
/// for (snapshot/project status), without the queue core knowing about them.
pub trait JobObserver: Send + Sync {
    fn on_completed(&self, _job: &Job) {}
    fn on_retrying(&self, _job: &Job) {}
    fn on_failed(&self, _job: &Job) {}
}

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// How long to wait between iterations.
    pub poll_interval: Duration,
    /// Thread name, for logging.
    pub name: String,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(500),
            name: "capture-worker".to_string(),
        }
    }
}

/// Handle to control a running worker.
#[derive(Debug)]
pub struct WorkerHandle {
    shutdown: mpsc::Sender<()>,
    join: Option<thread::JoinHandle<()>>,
}

impl WorkerHandle {
    /// Request graceful shutdown and wait for the worker to stop.
    ///
    /// The in-flight iteration completes first; no job is forcibly aborted.
    pub fn shutdown(mut self) {
        let _ = self.shutdown.send(());
        if let Some(j) = self.join.take() {
            let _ = j.join();
        }
    }
}

/// Drives jobs from the queue to completion or terminal failure.
///
/// Single-threaded cooperative polling: one job per iteration, executed as a
/// blocking call. A hung handler blocks all subsequent processing; there is
/// no per-job timeout.
pub struct Worker {
    queue: Arc<InMemoryQueue>,
    handlers: HashMap<JobType, JobHandler>,
    observer: Option<Arc<dyn JobObserver>>,
}

impl Worker {
    pub fn new(queue: Arc<InMemoryQueue>) -> Self {
        Self {
            queue,
            handlers: HashMap::new(),
            observer: None,
        }
    }

    /// Register the handler for a job type.
    pub fn register_handler<F>(&mut self, job_type: JobType, handler: F)
    where
        F: Fn(&Job) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.handlers.insert(job_type, Box::new(handler));
    }

    pub fn set_observer(&mut self, observer: Arc<dyn JobObserver>) {
        self.observer = Some(observer);
    }

    /// Claim and execute at most one job.
    ///
    /// Returns `false` when nothing was claimable. Public so tests can drive
    /// the loop synchronously.
    pub fn process_next(&self) -> bool {
        let Some(mut job) = self.queue.dequeue() else {
            return false;
        };
        debug!(job_id = %job.id, job_type = ?job.job_type, "claimed job");

        let Some(handler) = self.handlers.get(&job.job_type) else {
            // An unroutable job can never succeed; fail fast without
            // consuming retries.
            warn!(job_id = %job.id, job_type = ?job.job_type, "no handler registered");
            job.mark_failed();
            self.write_back(&job);
            self.notify(|o| o.on_failed(&job));
            return true;
        };

        match handler(&job) {
            Ok(()) => {
                job.mark_completed();
                self.write_back(&job);
                debug!(job_id = %job.id, "job completed");
                self.notify(|o| o.on_completed(&job));
            }
            Err(error) if job.can_retry() => {
                job.mark_for_retry();
                self.write_back(&job);
                info!(
                    job_id = %job.id,
                    error = %error,
                    attempt = job.retry_count,
                    max_retries = job.max_retries,
                    "job failed, will retry"
                );
                self.notify(|o| o.on_retrying(&job));
            }
            Err(error) => {
                job.mark_failed();
                self.write_back(&job);
                warn!(
                    job_id = %job.id,
                    error = %error,
                    attempts = job.retry_count,
                    "retries exhausted, job failed"
                );
                self.notify(|o| o.on_failed(&job));
            }
        }

        true
    }

    /// Run the worker on a dedicated thread until shut down.
    pub fn spawn(self, config: WorkerConfig) -> WorkerHandle {
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();
        let name = config.name.clone();

        let join = thread::Builder::new()
            .name(name)
            .spawn(move || worker_loop(self, config, shutdown_rx))
            .expect("failed to spawn worker thread");

        WorkerHandle {
            shutdown: shutdown_tx,
            join: Some(join),
        }
    }

    fn write_back(&self, job: &Job) {
        if !self.queue.update(job) {
            warn!(job_id = %job.id, "job vanished from queue during execution");
        }
    }

    fn notify(&self, f: impl FnOnce(&dyn JobObserver)) {
        if let Some(observer) = &self.observer {
            f(observer.as_ref());
        }
    }
}

fn worker_loop(worker: Worker, config: WorkerConfig, shutdown_rx: mpsc::Receiver<()>) {
    info!(worker = %config.name, poll_ms = config.poll_interval.as_millis() as u64, "worker started");

    loop {
        worker.process_next();

        // One suspension point: the poll sleep doubles as the stop check.
        match shutdown_rx.recv_timeout(config.poll_interval) {
            Ok(()) | Err(mpsc::RecvTimeoutError::Disconnected) => break,
            Err(mpsc::RecvTimeoutError::Timeout) => continue,
        }
    }

    info!(worker = %config.name, "worker stopped");
}
