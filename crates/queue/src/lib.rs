//! Asynchronous job execution core: the job entity with its retry-aware
//! state machine, the in-memory claim queue, and the polling worker loop.

pub mod job;
pub mod queue;
pub mod worker;

pub use job::{DEFAULT_MAX_RETRIES, Job, JobStatus, JobType};
pub use queue::{InMemoryQueue, QueueStats};
pub use worker::{JobObserver, Worker, WorkerConfig, WorkerHandle};
