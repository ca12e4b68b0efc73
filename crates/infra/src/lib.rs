//! Infrastructure: durable storage for projects/snapshots and the capture
//! job handlers that bridge queue outcomes back into entity state.

pub mod capture;
pub mod fs_store;
pub mod repository;

pub use capture::{CaptureReport, CaptureRunner, SnapshotJobPayload};
pub use fs_store::{FilesystemProjectRepository, FilesystemSnapshotRepository};
pub use repository::{ProjectRepository, RepoResult, RepositoryError, SnapshotRepository};
