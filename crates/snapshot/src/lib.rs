//! Snapshot domain: a single capture run (single-page or full-domain)
//! belonging to a project.

pub mod snapshot;

pub use snapshot::{Snapshot, SnapshotStatus};
