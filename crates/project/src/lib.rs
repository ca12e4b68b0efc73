//! Project domain: a monitored target (name + URL) under which snapshots are
//! grouped.

pub mod project;

pub use project::{MAX_NAME_LEN, Project, ProjectStatus};
