//! HTTP API application wiring (Axum router + service wiring).
//!
//! Layout:
//! - `services.rs`: project/snapshot services over the repositories + queue
//! - `routes/`: HTTP routes + handlers (one file per resource)
//! - `dto.rs`: request/response DTOs and JSON mapping helpers
//! - `errors.rs`: consistent error responses

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::{Extension, Router, routing::get};
use tower::ServiceBuilder;

use pixelproof_infra::{
    CaptureRunner, FilesystemProjectRepository, FilesystemSnapshotRepository, ProjectRepository,
    SnapshotRepository,
};
use pixelproof_queue::{InMemoryQueue, JobType, Worker, WorkerConfig, WorkerHandle};

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Runtime configuration for the application core.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Root directory for project/snapshot records.
    pub data_dir: PathBuf,
    /// Worker poll interval.
    pub poll_interval: Duration,
}

impl AppConfig {
    /// Read configuration from the environment (`DATA_DIR`,
    /// `POLL_INTERVAL_MS`), falling back to dev defaults.
    pub fn from_env() -> Self {
        let data_dir = std::env::var("DATA_DIR").unwrap_or_else(|_| "./data".to_string());
        let poll_ms = std::env::var("POLL_INTERVAL_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(500);
        Self {
            data_dir: PathBuf::from(data_dir),
            poll_interval: Duration::from_millis(poll_ms),
        }
    }
}

/// A fully wired application: router plus the running capture worker.
pub struct App {
    pub router: Router,
    pub worker: WorkerHandle,
}

/// Build the router and spawn the capture worker (public entrypoint used by
/// `main.rs` and the black-box tests).
///
/// All collaborators are constructor-injected: the queue, repositories, and
/// runner exist per application instance, so independent instances can
/// coexist in tests.
pub fn build_app(config: AppConfig) -> App {
    let projects: Arc<dyn ProjectRepository> =
        Arc::new(FilesystemProjectRepository::new(&config.data_dir));
    let snapshots: Arc<dyn SnapshotRepository> =
        Arc::new(FilesystemSnapshotRepository::new(&config.data_dir));
    let queue = InMemoryQueue::arc();
    let runner = Arc::new(CaptureRunner::new(projects.clone(), snapshots.clone()));

    let mut worker = Worker::new(queue.clone());
    {
        let runner = runner.clone();
        worker.register_handler(JobType::SnapshotSingle, move |job| runner.run_single(job));
    }
    {
        let runner = runner.clone();
        worker.register_handler(JobType::SnapshotCrawl, move |job| runner.run_crawl(job));
    }
    worker.set_observer(runner);

    let worker = worker.spawn(WorkerConfig {
        poll_interval: config.poll_interval,
        ..WorkerConfig::default()
    });

    let app_services = Arc::new(services::AppServices::new(projects, snapshots, queue));

    let router = Router::new()
        .route("/health", get(routes::system::health))
        .nest("/api", routes::router())
        .layer(ServiceBuilder::new().layer(Extension(app_services)));

    App { router, worker }
}
