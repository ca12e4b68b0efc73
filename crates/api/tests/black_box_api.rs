use std::time::Duration;

use reqwest::StatusCode;
use serde_json::json;

use pixelproof_api::app::{AppConfig, build_app};
use pixelproof_queue::WorkerHandle;

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
    worker: Option<WorkerHandle>,
    _data_dir: tempfile::TempDir,
}

impl TestServer {
    async fn spawn() -> Self {
        // Build the same app as prod, against a throwaway data dir and a
        // fast-polling worker, bound to an ephemeral port.
        let data_dir = tempfile::tempdir().unwrap();
        let app = build_app(AppConfig {
            data_dir: data_dir.path().to_path_buf(),
            poll_interval: Duration::from_millis(10),
        });

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app.router).await.unwrap();
        });

        Self {
            base_url,
            handle,
            worker: Some(app.worker),
            _data_dir: data_dir,
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
        if let Some(worker) = self.worker.take() {
            worker.shutdown();
        }
    }
}

async fn create_project(
    client: &reqwest::Client,
    base_url: &str,
    name: &str,
) -> serde_json::Value {
    let res = client
        .post(format!("{}/api/projects", base_url))
        .json(&json!({ "name": name, "url": "https://example.com" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    res.json().await.unwrap()
}

/// The job pipeline is asynchronous; poll until the snapshot reaches the
/// expected status.
async fn snapshot_status_eventually(
    client: &reqwest::Client,
    base_url: &str,
    project_uuid: &str,
    snapshot_uuid: &str,
    expected: &str,
) -> serde_json::Value {
    for _ in 0..100 {
        let res = client
            .get(format!(
                "{}/api/projects/{}/snapshots/{}",
                base_url, project_uuid, snapshot_uuid
            ))
            .send()
            .await
            .unwrap();

        if res.status() == StatusCode::OK {
            let body: serde_json::Value = res.json().await.unwrap();
            if body["status"] == expected {
                return body;
            }
        }

        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    panic!("snapshot did not reach status {expected} within timeout");
}

#[tokio::test]
async fn health_endpoint_responds() {
    let srv = TestServer::spawn().await;

    let client = reqwest::Client::new();
    let res = client
        .get(format!("{}/health", srv.base_url))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn project_create_and_fetch_by_uuid_or_name() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let created = create_project(&client, &srv.base_url, "my-site").await;
    assert_eq!(created["name"], "my-site");
    assert_eq!(created["status"], "CREATED");
    let uuid = created["uuid"].as_str().unwrap();

    for identifier in [uuid, "my-site"] {
        let res = client
            .get(format!("{}/api/projects/{}", srv.base_url, identifier))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let body: serde_json::Value = res.json().await.unwrap();
        assert_eq!(body["uuid"].as_str().unwrap(), uuid);
    }

    let res = client
        .get(format!("{}/api/projects/nobody-here", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn project_validation_failures_are_rejected() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let cases = [
        (json!({ "name": "bad name!", "url": "https://example.com" }), "alphanumeric"),
        (json!({ "name": "", "url": "https://example.com" }), "required"),
        (json!({ "name": "site", "url": "ftp://example.com" }), "http or https"),
        (json!({ "name": "site", "url": "not a url" }), "invalid URL"),
    ];

    for (body, expected_fragment) in cases {
        let res = client
            .post(format!("{}/api/projects", srv.base_url))
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let err: serde_json::Value = res.json().await.unwrap();
        assert_eq!(err["error"], "validation_error");
        assert!(
            err["message"].as_str().unwrap().contains(expected_fragment),
            "unexpected message: {}",
            err["message"]
        );
    }
}

#[tokio::test]
async fn duplicate_project_name_conflicts() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    create_project(&client, &srv.base_url, "taken").await;

    let res = client
        .post(format!("{}/api/projects", srv.base_url))
        .json(&json!({ "name": "taken", "url": "https://example.com" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn project_listing_returns_summaries() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    create_project(&client, &srv.base_url, "one").await;
    create_project(&client, &srv.base_url, "two").await;

    let res = client
        .get(format!("{}/api/projects", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    let projects = body["projects"].as_array().unwrap();
    assert_eq!(projects.len(), 2);
    assert!(projects.iter().all(|p| p.get("uuid").is_some()));
    // Summaries omit the URL.
    assert!(projects.iter().all(|p| p.get("url").is_none()));
}

#[tokio::test]
async fn snapshot_lifecycle_runs_to_completion() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let project = create_project(&client, &srv.base_url, "captured").await;
    let project_uuid = project["uuid"].as_str().unwrap();

    let res = client
        .post(format!("{}/api/snapshots", srv.base_url))
        .json(&json!({ "projectId": project_uuid, "fullScan": false }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let created: serde_json::Value = res.json().await.unwrap();
    assert_eq!(created["projectUuid"].as_str().unwrap(), project_uuid);
    let snapshot_uuid = created["snapshotUuid"].as_str().unwrap().to_string();

    // The worker claims, executes, and completes the capture job.
    snapshot_status_eventually(
        &client,
        &srv.base_url,
        project_uuid,
        &snapshot_uuid,
        "COMPLETED",
    )
    .await;

    // The job surface reflects the terminal outcome. The job status flips
    // just after the snapshot record is saved, so poll briefly.
    let mut jobs = serde_json::Value::Null;
    for _ in 0..100 {
        let res = client
            .get(format!("{}/api/jobs?status=COMPLETED", srv.base_url))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let body: serde_json::Value = res.json().await.unwrap();
        if body["jobs"].as_array().unwrap().len() == 1 {
            jobs = body["jobs"].clone();
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    let jobs = jobs.as_array().expect("job did not complete within timeout");
    assert_eq!(jobs[0]["type"], "SNAPSHOT_SINGLE");
    assert_eq!(jobs[0]["retry_count"], 0);

    let res = client
        .get(format!("{}/api/jobs/stats", srv.base_url))
        .send()
        .await
        .unwrap();
    let stats: serde_json::Value = res.json().await.unwrap();
    assert_eq!(stats["completed"], 1);

    // The project rode along to COMPLETED as well.
    let res = client
        .get(format!("{}/api/projects/{}", srv.base_url, project_uuid))
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["status"], "COMPLETED");
}

#[tokio::test]
async fn snapshot_listing_by_project() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let project = create_project(&client, &srv.base_url, "listed").await;
    let project_uuid = project["uuid"].as_str().unwrap();

    for full_scan in [false, true] {
        let res = client
            .post(format!("{}/api/snapshots", srv.base_url))
            .json(&json!({ "projectId": project_uuid, "fullScan": full_scan }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);
    }

    let res = client
        .get(format!(
            "{}/api/projects/{}/snapshots",
            srv.base_url, project_uuid
        ))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["snapshots"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn snapshot_for_unknown_project_is_404() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/api/snapshots", srv.base_url))
        .json(&json!({
            "projectId": "0198a000-0000-7000-8000-000000000000",
            "fullScan": false
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = client
        .post(format!("{}/api/snapshots", srv.base_url))
        .json(&json!({ "projectId": "not-a-uuid" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn jobs_api_rejects_unknown_status_filter() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/api/jobs?status=WAITING", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = client
        .get(format!("{}/api/jobs/not-a-uuid", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}
