use std::fs;
use std::net::TcpListener;
use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::json;
use tempfile::TempDir;
use vidsimplify_engine::{
    Category, FailureKind, InputType, JobService, NewJob, RemoteStatus, ReqwestJobService,
    ServiceSettings,
};
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn service_for(server: &MockServer) -> ReqwestJobService {
    ReqwestJobService::new(ServiceSettings {
        base_url: server.uri(),
        ..ServiceSettings::default()
    })
    .unwrap()
}

fn new_job() -> NewJob {
    NewJob {
        content: "explain recursion".into(),
        input_type: InputType::Text,
        category: Category::TechSystem,
    }
}

#[tokio::test]
async fn create_job_posts_payload_and_returns_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/videos"))
        .and(body_json(json!({
            "content": "explain recursion",
            "input_type": "text",
            "category": "tech_system",
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "job_id": "abc123",
            "status": "pending",
            "message": "Video generation started",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let job_id = service_for(&server).create_job(&new_job()).await.unwrap();
    assert_eq!(job_id, "abc123");
}

#[tokio::test]
async fn create_job_surfaces_service_detail() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/videos"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({"detail": "Content is required"})),
        )
        .mount(&server)
        .await;

    let err = service_for(&server)
        .create_job(&new_job())
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::HttpStatus(400));
    assert_eq!(err.message, "Content is required");
}

#[tokio::test]
async fn create_job_falls_back_to_body_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/videos"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .mount(&server)
        .await;

    let err = service_for(&server)
        .create_job(&new_job())
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::HttpStatus(502));
    assert_eq!(err.message, "bad gateway");
}

#[tokio::test]
async fn create_job_rejects_response_without_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/videos"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "pending"})))
        .mount(&server)
        .await;

    let err = service_for(&server)
        .create_job(&new_job())
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::MalformedResponse);
}

#[tokio::test]
async fn create_job_rejects_empty_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/videos"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"job_id": ""})))
        .mount(&server)
        .await;

    let err = service_for(&server)
        .create_job(&new_job())
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::MalformedResponse);
}

/// Base URL of a local port with nothing listening on it.
fn refused_base_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

#[tokio::test]
async fn unreachable_service_is_a_network_error() {
    let service = ReqwestJobService::new(ServiceSettings {
        base_url: refused_base_url(),
        ..ServiceSettings::default()
    })
    .unwrap();

    let err = service.create_job(&new_job()).await.unwrap_err();
    assert_eq!(err.kind, FailureKind::Network);

    let err = service.job_status("abc123").await.unwrap_err();
    assert_eq!(err.kind, FailureKind::Network);
}

#[tokio::test]
async fn slow_status_hits_request_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/jobs/abc123"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(250))
                .set_body_json(json!({})),
        )
        .mount(&server)
        .await;

    let service = ReqwestJobService::new(ServiceSettings {
        base_url: server.uri(),
        request_timeout: Some(Duration::from_millis(50)),
        ..ServiceSettings::default()
    })
    .unwrap();
    let err = service.job_status("abc123").await.unwrap_err();
    assert_eq!(err.kind, FailureKind::Timeout);
}

#[tokio::test]
async fn job_status_parses_progress_and_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/jobs/abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "job_id": "abc123",
            "status": "failed",
            "progress": {"percentage": 40.7, "message": "Rendering video..."},
            "created_at": "2026-10-19T08:00:00Z",
            "completed_at": null,
            "error": "render timeout",
        })))
        .mount(&server)
        .await;

    let job = service_for(&server).job_status("abc123").await.unwrap();
    assert_eq!(job.job_id, "abc123");
    assert_eq!(job.status, RemoteStatus::Failed);
    assert_eq!(job.percentage, 40);
    assert_eq!(job.message, "Rendering video...");
    assert_eq!(job.created_at, "2026-10-19T08:00:00Z");
    assert_eq!(job.failure_message(), "render timeout");
}

#[tokio::test]
async fn verifying_is_reported_as_rendering() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/jobs/abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "job_id": "abc123",
            "status": "verifying",
            "progress": {"percentage": 90, "message": "Checking output"},
            "created_at": "2026-10-19T08:00:00Z",
        })))
        .mount(&server)
        .await;

    let job = service_for(&server).job_status("abc123").await.unwrap();
    assert_eq!(job.status, RemoteStatus::Rendering);
    assert!(!job.status.is_terminal());
}

#[tokio::test]
async fn unknown_job_is_an_http_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/jobs/nope"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"detail": "Job not found"})))
        .mount(&server)
        .await;

    let err = service_for(&server).job_status("nope").await.unwrap_err();
    assert_eq!(err.kind, FailureKind::HttpStatus(404));
    assert_eq!(err.message, "Job not found");
}

#[tokio::test]
async fn health_reports_service_state() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "healthy",
            "timestamp": "2026-10-19T08:00:00Z",
        })))
        .mount(&server)
        .await;

    let health = service_for(&server).health().await.unwrap();
    assert!(health.is_healthy());
}

#[tokio::test]
async fn download_writes_video_to_destination() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/videos/abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(b"fake-mp4".to_vec(), "video/mp4"))
        .mount(&server)
        .await;
    let temp = TempDir::new().unwrap();
    let dest = temp.path().join("out").join("abc123.mp4");

    let written = service_for(&server)
        .download_video("abc123", &dest)
        .await
        .unwrap();
    assert_eq!(written, dest);
    assert_eq!(fs::read(&dest).unwrap(), b"fake-mp4");
}

#[tokio::test]
async fn failed_download_leaves_no_file() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/videos/abc123"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"detail": "Video not found"})))
        .mount(&server)
        .await;
    let temp = TempDir::new().unwrap();
    let dest = temp.path().join("abc123.mp4");

    let result = service_for(&server).download_video("abc123", &dest).await;
    assert!(result.is_err());
    assert!(!dest.exists());
    assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn list_jobs_sends_limit_and_parses_jobs() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/jobs"))
        .and(query_param("limit", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total": 2,
            "jobs": [
                {
                    "job_id": "def456",
                    "status": "rendering",
                    "progress": {"stage": "rendering", "percentage": 70, "message": "Rendering video..."},
                    "created_at": "2026-10-19T09:00:00Z",
                    "error": null,
                },
                {
                    "job_id": "abc123",
                    "status": "completed",
                    "progress": {"stage": "completed", "percentage": 100, "message": "Done"},
                    "created_at": "2026-10-19T08:00:00Z",
                    "video_path": "media/abc123.mp4",
                },
            ],
        })))
        .expect(1)
        .mount(&server)
        .await;

    let list = service_for(&server).list_jobs(10).await.unwrap();
    assert_eq!(list.total, 2);
    let summary = list
        .jobs
        .iter()
        .map(|job| (job.job_id.as_str(), job.status, job.percentage))
        .collect::<Vec<_>>();
    assert_eq!(
        summary,
        vec![
            ("def456", RemoteStatus::Rendering, 70),
            ("abc123", RemoteStatus::Completed, 100),
        ]
    );
}

#[tokio::test]
async fn list_jobs_rejects_malformed_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/jobs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"jobs": "none"})))
        .mount(&server)
        .await;

    let err = service_for(&server).list_jobs(50).await.unwrap_err();
    assert_eq!(err.kind, FailureKind::MalformedResponse);
}

#[tokio::test]
async fn delete_job_issues_delete() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/jobs/abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "Job deleted successfully",
            "job_id": "abc123",
        })))
        .expect(1)
        .mount(&server)
        .await;

    service_for(&server).delete_job("abc123").await.unwrap();
}

#[tokio::test]
async fn deleting_unknown_job_surfaces_detail() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/jobs/nope"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"detail": "Job not found"})))
        .mount(&server)
        .await;

    let err = service_for(&server).delete_job("nope").await.unwrap_err();
    assert_eq!(err.kind, FailureKind::HttpStatus(404));
    assert_eq!(err.message, "Job not found");
}
