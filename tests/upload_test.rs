use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use log_analyzer::config::UploadConfig;
use log_analyzer::services::ingest::StagingTracker;
use log_analyzer::{AppState, create_app};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

const MB: usize = 1024 * 1024;

fn setup_app(config: UploadConfig) -> (Router, Arc<StagingTracker>) {
    let _ = tracing_subscriber::fmt::try_init();
    let state = AppState::new(config);
    let tracker = state.ingest.tracker().clone();
    (create_app(state), tracker)
}

fn config_with_limit(max_upload_size: usize) -> UploadConfig {
    UploadConfig {
        max_upload_size,
        ..UploadConfig::development()
    }
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

fn raw_upload(body: Vec<u8>, content_length: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/upload/raw?filename=app.log")
        .header(header::CONTENT_TYPE, "application/octet-stream");
    if let Some(len) = content_length {
        builder = builder.header(header::CONTENT_LENGTH, len);
    }
    builder.body(Body::from(body)).unwrap()
}

const BOUNDARY: &str = "---------------------------735323031399963166993862150";

fn multipart_body(files: &[(&str, &str)]) -> String {
    let mut body = String::new();
    body.push_str(&format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"note\"\r\n\r\nnightly run\r\n"
    ));
    for (filename, content) in files {
        body.push_str(&format!(
            "--{BOUNDARY}\r\n\
            Content-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n\
            Content-Type: text/plain\r\n\r\n\
            {content}\r\n"
        ));
    }
    body.push_str(&format!("--{BOUNDARY}--\r\n"));
    body
}

fn multipart_upload(body: String, content_length: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        );
    if let Some(len) = content_length {
        builder = builder.header(header::CONTENT_LENGTH, len);
    }
    builder.body(Body::from(body)).unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let (app, _) = setup_app(UploadConfig::development());

    let (status, json) = send(
        &app,
        Request::builder().uri("/").body(Body::empty()).unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "online");
    assert_eq!(json["message"], "Log Analyzer API is running.");
    assert_eq!(json["staging_outstanding"], 0);
}

#[tokio::test]
async fn test_oversized_declaration_rejected_before_staging() {
    let (app, tracker) = setup_app(config_with_limit(20 * MB));

    let (status, json) = send(&app, raw_upload(b"tiny".to_vec(), Some("999999999"))).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert!(json["error"].as_str().unwrap().starts_with("declared size"));

    let (status, _) = send(
        &app,
        multipart_upload(multipart_body(&[("a.log", "x")]), Some("999999999")),
    )
    .await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);

    assert_eq!(tracker.allocated(), 0);
    assert_eq!(tracker.released(), 0);
}

#[tokio::test]
async fn test_overflowing_declaration_rejected_before_staging() {
    let (app, tracker) = setup_app(config_with_limit(1024));

    let (status, json) = send(
        &app,
        raw_upload(b"0123456789".to_vec(), Some("99999999999999999999999")),
    )
    .await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert!(json["error"].as_str().unwrap().starts_with("declared size"));

    assert_eq!(tracker.allocated(), 0);
    assert_eq!(tracker.released(), 0);
}

#[tokio::test]
async fn test_undeclared_body_under_limit_accepted() {
    let (app, tracker) = setup_app(config_with_limit(20 * MB));

    let mut log = "INFO ok\n".repeat(1024).into_bytes();
    log.extend_from_slice(b"ERROR disk failure\nWARN slow request\n");
    log.resize(19 * MB, b'.');

    let (status, json) = send(&app, raw_upload(log, None)).await;

    assert_eq!(status, StatusCode::OK, "{json}");
    assert_eq!(json["size"], 19 * MB);
    assert_eq!(json["declared_size"], Value::Null);
    assert_eq!(json["size_mismatch"], false);
    assert_eq!(json["staged_on_disk"], true);
    assert_eq!(json["filename"], "app.log");
    assert_eq!(json["summary"]["errors"], 1);
    assert_eq!(json["summary"]["warnings"], 1);
    assert_eq!(json["summary"]["first_errors"][0], "ERROR disk failure");

    assert_eq!(tracker.allocated(), 1);
    assert_eq!(tracker.released(), 1);
}

#[tokio::test]
async fn test_understated_declaration_caught_by_measurement() {
    let (app, tracker) = setup_app(config_with_limit(20 * MB));

    let (status, json) = send(&app, raw_upload(vec![b'x'; 25 * MB], Some("100"))).await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert!(json["error"].as_str().unwrap().starts_with("measured size"));
    assert_eq!(tracker.allocated(), 1);
    assert_eq!(tracker.released(), 1);
}

#[tokio::test]
async fn test_empty_body_accepted() {
    let (app, tracker) = setup_app(config_with_limit(20 * MB));

    let (status, json) = send(&app, raw_upload(Vec::new(), Some("0"))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["size"], 0);
    assert_eq!(json["summary"]["lines"], 0);
    assert_eq!(json["size_mismatch"], false);
    assert_eq!(tracker.released(), 1);
}

#[tokio::test]
async fn test_exact_limit_boundary() {
    let (app, tracker) = setup_app(config_with_limit(1024));

    let (status, json) = send(&app, raw_upload(vec![b'a'; 1024], None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["size"], 1024);

    let (status, _) = send(&app, raw_upload(vec![b'a'; 1025], None)).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);

    assert_eq!(tracker.allocated(), 2);
    assert_eq!(tracker.released(), 2);
}

#[tokio::test]
async fn test_invalid_declaration_ignored() {
    let (app, tracker) = setup_app(config_with_limit(1024));

    let (status, json) = send(&app, raw_upload(b"WARN a\n".to_vec(), Some("lots"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["declared_size"], Value::Null);
    assert_eq!(json["summary"]["warnings"], 1);
    assert_eq!(tracker.released(), 1);
}

#[tokio::test]
async fn test_declared_size_mismatch_flagged() {
    let (app, _) = setup_app(config_with_limit(1024));

    let (status, json) = send(&app, raw_upload(b"0123456789".to_vec(), Some("5"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["size"], 10);
    assert_eq!(json["declared_size"], 5);
    assert_eq!(json["size_mismatch"], true);
}

#[tokio::test]
async fn test_multipart_upload_flow() {
    let (app, tracker) = setup_app(UploadConfig::development());

    let content = "2024-05-01 INFO start\n2024-05-01 ERROR boom\n2024-05-01 WARNING meh";
    let body = multipart_body(&[("../../var/log/app.log", content)]);
    let len = body.len().to_string();

    let (status, json) = send(&app, multipart_upload(body, Some(&len))).await;

    assert_eq!(status, StatusCode::OK, "{json}");
    assert_eq!(json["filename"], "app.log");
    assert_eq!(json["size"], content.len());
    assert_eq!(json["declared_size"], Value::Null);
    assert_eq!(json["staged_on_disk"], false);
    assert_eq!(json["summary"]["lines"], 3);
    assert_eq!(json["summary"]["errors"], 1);
    assert_eq!(json["summary"]["warnings"], 1);
    assert!(!json["upload_id"].as_str().unwrap().is_empty());

    assert_eq!(tracker.allocated(), 1);
    assert_eq!(tracker.released(), 1);
}

#[tokio::test]
async fn test_multipart_measured_limit() {
    let (app, tracker) = setup_app(config_with_limit(16));

    let (status, _) = send(
        &app,
        multipart_upload(multipart_body(&[("a.log", "0123456789abcdef")]), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, json) = send(
        &app,
        multipart_upload(multipart_body(&[("a.log", "0123456789abcdefg")]), None),
    )
    .await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert!(json["error"].as_str().unwrap().starts_with("measured size"));

    assert_eq!(tracker.allocated(), 2);
    assert_eq!(tracker.released(), 2);
}

#[tokio::test]
async fn test_multipart_without_file_rejected() {
    let (app, tracker) = setup_app(UploadConfig::development());

    let (status, json) = send(&app, multipart_upload(multipart_body(&[]), None)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "No file provided");
    assert_eq!(tracker.allocated(), 0);
}

#[tokio::test]
async fn test_multipart_batch_rejected() {
    let (app, tracker) = setup_app(UploadConfig::development());

    let body = multipart_body(&[("a.log", "ERROR a"), ("b.log", "ERROR b")]);
    let (status, json) = send(&app, multipart_upload(body, None)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Only one file may be uploaded per request");
    assert_eq!(tracker.allocated(), 1);
    assert_eq!(tracker.outstanding(), 0);
}

#[tokio::test]
async fn test_openapi_document_served() {
    let (app, _) = setup_app(UploadConfig::development());

    let (status, json) = send(
        &app,
        Request::builder()
            .uri("/api-docs/openapi.json")
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(json["paths"]["/upload"].is_object());
    assert!(json["paths"]["/upload/raw"].is_object());
}

#[tokio::test]
async fn test_request_id_echoed_on_rejection() {
    let (app, _) = setup_app(config_with_limit(1024));

    let mut request = raw_upload(b"x".to_vec(), Some("4096"));
    request
        .headers_mut()
        .insert("x-request-id", "upload-42".parse().unwrap());
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(response.headers()["x-request-id"], "upload-42");

    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert!(!response.headers()["x-request-id"].is_empty());
}
