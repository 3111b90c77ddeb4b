use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

use jobpool::dashboard::{router, DashboardState};
use jobpool::{Dispatcher, DispatcherConfig, SignalPolicy, WorkConfig};

use test_harness::wait_for_completion;

/// Helper to create a test app over a small pool
fn create_test_app() -> (Router, Arc<Dispatcher>) {
    let config = DispatcherConfig::new(2)
        .with_signal_policy(SignalPolicy::OnEnqueue)
        .with_work(WorkConfig::fixed(1));
    let dispatcher = Arc::new(Dispatcher::start(config).unwrap());
    let state = DashboardState {
        dispatcher: dispatcher.clone(),
    };
    (router(state), dispatcher)
}

async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&body).unwrap())
}

async fn post_job(app: &Router, payload: Value) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/jobs")
                .header("content-type", "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn test_list_jobs_empty() {
    let (app, _dispatcher) = create_test_app();

    let (status, json) = get_json(&app, "/api/jobs").await;

    assert_eq!(status, StatusCode::OK);
    assert!(json.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_submit_job() {
    let (app, dispatcher) = create_test_app();

    let (status, json) = post_job(&app, json!({ "input": "hello" })).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    assert_eq!(json["job_id"], 1);
    assert!(json["error"].is_null());
    assert_eq!(dispatcher.ledger_snapshot().await.len(), 1);
}

#[tokio::test]
async fn test_submit_empty_job_rejected() {
    let (app, dispatcher) = create_test_app();

    let (status, json) = post_job(&app, json!({ "input": "" })).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["success"], false);
    assert!(json["job_id"].is_null());
    assert!(json["error"]
        .as_str()
        .unwrap()
        .contains("Input parameter empty"));
    assert!(dispatcher.ledger_snapshot().await.is_empty());
}

#[tokio::test]
async fn test_jobs_and_workers_after_completion() {
    let (app, dispatcher) = create_test_app();
    post_job(&app, json!({ "input": "abc" })).await;
    post_job(&app, json!({ "input": "de" })).await;
    assert!(wait_for_completion(&dispatcher, 2, Duration::from_secs(5)).await);

    let (status, jobs) = get_json(&app, "/api/jobs").await;
    assert_eq!(status, StatusCode::OK);
    let jobs = jobs.as_array().unwrap();
    assert_eq!(jobs.len(), 2);
    assert_eq!(jobs[0]["id"], 1);
    assert_eq!(jobs[0]["status"], "COMPLETE");
    assert_eq!(jobs[0]["input_param"], "abc");
    assert_eq!(jobs[0]["result"], 30);
    assert_eq!(jobs[1]["result"], 20);

    let (status, job) = get_json(&app, "/api/jobs/2").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(job["input_param"], "de");

    let (status, workers) = get_json(&app, "/api/workers").await;
    assert_eq!(status, StatusCode::OK);
    let workers = workers.as_array().unwrap();
    assert_eq!(workers.len(), 2);
    let completed: u64 = workers
        .iter()
        .map(|w| w["completed_count"].as_u64().unwrap())
        .sum();
    assert_eq!(completed, 2);

    let (status, summary) = get_json(&app, "/api/summary").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["total_jobs"], 2);
    assert_eq!(summary["completed_jobs"], 2);
    assert_eq!(summary["pending_jobs"], 0);
}

#[tokio::test]
async fn test_single_worker_endpoint() {
    let (app, _dispatcher) = create_test_app();

    let (status, worker) = get_json(&app, "/api/workers/2").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(worker["worker_id"], 2);
    assert_eq!(worker["status"], "IDLE");
    assert!(worker["history"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_unknown_ids_return_not_found() {
    let (app, _dispatcher) = create_test_app();

    let (status, json) = get_json(&app, "/api/workers/9").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "Worker not found: 9");

    let (status, json) = get_json(&app, "/api/jobs/1").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "Job not found: 1");
}
