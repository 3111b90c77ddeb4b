use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};

use crate::dispatcher::Dispatcher;
use crate::error::DispatchError;

#[derive(Clone)]
pub struct DashboardState {
    pub dispatcher: Arc<Dispatcher>,
}

#[derive(Deserialize)]
struct SubmitJobRequest {
    input: String,
}

#[derive(Serialize)]
struct SubmitJobResponse {
    success: bool,
    job_id: Option<u64>,
    error: Option<String>,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

/// Read-only views of the pool plus job submission, as JSON.
pub fn router(state: DashboardState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/summary", get(summary_handler))
        .route("/api/jobs", get(list_jobs_handler).post(submit_job_handler))
        .route("/api/jobs/:id", get(job_handler))
        .route("/api/workers", get(list_workers_handler))
        .route("/api/workers/:id", get(worker_handler))
        .layer(cors)
        .with_state(state)
}

pub async fn run_dashboard(addr: SocketAddr, state: DashboardState) {
    let app = router(state);

    tracing::info!(addr = %addr, "Starting dashboard server");

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(addr = %addr, error = %e, "Failed to bind dashboard server");
            return;
        }
    };

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!(error = %e, "Dashboard server failed");
    }
}

async fn summary_handler(State(state): State<DashboardState>) -> impl IntoResponse {
    Json(state.dispatcher.summary().await)
}

async fn list_jobs_handler(State(state): State<DashboardState>) -> impl IntoResponse {
    Json(state.dispatcher.ledger_snapshot().await)
}

async fn job_handler(
    State(state): State<DashboardState>,
    Path(id): Path<u64>,
) -> axum::response::Response {
    match state.dispatcher.job(id).await {
        Ok(job) => Json(job).into_response(),
        Err(e) => not_found(e),
    }
}

async fn list_workers_handler(State(state): State<DashboardState>) -> impl IntoResponse {
    Json(state.dispatcher.all_worker_stats().await)
}

async fn worker_handler(
    State(state): State<DashboardState>,
    Path(id): Path<u64>,
) -> axum::response::Response {
    match state.dispatcher.worker_stats(id).await {
        Ok(stats) => Json(stats).into_response(),
        Err(e) => not_found(e),
    }
}

async fn submit_job_handler(
    State(state): State<DashboardState>,
    Json(payload): Json<SubmitJobRequest>,
) -> impl IntoResponse {
    match state.dispatcher.submit_job(&payload.input).await {
        Ok(job) => (
            StatusCode::OK,
            Json(SubmitJobResponse {
                success: true,
                job_id: Some(job.id),
                error: None,
            }),
        ),
        Err(e) => (
            StatusCode::BAD_REQUEST,
            Json(SubmitJobResponse {
                success: false,
                job_id: None,
                error: Some(e.to_string()),
            }),
        ),
    }
}

fn not_found(e: DispatchError) -> axum::response::Response {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: e.to_string(),
        }),
    )
        .into_response()
}
