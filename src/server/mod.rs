use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};

use crate::error::SpoolError;
use crate::scheduler::{Job, JobId, PrinterId, Scheduler};

#[derive(Clone)]
pub struct AppState {
    pub scheduler: Arc<RwLock<Scheduler>>,
}

#[derive(Serialize)]
struct ActivePrintResponse {
    job_id: JobId,
    owner_id: String,
    printer_id: PrinterId,
    start_time: Option<DateTime<Utc>>,
    end_time: Option<DateTime<Utc>>,
}

impl From<Job> for ActivePrintResponse {
    fn from(job: Job) -> Self {
        Self {
            job_id: job.id,
            owner_id: job.owner_id,
            printer_id: job.printer_id,
            start_time: job.start_time,
            end_time: job.end_time,
        }
    }
}

#[derive(Serialize)]
struct PrinterResponse {
    id: PrinterId,
    name: String,
    active_job: Option<ActivePrintResponse>,
}

#[derive(Deserialize)]
struct SubmitPrintRequest {
    owner_id: String,
    printer_id: PrinterId,
    duration_minutes: i64,
}

#[derive(Serialize)]
struct SubmitPrintResponse {
    success: bool,
    job_id: Option<JobId>,
    error: Option<String>,
}

#[derive(Deserialize)]
struct CancelPrintRequest {
    owner_id: String,
}

#[derive(Serialize)]
struct CancelPrintResponse {
    success: bool,
    error: Option<String>,
}

#[derive(Deserialize)]
struct ListPrintsQuery {
    owner_id: String,
}

/// Map an engine error onto a distinct client-facing status so callers can
/// tell validation, not-found, and ownership failures apart.
fn error_status(err: &SpoolError) -> StatusCode {
    match err {
        SpoolError::InvalidDuration(_) => StatusCode::BAD_REQUEST,
        SpoolError::PrinterNotFound(_) | SpoolError::JobNotFound(_) => StatusCode::NOT_FOUND,
        SpoolError::NotJobOwner(_) => StatusCode::FORBIDDEN,
    }
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/printers", get(list_printers_handler))
        .route("/api/prints", get(list_prints_handler))
        .route("/api/prints", post(submit_print_handler))
        .route("/api/prints/:job_id/cancel", post(cancel_print_handler))
        .route("/api/debug", get(debug_handler))
        .layer(cors)
        .with_state(state)
}

pub async fn run_server(addr: SocketAddr, state: AppState, shutdown: CancellationToken) {
    let app = router(state);

    tracing::info!(addr = %addr, "Starting spoold server");

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(addr = %addr, error = %e, "Failed to bind server");
            return;
        }
    };

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await
    {
        tracing::error!(error = %e, "Server failed");
    }
}

async fn list_printers_handler(State(state): State<AppState>) -> impl IntoResponse {
    let mut scheduler = state.scheduler.write().await;
    let printers: Vec<PrinterResponse> = scheduler
        .list_printers(Utc::now())
        .into_iter()
        .map(|snap| PrinterResponse {
            id: snap.id,
            name: snap.name,
            active_job: snap.active_job.map(ActivePrintResponse::from),
        })
        .collect();

    Json(printers)
}

async fn submit_print_handler(
    State(state): State<AppState>,
    Json(payload): Json<SubmitPrintRequest>,
) -> impl IntoResponse {
    let now = Utc::now();
    let mut scheduler = state.scheduler.write().await;

    match scheduler.submit(
        &payload.owner_id,
        payload.printer_id,
        payload.duration_minutes,
        now,
    ) {
        Ok(job_id) => {
            // Fill a newly free slot without waiting for the next request.
            scheduler.reconcile(now);
            (
                StatusCode::CREATED,
                Json(SubmitPrintResponse {
                    success: true,
                    job_id: Some(job_id),
                    error: None,
                }),
            )
        }
        Err(e) => (
            error_status(&e),
            Json(SubmitPrintResponse {
                success: false,
                job_id: None,
                error: Some(e.to_string()),
            }),
        ),
    }
}

async fn cancel_print_handler(
    State(state): State<AppState>,
    Path(job_id): Path<JobId>,
    Json(payload): Json<CancelPrintRequest>,
) -> impl IntoResponse {
    let mut scheduler = state.scheduler.write().await;

    match scheduler.cancel(job_id, &payload.owner_id) {
        Ok(()) => {
            // A cancelled active job frees its slot; promote the next in line.
            scheduler.reconcile(Utc::now());
            (
                StatusCode::OK,
                Json(CancelPrintResponse {
                    success: true,
                    error: None,
                }),
            )
        }
        Err(e) => (
            error_status(&e),
            Json(CancelPrintResponse {
                success: false,
                error: Some(e.to_string()),
            }),
        ),
    }
}

async fn list_prints_handler(
    State(state): State<AppState>,
    Query(query): Query<ListPrintsQuery>,
) -> impl IntoResponse {
    let mut scheduler = state.scheduler.write().await;
    let prints: Vec<ActivePrintResponse> = scheduler
        .list_active_for_owner(&query.owner_id, Utc::now())
        .into_iter()
        .map(ActivePrintResponse::from)
        .collect();

    Json(prints)
}

async fn debug_handler(State(state): State<AppState>) -> impl IntoResponse {
    let mut scheduler = state.scheduler.write().await;
    Json(scheduler.snapshot(Utc::now()))
}
