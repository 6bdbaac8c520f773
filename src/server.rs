//! HTTP trigger endpoints.
//!
//! Every response is a JSON envelope: `{ "status": 1, "result": .. }` on
//! success, `{ "status": 0, "error": ".." }` on failure.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;

use crate::error::ExecutionError;
use crate::state::AppState;
use crate::types::{ExecutionTrigger, WorkflowId, WorkflowOutcome};
use crate::workflow;

#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub status: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> Envelope<T> {
    pub fn ok(result: T) -> Self {
        Self {
            status: 1,
            result: Some(result),
            error: None,
        }
    }
}

impl Envelope<()> {
    pub fn error(message: String) -> Self {
        Self {
            status: 0,
            result: None,
            error: Some(message),
        }
    }
}

pub fn error_status(err: &ExecutionError) -> StatusCode {
    match err {
        ExecutionError::AlreadyRunning(_) => StatusCode::CONFLICT,
        ExecutionError::ApiRateLimit => StatusCode::TOO_MANY_REQUESTS,
        ExecutionError::UpstreamAuth { .. }
        | ExecutionError::MalformedResponse(_)
        | ExecutionError::Upstream { .. } => StatusCode::BAD_GATEWAY,
        ExecutionError::NetworkError(_) => StatusCode::SERVICE_UNAVAILABLE,
        ExecutionError::ConfigurationError(_)
        | ExecutionError::TaskFailed(_)
        | ExecutionError::ParseError(_)
        | ExecutionError::IoError(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn respond<T: Serialize>(route: &str, result: Result<T, ExecutionError>) -> Response {
    match result {
        Ok(value) => Json(Envelope::ok(value)).into_response(),
        Err(e) => {
            log::error!("HTTP {} failed: {}", route, e);
            (error_status(&e), Json(Envelope::error(e.to_string()))).into_response()
        }
    }
}

/// Run a workflow on its own task.
///
/// The handler future is dropped when the client disconnects; the run keeps
/// going and still notifies.
async fn run_detached(
    state: Arc<AppState>,
    id: WorkflowId,
) -> Result<WorkflowOutcome, ExecutionError> {
    tokio::spawn(async move {
        workflow::execute(&state, id, ExecutionTrigger::Manual, Utc::now()).await
    })
    .await?
}

async fn timesheets(State(state): State<Arc<AppState>>) -> Response {
    respond("/timesheets", run_detached(state, WorkflowId::Timesheets).await)
}

async fn billable(State(state): State<Arc<AppState>>) -> Response {
    respond("/billable", run_detached(state, WorkflowId::Billable).await)
}

async fn users(State(state): State<Arc<AppState>>) -> Response {
    respond("/users", workflow::list_linked_users(&state).await)
}

async fn healthz() -> Json<Envelope<&'static str>> {
    Json(Envelope::ok("ok"))
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/timesheets", get(timesheets))
        .route("/billable", get(billable))
        .route("/users", get(users))
        .route("/healthz", get(healthz))
        .with_state(state)
}

/// Bind the listen port and serve until the process exits.
pub async fn serve(state: Arc<AppState>) -> Result<(), ExecutionError> {
    let port = state.config.port;
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    log::info!("HTTP: listening on {}", listener.local_addr()?);
    axum::serve(listener, router(state)).await?;
    Ok(())
}
