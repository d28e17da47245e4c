//! HTTP/JSON monitor
//!
//! Read-only views of the latest driver snapshot plus one endpoint for forcing
//! an operating mode.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::net::SocketAddr;

use speedsim_core::ecu::{EngineMode, RealtimeView, StatisticsView, StatusView};

use crate::driver::DriverHandle;

type ApiError = (StatusCode, Json<ErrorResponse>);

// Request payload for a mode override.
#[derive(Debug, Deserialize)]
pub struct ModeRequest {
    mode: Option<String>,
}

// Response payload for an accepted override.
#[derive(Debug, Serialize)]
pub struct ModeResponse {
    mode: EngineMode,
    label: &'static str,
}

// Simple error envelope for JSON responses.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    message: String,
}

pub fn router(handle: DriverHandle) -> Router {
    Router::new()
        .route("/api/status", get(status))
        .route("/api/realtime", get(realtime))
        .route("/api/stats", get(stats))
        .route("/api/mode", post(set_mode))
        .fallback(not_found)
        .with_state(handle)
}

/// Serve the monitor until `shutdown` resolves
pub async fn serve(
    addr: SocketAddr,
    handle: DriverHandle,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "monitor listening");

    axum::serve(listener, router(handle))
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

async fn status(State(handle): State<DriverHandle>) -> Json<StatusView> {
    Json(handle.snapshot().status_view())
}

async fn realtime(State(handle): State<DriverHandle>) -> Json<RealtimeView> {
    Json(handle.snapshot().realtime())
}

async fn stats(State(handle): State<DriverHandle>) -> Json<StatisticsView> {
    Json(handle.snapshot().statistics())
}

async fn set_mode(
    State(handle): State<DriverHandle>,
    payload: Result<Json<ModeRequest>, JsonRejection>,
) -> Result<Json<ModeResponse>, ApiError> {
    let Json(request) = payload.map_err(|rejection| {
        error_response(StatusCode::BAD_REQUEST, &rejection.body_text())
    })?;

    let key = request
        .mode
        .ok_or_else(|| error_response(StatusCode::BAD_REQUEST, "mode is required"))?;

    let mode = key
        .parse::<EngineMode>()
        .ok()
        .filter(EngineMode::is_override_target)
        .ok_or_else(|| {
            let allowed: Vec<&str> = EngineMode::OVERRIDES.iter().map(EngineMode::key).collect();
            error_response(
                StatusCode::BAD_REQUEST,
                &format!("invalid mode '{}', expected one of: {}", key, allowed.join(", ")),
            )
        })?;

    if !handle.request_mode(mode).await {
        return Err(error_response(
            StatusCode::SERVICE_UNAVAILABLE,
            "simulator is not running",
        ));
    }

    Ok(Json(ModeResponse {
        mode,
        label: mode.label(),
    }))
}

async fn not_found() -> ApiError {
    error_response(StatusCode::NOT_FOUND, "not found")
}

// Helper to build a JSON error response.
fn error_response(status: StatusCode, message: &str) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            message: message.to_string(),
        }),
    )
}
