//! HTTP endpoints of the exporter.
//!
//! - `GET /` - liveness string
//! - `GET /api/temperature` - `{"temperature": 7.1}` from a fresh (or cached) export
//! - `GET /api/health` - service health check
//!
//! Any export failure is logged with its cause and answered with a bare
//! `500 Internal Server Error`; details never reach the client.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::error;

use crate::error::ExportError;
use crate::state::AppState;

/// Body of `GET /`.
pub const LIVENESS: &str = "🌊 Eisbach Tracker backend listening!";

/// Create the API router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(root))
        .route("/api/temperature", get(temperature))
        .route("/api/health", get(health))
}

async fn root() -> &'static str {
    LIVENESS
}

/// Temperature response.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TemperatureResponse {
    pub temperature: f64,
}

async fn temperature(
    State(state): State<Arc<AppState>>,
) -> Result<Json<TemperatureResponse>, AppError> {
    let temperature = state.temperature().await?;
    Ok(Json(TemperatureResponse { temperature }))
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

/// Health check endpoint.
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        timestamp: OffsetDateTime::now_utc(),
    })
}

/// Application error type.
#[derive(Debug)]
pub struct AppError(ExportError);

impl From<ExportError> for AppError {
    fn from(e: ExportError) -> Self {
        AppError(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        error!(error = %self.0, "Temperature export failed");
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
    }
}
