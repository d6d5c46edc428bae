use crate::AppState;
use axum::{Json, extract::State, response::IntoResponse};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
    pub version: String,
    /// Staging resources allocated but not yet released
    pub staging_outstanding: u64,
}

#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Service is running", body = HealthResponse)
    ),
    tag = "system"
)]
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "online".to_string(),
        message: "Log Analyzer API is running.".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        staging_outstanding: state.ingest.tracker().outstanding(),
    })
}
