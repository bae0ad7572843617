use axum::{extract::State, http::StatusCode, response::Json};
use tracing::{debug, instrument, trace};
use crate::schemas::{AppState, HealthResponse};

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
        (status = 500, description = "Service is unhealthy", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn health_check(State(state): State<AppState>) -> Result<Json<HealthResponse>, StatusCode> {
    trace!("Entering health_check function");
    let loader = state.dashboard.loader();
    debug!("{} series cached", loader.cache_size());

    let response = HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        data_source: loader.source_name().to_string(),
    };

    Ok(Json(response))
}
