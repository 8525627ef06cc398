use axum::{http::StatusCode, response::IntoResponse};
use tracing::instrument;

/// Liveness probe: nothing to check beyond the process being up, since the
/// relay keeps no state.
#[instrument(name = "Health check")]
pub async fn health_check() -> impl IntoResponse {
    StatusCode::OK
}
