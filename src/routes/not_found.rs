use axum::response::IntoResponse;
use hyper::StatusCode;
use tracing::instrument;

/// Fallback for everything the relay does not serve.
#[instrument(name = "Not Found")]
pub async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "404: Page Not Found")
}
