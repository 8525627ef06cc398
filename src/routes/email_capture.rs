use axum::extract::{rejection::JsonRejection, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use hyper::{header, HeaderMap, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::appstate::AppState;
use crate::domain::{CaptureEmail, CaptureRequest};
use crate::submission::SubmissionPipeline;
use crate::utils::e400;

pub const DEFAULT_SOURCE: &str = "landing-page";

#[derive(Deserialize)]
pub struct CaptureBody {
    pub email: Option<String>,
    pub source: Option<String>,
}

#[derive(Serialize)]
pub struct CaptureResponse {
    pub message: String,
    pub email: String,
    pub source: String,
}

/// `POST /api/email-capture`.
///
/// Input faults are the caller's problem (400 with a message); integration
/// faults are ours and are answered with 200 and a soft acknowledgment.
#[instrument(name = "Capture an email signup", skip(state, headers, body), fields(source))]
pub async fn capture(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<CaptureBody>, JsonRejection>,
) -> Response {
    let Json(body) = match body {
        Ok(body) => body,
        Err(e) => {
            tracing::info!("Failed to extract json body: {}", e);
            return e400("Expected a JSON body with an email field.");
        }
    };

    let Some(raw_email) = body.email else {
        return e400("The email field is required.");
    };
    if !raw_email.contains('@') {
        return e400("Please enter a valid email address.");
    }

    let source = body.source.unwrap_or_else(|| DEFAULT_SOURCE.into());
    tracing::Span::current().record("source", tracing::field::display(&source));

    let email = match CaptureEmail::parse(&raw_email) {
        Ok(email) => email,
        Err(kind) => {
            tracing::info!(error.kind = ?kind, "Rejected a signup candidate");
            return e400(kind.user_message());
        }
    };

    let request = CaptureRequest::new(email, source)
        .with_referrer(header_value(&headers, header::REFERER))
        .with_user_agent(header_value(&headers, header::USER_AGENT));

    // One pipeline per request: each form submission owns its own in-flight
    // flag and retry counters.
    let pipeline = SubmissionPipeline::new(state.campaign_client.clone(), state.retry_policy);
    let user_message = match pipeline.submit(&request).await {
        Some(outcome) => outcome.user_message,
        // unreachable on a fresh pipeline, but the contract is Option
        None => "Thanks! Your signup is already being processed.".into(),
    };

    (
        StatusCode::OK,
        Json(CaptureResponse {
            message: user_message,
            email: request.email.to_string(),
            source: request.source,
        }),
    )
        .into_response()
}

/// Bare `OPTIONS /api/email-capture`. Real preflights are answered by the
/// CORS layer before they get here.
#[instrument(name = "Email capture preflight")]
pub async fn capture_preflight() -> impl IntoResponse {
    StatusCode::OK
}

fn header_value(headers: &HeaderMap, name: header::HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(ToOwned::to_owned)
}
