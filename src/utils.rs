use axum::response::{IntoResponse, Response};
use axum::Json;
use hyper::StatusCode;

#[derive(serde::Serialize)]
struct MessageBody {
    message: String,
}

fn message_response(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(MessageBody {
            message: message.into(),
        }),
    )
        .into_response()
}

/// 400 with a `{ message }` body.
pub fn e400(message: &str) -> Response {
    message_response(StatusCode::BAD_REQUEST, message)
}

/// 500 with a generic `{ message }` body. Nothing internal leaks to the
/// caller; the real error belongs in the log.
pub fn e500() -> Response {
    message_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        "Something went wrong. Please try again.",
    )
}
