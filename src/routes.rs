mod email_capture;
mod health_check;
mod not_found;

pub use email_capture::{capture, capture_preflight, CaptureBody, CaptureResponse, DEFAULT_SOURCE};
pub use health_check::health_check;
pub use not_found::not_found;
