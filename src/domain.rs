mod capture_email;
mod capture_request;
mod denylist;
mod live_validator;

pub use capture_email::{CaptureEmail, ErrorKind, ValidationResult};
pub use capture_request::CaptureRequest;
pub use live_validator::LiveValidator;
