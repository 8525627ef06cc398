use chrono::{DateTime, Utc};

use super::CaptureEmail;

/// Everything the pipeline knows about one submission. Built fresh per
/// submit call; retries of the same submission reuse the same instance.
#[derive(Debug, Clone)]
pub struct CaptureRequest {
    pub email: CaptureEmail,
    pub source: String,
    pub submitted_at: DateTime<Utc>,
    pub referrer: Option<String>,
    pub user_agent: Option<String>,
}

impl CaptureRequest {
    pub fn new(email: CaptureEmail, source: impl Into<String>) -> Self {
        Self {
            email,
            source: source.into(),
            submitted_at: Utc::now(),
            referrer: None,
            user_agent: None,
        }
    }

    pub fn with_referrer(mut self, referrer: Option<String>) -> Self {
        self.referrer = referrer;
        self
    }

    pub fn with_user_agent(mut self, user_agent: Option<String>) -> Self {
        self.user_agent = user_agent;
        self
    }
}

impl std::fmt::Display for CaptureRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!(
            "email: {}, source: {}",
            self.email, self.source
        ))
    }
}
