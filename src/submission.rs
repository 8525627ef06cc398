use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::instrument;

use crate::campaign_client::{CampaignClient, CampaignError};
use crate::domain::{CaptureEmail, CaptureRequest, ValidationResult};

/// Copy returned when the upstream call actually went through.
const ACCEPTED_MESSAGE: &str = "Thanks! You're on the list.";
/// Softer acknowledgment used when the upstream integration failed. Shown as
/// success on purpose: a backend integration fault must never surface as a
/// failure screen.
const SOFT_ACK_MESSAGE: &str = "Thanks for signing up! Keep an eye on your inbox.";

/// Bounded retry with linearly increasing backoff (base × attempt number).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff: Duration::from_millis(1000),
        }
    }
}

/// Lifecycle of one submission. Terminal states go back to `Idle` when the
/// owning form resets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionPhase {
    Idle,
    Validating,
    Rejected,
    Submitting,
    Retrying,
    Succeeded,
    SoftFailureAcknowledged,
}

/// UI-facing classification of an integration fault, independent from the
/// upstream diagnostics. The mapping is total; anything unrecognized lands
/// on `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntegrationErrorKind {
    NetworkUnavailable,
    Timeout,
    InvalidRequest,
    RateLimited,
    ServiceUnavailable,
    Unknown,
}

impl IntegrationErrorKind {
    pub fn classify(error: &CampaignError) -> Self {
        match error {
            CampaignError::Transport(e) if e.is_timeout() => IntegrationErrorKind::Timeout,
            CampaignError::Transport(e) if e.is_connect() => {
                IntegrationErrorKind::NetworkUnavailable
            }
            CampaignError::Transport(_) => IntegrationErrorKind::Unknown,
            CampaignError::SubscribeStatus(status) if status.as_u16() == 429 => {
                IntegrationErrorKind::RateLimited
            }
            CampaignError::SubscribeStatus(status) if status.is_client_error() => {
                IntegrationErrorKind::InvalidRequest
            }
            CampaignError::SubscribeStatus(status) if status.is_server_error() => {
                IntegrationErrorKind::ServiceUnavailable
            }
            CampaignError::SubscribeStatus(_) => IntegrationErrorKind::Unknown,
            CampaignError::TokenRejected(_) | CampaignError::ProviderCode { .. } => {
                IntegrationErrorKind::InvalidRequest
            }
            CampaignError::MissingCredential(_) | CampaignError::MalformedResponse(_) => {
                IntegrationErrorKind::Unknown
            }
        }
    }

    /// One fixed sentence per kind.
    pub fn user_sentence(self) -> &'static str {
        match self {
            IntegrationErrorKind::NetworkUnavailable => {
                "We couldn't reach the network. Please check your connection and try again."
            }
            IntegrationErrorKind::Timeout => {
                "The request took too long to complete. Please try again in a moment."
            }
            IntegrationErrorKind::InvalidRequest => {
                "We couldn't process that request. Please try again."
            }
            IntegrationErrorKind::RateLimited => {
                "We're receiving a lot of signups right now. Please try again shortly."
            }
            IntegrationErrorKind::ServiceUnavailable => {
                "Our signup service is briefly unavailable. Please try again soon."
            }
            IntegrationErrorKind::Unknown => "Something went wrong. Please try again.",
        }
    }
}

/// What the caller renders. `user_message` is never empty, whatever
/// happened upstream.
#[derive(Debug, Clone)]
pub struct SubmissionOutcome {
    pub ok: bool,
    pub user_message: String,
    pub diagnostic: Option<String>,
}

/// Result of a full capture lifecycle (validation included).
#[derive(Debug)]
pub enum CaptureResult {
    Rejected(ValidationResult),
    Completed(SubmissionOutcome),
}

/// Drives one form's submissions against the campaign API.
///
/// Single-flight: at most one submission is in progress per pipeline
/// instance; a duplicate submit while one is pending is dropped, not queued.
/// Each form instance owns its own pipeline, so nothing is shared across
/// forms.
pub struct SubmissionPipeline {
    client: Arc<CampaignClient>,
    policy: RetryPolicy,
    in_flight: AtomicBool,
    phase: Mutex<SubmissionPhase>,
}

impl SubmissionPipeline {
    pub fn new(client: Arc<CampaignClient>, policy: RetryPolicy) -> Self {
        Self {
            client,
            policy,
            in_flight: AtomicBool::new(false),
            phase: Mutex::new(SubmissionPhase::Idle),
        }
    }

    pub fn phase(&self) -> SubmissionPhase {
        *self.phase.lock().expect("phase lock poisoned")
    }

    fn set_phase(&self, phase: SubmissionPhase) {
        *self.phase.lock().expect("phase lock poisoned") = phase;
    }

    /// Return to `Idle`, as the owning form does when it resets after a
    /// terminal state.
    pub fn reset(&self) {
        self.set_phase(SubmissionPhase::Idle);
    }

    /// Full lifecycle for one raw input: validate, then submit if accepted.
    /// Returns `None` when a submission is already in flight.
    pub async fn handle(&self, raw: &str, source: &str) -> Option<CaptureResult> {
        if self.in_flight.load(Ordering::Acquire) {
            tracing::debug!("submission already in flight, ignoring input");
            return None;
        }

        self.set_phase(SubmissionPhase::Validating);
        let result = CaptureEmail::validate(raw);
        let email = match CaptureEmail::parse(raw) {
            Ok(email) => email,
            Err(_) => {
                self.set_phase(SubmissionPhase::Rejected);
                return Some(CaptureResult::Rejected(result));
            }
        };

        let request = CaptureRequest::new(email, source);
        self.submit(&request).await.map(CaptureResult::Completed)
    }

    /// Submit one validated request. Returns `None` if another submission is
    /// already in flight (dropped, not queued).
    #[instrument(name = "Submit email capture", skip(self, request), fields(capture = %request))]
    pub async fn submit(&self, request: &CaptureRequest) -> Option<SubmissionOutcome> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!("submission already in flight, dropping duplicate");
            return None;
        }

        let outcome = self.run(request).await;
        self.in_flight.store(false, Ordering::Release);
        Some(outcome)
    }

    async fn run(&self, request: &CaptureRequest) -> SubmissionOutcome {
        self.set_phase(SubmissionPhase::Submitting);
        tracing::info!(
            source = %request.source,
            submitted_at = %request.submitted_at,
            referrer = request.referrer.as_deref().unwrap_or(""),
            user_agent = request.user_agent.as_deref().unwrap_or(""),
            "Forwarding a capture to the campaign provider"
        );

        // One token per submission; retries below reuse it. A fresh token is
        // only fetched when the pipeline re-enters from the top.
        let session = match self.client.acquire_token().await {
            Ok(session) => session,
            Err(e) => return self.acknowledge_softly(e),
        };

        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            match self.client.bulk_subscribe(&session, &request.email).await {
                Ok(()) => {
                    self.set_phase(SubmissionPhase::Succeeded);
                    return SubmissionOutcome {
                        ok: true,
                        user_message: ACCEPTED_MESSAGE.into(),
                        diagnostic: None,
                    };
                }
                Err(e) if e.is_transient() && attempt <= self.policy.max_retries => {
                    self.set_phase(SubmissionPhase::Retrying);
                    tracing::warn!(error.message = %e, attempt, "transient upstream failure, backing off");
                    tokio::time::sleep(self.policy.backoff * attempt).await;
                }
                Err(e) => return self.acknowledge_softly(e),
            }
        }
    }

    // Fail open toward the user, fail loud toward operators.
    fn acknowledge_softly(&self, error: CampaignError) -> SubmissionOutcome {
        let kind = IntegrationErrorKind::classify(&error);
        tracing::error!(
            error.cause_chain = ?error,
            error.message = %error,
            error.kind = ?kind,
            "Upstream campaign call failed. \
            Acknowledging the signup softly."
        );
        self.set_phase(SubmissionPhase::SoftFailureAcknowledged);
        SubmissionOutcome {
            ok: true,
            user_message: SOFT_ACK_MESSAGE.into(),
            diagnostic: Some(format!("{} ({error})", kind.user_sentence())),
        }
    }
}
