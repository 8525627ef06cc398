use std::time::Duration;

use tokio::time::Instant;

use super::{CaptureEmail, ValidationResult};

const DEFAULT_QUIET_PERIOD: Duration = Duration::from_millis(300);

/// Debounced companion to [`CaptureEmail::validate`] for as-you-type
/// feedback: a keystroke only triggers re-validation once the input has been
/// quiet for the configured period, while losing focus validates at once.
///
/// The owning UI controller calls [`on_input`](Self::on_input) per change and
/// polls on its own tick; nothing here spawns tasks or touches I/O.
pub struct LiveValidator {
    quiet_period: Duration,
    pending: Option<(String, Instant)>,
    last: Option<ValidationResult>,
}

impl LiveValidator {
    pub fn new() -> Self {
        Self::with_quiet_period(DEFAULT_QUIET_PERIOD)
    }

    pub fn with_quiet_period(quiet_period: Duration) -> Self {
        Self {
            quiet_period,
            pending: None,
            last: None,
        }
    }

    /// Record a changed input. Restarts the quiet period.
    pub fn on_input(&mut self, raw: &str) {
        self.pending = Some((raw.to_owned(), Instant::now()));
    }

    /// Re-validate if the quiet period has elapsed since the last change.
    /// Returns the fresh result, or `None` while still inside the period
    /// (or when there is nothing pending).
    pub fn poll(&mut self) -> Option<&ValidationResult> {
        match self.pending.take() {
            Some((raw, changed_at)) if changed_at.elapsed() >= self.quiet_period => {
                Some(self.last.insert(CaptureEmail::validate(&raw)))
            }
            pending => {
                self.pending = pending;
                None
            }
        }
    }

    /// Blur bypasses the debounce entirely.
    pub fn on_blur(&mut self, raw: &str) -> &ValidationResult {
        self.pending = None;
        self.last.insert(CaptureEmail::validate(raw))
    }

    /// Most recent result, if any validation has run.
    pub fn last(&self) -> Option<&ValidationResult> {
        self.last.as_ref()
    }
}

impl Default for LiveValidator {
    fn default() -> Self {
        Self::new()
    }
}
