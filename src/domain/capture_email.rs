use validator::ValidateEmail;

use super::denylist::{
    DISPOSABLE_DOMAINS, PLACEHOLDER_DOMAINS, RESERVED_TLD_SUFFIXES, THROWAWAY_LOCAL_PARTS,
};

/// RFC 5321 mailbox length ceiling.
const MAX_EMAIL_LENGTH: usize = 254;

/// Why a candidate email was turned away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Required,
    InvalidFormat,
    TooLong,
    DisposableDomain,
    Suspicious,
}

impl ErrorKind {
    /// Inline copy shown next to the form field. `Suspicious` deliberately
    /// shares the `InvalidFormat` sentence so the heuristic stays opaque.
    pub fn user_message(self) -> &'static str {
        match self {
            ErrorKind::Required => "Please enter your email address.",
            ErrorKind::InvalidFormat | ErrorKind::Suspicious => {
                "Please enter a valid email address."
            }
            ErrorKind::TooLong => "That email address is too long.",
            ErrorKind::DisposableDomain => "Please use a permanent email address.",
        }
    }
}

/// Outcome of one validation call. `normalized` is the lowercase-trimmed
/// candidate whether or not it passed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    pub normalized: String,
    pub error: Option<ErrorKind>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.error.is_none()
    }

    pub fn user_message(&self) -> Option<&'static str> {
        self.error.map(ErrorKind::user_message)
    }
}

/// An email address that made it through the whole validation pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureEmail(String);

impl CaptureEmail {
    /// Run the full pipeline and keep the normalized address on success.
    pub fn parse(raw: &str) -> Result<Self, ErrorKind> {
        let result = Self::validate(raw);
        match result.error {
            None => Ok(Self(result.normalized)),
            Some(kind) => Err(kind),
        }
    }

    /// Classify a candidate. Checks run in a fixed order and stop at the
    /// first failure; no I/O, deterministic, safe to call per keystroke.
    pub fn validate(raw: &str) -> ValidationResult {
        let normalized = raw.trim().to_lowercase();

        let error = if normalized.is_empty() {
            Some(ErrorKind::Required)
        } else if normalized.len() > MAX_EMAIL_LENGTH {
            Some(ErrorKind::TooLong)
        } else if !normalized.validate_email() {
            Some(ErrorKind::InvalidFormat)
        } else {
            match normalized.rsplit_once('@') {
                Some((local, domain)) => {
                    if DISPOSABLE_DOMAINS.contains(&domain) {
                        Some(ErrorKind::DisposableDomain)
                    } else if is_suspicious(local, domain) {
                        Some(ErrorKind::Suspicious)
                    } else {
                        None
                    }
                }
                // `validate_email` guarantees an `@`.
                None => Some(ErrorKind::InvalidFormat),
            }
        };

        ValidationResult { normalized, error }
    }
}

impl AsRef<str> for CaptureEmail {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CaptureEmail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Heuristics for addresses that are syntactically fine but almost certainly
/// not a real signup. Order matters and is part of the contract.
fn is_suspicious(local: &str, domain: &str) -> bool {
    let throwaway_local = THROWAWAY_LOCAL_PARTS.contains(&local);
    let placeholder_domain = PLACEHOLDER_DOMAINS.contains(&domain)
        || !domain.contains('.')
        || RESERVED_TLD_SUFFIXES
            .iter()
            .any(|suffix| domain.ends_with(suffix));
    let all_numeric_local = local.chars().all(|ch| ch.is_ascii_digit());
    let single_char_local = local.chars().count() == 1;

    throwaway_local
        || placeholder_domain
        || all_numeric_local
        || single_char_local
        || has_repeated_run(local, 5)
}

fn has_repeated_run(s: &str, limit: usize) -> bool {
    let mut run = 0;
    let mut previous = None;
    for ch in s.chars() {
        if Some(ch) == previous {
            run += 1;
        } else {
            run = 1;
            previous = Some(ch);
        }
        if run >= limit {
            return true;
        }
    }
    false
}
