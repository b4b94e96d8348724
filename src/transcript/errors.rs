// Error types for transcript providers

use thiserror::Error;

use super::diagnostics::classify;
use super::models::ErrorKind;

/// Closed failure taxonomy every provider reports in
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// Captions switched off by the content owner
    #[error("Transcripts are disabled for this video: {0}")]
    Disabled(String),

    /// No matching track for this provider
    #[error("No transcript found: {0}")]
    NotFound(String),

    /// Video missing, private, geo-blocked or otherwise unreachable
    #[error("Video unavailable: {0}")]
    Unavailable(String),

    /// Rate limit, timeout or transport failure
    #[error("Temporary failure: {0}")]
    Transient(String),

    /// Upstream answered but nothing usable was left after cleanup
    #[error("Transcript was empty after cleanup")]
    EmptyResult,

    /// Anything the classifier could not place
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ProviderError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Disabled(_) => ErrorKind::Disabled,
            Self::NotFound(_) | Self::EmptyResult => ErrorKind::NotFound,
            Self::Unavailable(_) => ErrorKind::Unavailable,
            Self::Transient(_) => ErrorKind::Transient,
            Self::Internal(_) => ErrorKind::InternalError,
        }
    }

    /// Only transient failures are worth another attempt
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}

// Raw upstream text goes through the diagnostics table exactly once
impl From<String> for ProviderError {
    fn from(s: String) -> Self {
        classify(&s)
    }
}

impl From<&str> for ProviderError {
    fn from(s: &str) -> Self {
        classify(s)
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() || e.is_connect() || e.is_request() {
            return Self::Transient(e.to_string());
        }
        if e.is_decode() {
            return Self::Internal(format!("Invalid upstream response: {}", e));
        }
        if let Some(status) = e.status() {
            return from_status(status.as_u16(), &e.to_string());
        }
        Self::Transient(e.to_string())
    }
}

/// Map an upstream HTTP status to the taxonomy
pub fn from_status(status: u16, body: &str) -> ProviderError {
    match status {
        429 => ProviderError::Transient(format!("HTTP 429: {}", body)),
        500..=599 => ProviderError::Transient(format!("HTTP {}: {}", status, body)),
        404 | 410 => ProviderError::Unavailable(format!("HTTP {}: {}", status, body)),
        _ => classify(&format!("HTTP {}: {}", status, body)),
    }
}
