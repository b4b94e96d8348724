// Common data models for transcript acquisition

use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical reference to a video, produced once per request by the normalizer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoRef {
    raw_input: String,
    canonical_id: String,
}

impl VideoRef {
    pub(crate) fn new(raw_input: impl Into<String>, canonical_id: impl Into<String>) -> Self {
        Self {
            raw_input: raw_input.into(),
            canonical_id: canonical_id.into(),
        }
    }

    pub fn raw_input(&self) -> &str {
        &self.raw_input
    }

    pub fn canonical_id(&self) -> &str {
        &self.canonical_id
    }

    /// Watch-page URL handed to out-of-process tools
    pub fn watch_url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.canonical_id)
    }
}

/// Ordered language tags, highest priority first. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguagePreference {
    tags: Vec<String>,
    /// Tags came from the caller rather than configured defaults
    explicit: bool,
}

impl LanguagePreference {
    pub const DEFAULT_TAG: &'static str = "en";

    /// Build from caller-supplied tags, falling back to `defaults` (and then
    /// to [`Self::DEFAULT_TAG`]) when nothing usable remains.
    pub fn new<S: AsRef<str>>(requested: &[S], defaults: &[String]) -> Self {
        let tags = Self::clean(requested);
        if !tags.is_empty() {
            return Self { tags, explicit: true };
        }

        let tags = Self::clean(defaults);
        if !tags.is_empty() {
            return Self { tags, explicit: false };
        }

        Self::default()
    }

    fn clean<S: AsRef<str>>(raw: &[S]) -> Vec<String> {
        let mut tags: Vec<String> = Vec::with_capacity(raw.len());
        for tag in raw {
            let tag = tag.as_ref().trim();
            if tag.is_empty() || tags.iter().any(|t| t.eq_ignore_ascii_case(tag)) {
                continue;
            }
            tags.push(tag.to_string());
        }
        tags
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Highest-priority tag
    pub fn primary(&self) -> &str {
        &self.tags[0]
    }

    pub fn is_explicit(&self) -> bool {
        self.explicit
    }
}

impl Default for LanguagePreference {
    fn default() -> Self {
        Self {
            tags: vec![Self::DEFAULT_TAG.to_string()],
            explicit: false,
        }
    }
}

/// One caption/subtitle stream advertised for a video
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptTrack {
    pub language_code: String,
    pub is_auto_generated: bool,
    /// Display name reported by the source (e.g. "English (auto-generated)")
    pub source_name: String,
    /// Opaque handle the owning provider uses to fetch the track (URL or file path)
    pub locator: String,
}

/// A single timed caption cue
#[derive(Debug, Clone, PartialEq)]
pub struct TimedEntry {
    pub text: String,
    /// Offset from the start of the video, in seconds
    pub start_offset: f64,
}

/// Successful provider output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptPayload {
    pub text: String,
    pub language_code: String,
    pub is_auto_generated: bool,
}

/// Caller-facing error taxonomy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    InvalidIdentifier,
    Disabled,
    NotFound,
    Unavailable,
    Transient,
    AllMethodsFailed,
    InternalError,
    Cancelled,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidIdentifier => "InvalidIdentifier",
            Self::Disabled => "Disabled",
            Self::NotFound => "NotFound",
            Self::Unavailable => "Unavailable",
            Self::Transient => "Transient",
            Self::AllMethodsFailed => "AllMethodsFailed",
            Self::InternalError => "InternalError",
            Self::Cancelled => "Cancelled",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Diagnostic record of one provider's part in a request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderAttempt {
    pub provider_name: String,
    /// Retries beyond the first call
    pub retry_count: u32,
    pub last_error_kind: ErrorKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub kind: ErrorKind,
    pub message: String,
    pub attempts: Vec<ProviderAttempt>,
}

/// The orchestrator's only return value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptResult {
    pub success: bool,
    pub text: Option<String>,
    pub language_used: Option<String>,
    pub is_auto_generated: Option<bool>,
    pub source_name: Option<String>,
    pub error: Option<ErrorInfo>,
}

impl TranscriptResult {
    pub fn succeeded(payload: TranscriptPayload, source_name: impl Into<String>) -> Self {
        Self {
            success: true,
            text: Some(payload.text),
            language_used: Some(payload.language_code),
            is_auto_generated: Some(payload.is_auto_generated),
            source_name: Some(source_name.into()),
            error: None,
        }
    }

    pub fn failed(kind: ErrorKind, message: impl Into<String>, attempts: Vec<ProviderAttempt>) -> Self {
        Self {
            success: false,
            text: None,
            language_used: None,
            is_auto_generated: None,
            source_name: None,
            error: Some(ErrorInfo {
                kind,
                message: message.into(),
                attempts,
            }),
        }
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.error.as_ref().map(|e| e.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_preference_keeps_priority_and_dedups() {
        let prefs = LanguagePreference::new(&[" de ", "en", "", "DE", "fr"], &[]);
        assert_eq!(prefs.tags(), ["de", "en", "fr"]);
        assert_eq!(prefs.primary(), "de");
        assert!(prefs.is_explicit());
    }

    #[test]
    fn test_language_preference_falls_back_to_defaults() {
        let defaults = vec!["en".to_string(), "en-US".to_string()];
        let prefs = LanguagePreference::new::<&str>(&[], &defaults);
        assert_eq!(prefs.tags(), ["en", "en-US"]);
        assert!(!prefs.is_explicit());

        let prefs = LanguagePreference::new(&["  "], &[]);
        assert_eq!(prefs.tags(), ["en"]);
        assert!(!prefs.is_explicit());
    }

    #[test]
    fn test_result_populates_exactly_one_side() {
        let ok = TranscriptResult::succeeded(
            TranscriptPayload {
                text: "hi".to_string(),
                language_code: "en".to_string(),
                is_auto_generated: false,
            },
            "captions",
        );
        assert!(ok.success && ok.error.is_none() && ok.text.is_some());

        let err = TranscriptResult::failed(ErrorKind::NotFound, "nothing", Vec::new());
        assert!(!err.success && err.text.is_none());
        assert_eq!(err.error_kind(), Some(ErrorKind::NotFound));
    }
}
