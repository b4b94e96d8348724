// Failure diagnostics - maps raw upstream error text into the provider taxonomy
//
// Every provider funnels stderr / response bodies through `classify` as soon
// as they are received, so nothing downstream ever looks at raw strings.

use serde::{Deserialize, Serialize};

use super::errors::ProviderError;

/// Why an upstream call failed, as far as its error text tells us
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureReason {
    /// Owner switched captions off
    SubtitlesDisabled,

    /// No track in any requested language
    NoSubtitles,

    /// Age-restricted content requiring login
    AgeRestricted,

    /// Member-only content (requires channel membership)
    MembersOnly,

    /// Private video requiring authorization
    PrivateVideo,

    /// Video deleted or unavailable
    VideoUnavailable,

    /// Geographic restriction
    GeoBlocked,

    /// PO Token (Proof of Origin) required
    PoTokenRequired,

    /// HTTP 403 Forbidden - general access denied
    Http403Forbidden,

    /// Rate limiting (429 or similar)
    RateLimited,

    /// Speech-to-text quota or credit exhaustion
    QuotaExceeded,

    /// Bot detection triggered
    BotDetection,

    /// Network timeout or refused connection
    NetworkTimeout,

    /// Upstream 5xx or overload
    ServerError,

    /// Generic/unknown failure
    Unknown,
}

impl FailureReason {
    /// Worth retrying within the same provider
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimited
                | Self::QuotaExceeded
                | Self::BotDetection
                | Self::NetworkTimeout
                | Self::ServerError
        )
    }

    /// Human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            Self::SubtitlesDisabled => "Subtitles are disabled for this video",
            Self::NoSubtitles => "No subtitles in the requested languages",
            Self::AgeRestricted => "Age-restricted content",
            Self::MembersOnly => "Members-only content",
            Self::PrivateVideo => "Private video",
            Self::VideoUnavailable => "Video unavailable",
            Self::GeoBlocked => "Geographic restriction",
            Self::PoTokenRequired => "Proof of Origin token required",
            Self::Http403Forbidden => "Access denied (HTTP 403)",
            Self::RateLimited => "Rate limited by upstream",
            Self::QuotaExceeded => "Transcription quota exceeded",
            Self::BotDetection => "Bot detection triggered",
            Self::NetworkTimeout => "Network timeout",
            Self::ServerError => "Upstream server error",
            Self::Unknown => "Unclassified upstream failure",
        }
    }

    /// Fold into the provider taxonomy, keeping `detail` for diagnostics
    pub fn into_provider_error(self, detail: &str) -> ProviderError {
        let message = if detail.is_empty() {
            self.description().to_string()
        } else {
            format!("{} ({})", self.description(), detail)
        };

        match self {
            Self::SubtitlesDisabled => ProviderError::Disabled(message),
            Self::NoSubtitles => ProviderError::NotFound(message),
            Self::AgeRestricted
            | Self::MembersOnly
            | Self::PrivateVideo
            | Self::VideoUnavailable
            | Self::GeoBlocked
            | Self::PoTokenRequired
            | Self::Http403Forbidden => ProviderError::Unavailable(message),
            Self::RateLimited
            | Self::QuotaExceeded
            | Self::BotDetection
            | Self::NetworkTimeout
            | Self::ServerError => ProviderError::Transient(message),
            Self::Unknown => ProviderError::Internal(message),
        }
    }
}

/// Pattern table, checked in order of specificity
const PATTERNS: &[(FailureReason, &[&str])] = &[
    (
        FailureReason::SubtitlesDisabled,
        &[
            "transcripts are disabled",
            "subtitles are disabled",
            "captions are disabled",
            "captions disabled",
        ],
    ),
    (
        FailureReason::NoSubtitles,
        &[
            "there are no subtitles",
            "has no subtitles",
            "no subtitles for the requested languages",
            "no transcript",
            "no captions",
        ],
    ),
    (
        FailureReason::AgeRestricted,
        &["age-restricted", "sign in to confirm your age", "age_verification"],
    ),
    (
        FailureReason::MembersOnly,
        &[
            "members only",
            "members-only",
            "join this channel",
            "membership required",
            "available to members",
        ],
    ),
    (
        FailureReason::PrivateVideo,
        &[
            "private video",
            "video is private",
            "sign in if you've been granted access",
        ],
    ),
    (
        FailureReason::VideoUnavailable,
        &[
            "video unavailable",
            "video has been removed",
            "this video is no longer available",
            "video is unavailable",
            "incomplete youtube id",
            "does not exist",
        ],
    ),
    (
        FailureReason::GeoBlocked,
        &[
            "not available in your country",
            "blocked in your country",
            "geo restrict",
            "geo-restrict",
            "georestrict",
            "geographic restriction",
        ],
    ),
    (
        FailureReason::PoTokenRequired,
        &["po token", "proof of origin"],
    ),
    (
        FailureReason::QuotaExceeded,
        &["quota", "insufficient credits", "account balance", "payment required"],
    ),
    (
        FailureReason::RateLimited,
        &[
            "http error 429",
            "http 429",
            "status 429",
            "status code 429",
            "rate limit",
            "rate-limit",
            "too many requests",
        ],
    ),
    (
        FailureReason::BotDetection,
        &[
            "not a bot",
            "bot detection",
            "captcha",
            "unusual traffic",
            "automated queries",
        ],
    ),
    (
        FailureReason::Http403Forbidden,
        &[
            "http error 403",
            "http 403",
            "status 403",
            "status code 403",
            "forbidden",
        ],
    ),
    (
        FailureReason::NetworkTimeout,
        &[
            "timeout",
            "timed out",
            "connection refused",
            "connection reset",
            "network unreachable",
            "network is unreachable",
            "temporary failure in name resolution",
        ],
    ),
    (
        FailureReason::ServerError,
        &[
            "http error 5",
            "internal server error",
            "service unavailable",
            "bad gateway",
            "overloaded",
        ],
    ),
];

/// Analyze error message and return the failure reason
pub fn diagnose_error(error: &str) -> Option<FailureReason> {
    if error.trim().is_empty() {
        return None;
    }

    let lower = error.to_lowercase();

    PATTERNS
        .iter()
        .find(|(_, needles)| needles.iter().any(|n| lower.contains(n)))
        .map(|(reason, _)| *reason)
        .or(Some(FailureReason::Unknown))
}

/// Detailed diagnostics for logging
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureDiagnostics {
    pub reason: FailureReason,

    /// Most relevant line of the raw error
    pub context: Option<String>,

    /// Raw patterns that matched
    pub matched_patterns: Vec<String>,
}

/// Full diagnostic analysis of an error
pub fn analyze_error(error: &str) -> FailureDiagnostics {
    let reason = diagnose_error(error).unwrap_or(FailureReason::Unknown);
    let lower = error.to_lowercase();

    let matched_patterns = PATTERNS
        .iter()
        .flat_map(|(_, needles)| needles.iter())
        .filter(|n| lower.contains(*n))
        .map(|n| n.to_string())
        .collect();

    // First useful line; yt-dlp prefixes the real cause with "ERROR:"
    let context = error
        .lines()
        .map(str::trim)
        .find(|l| l.to_lowercase().starts_with("error:"))
        .or_else(|| error.lines().map(str::trim).find(|l| !l.is_empty()))
        .map(|l| l.chars().take(300).collect::<String>());

    FailureDiagnostics {
        reason,
        context,
        matched_patterns,
    }
}

/// Classify raw upstream error text into a [`ProviderError`]
pub fn classify(error: &str) -> ProviderError {
    let diagnostics = analyze_error(error);
    let detail = diagnostics.context.unwrap_or_default();
    diagnostics.reason.into_provider_error(&detail)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_403_detection() {
        let error = "ERROR: HTTP Error 403: Forbidden";
        assert_eq!(diagnose_error(error), Some(FailureReason::Http403Forbidden));
    }

    #[test]
    fn test_status_digits_inside_video_id() {
        let error = "ERROR: [youtube] ab429cdefgh: Requested format is not available";
        assert_eq!(diagnose_error(error), Some(FailureReason::Unknown));
        assert!(!classify(error).is_retryable());

        let error = "ERROR: [youtube] x403yzabcde: Private video";
        assert_eq!(diagnose_error(error), Some(FailureReason::PrivateVideo));
    }

    #[test]
    fn test_status_codes_in_context() {
        assert_eq!(
            diagnose_error("ERROR: unable to download video data: HTTP Error 429: Too Many Requests"),
            Some(FailureReason::RateLimited)
        );
        assert_eq!(diagnose_error("HTTP 429: "), Some(FailureReason::RateLimited));
        assert_eq!(
            diagnose_error("server responded with status 403"),
            Some(FailureReason::Http403Forbidden)
        );
    }

    #[test]
    fn test_disabled_detection() {
        let error = "Transcripts are disabled for this video";
        assert_eq!(diagnose_error(error), Some(FailureReason::SubtitlesDisabled));
        assert!(matches!(classify(error), ProviderError::Disabled(_)));
    }

    #[test]
    fn test_no_subtitles_detection() {
        let error = "[info] abcdefghijk: There are no subtitles for the requested languages";
        assert!(matches!(classify(error), ProviderError::NotFound(_)));
    }

    #[test]
    fn test_bot_detection_is_transient() {
        let error = "ERROR: [youtube] abc: Sign in to confirm you're not a bot";
        assert_eq!(diagnose_error(error), Some(FailureReason::BotDetection));
        assert!(classify(error).is_retryable());
    }

    #[test]
    fn test_age_restricted_detection() {
        let error = "Sign in to confirm your age";
        assert_eq!(diagnose_error(error), Some(FailureReason::AgeRestricted));
        assert!(matches!(classify(error), ProviderError::Unavailable(_)));
    }

    #[test]
    fn test_timeout_detection() {
        let error = "Timed out after 30s";
        assert_eq!(diagnose_error(error), Some(FailureReason::NetworkTimeout));
    }

    #[test]
    fn test_geo_detection() {
        let error = "Video not available in your country";
        assert_eq!(diagnose_error(error), Some(FailureReason::GeoBlocked));
    }

    #[test]
    fn test_quota_is_transient() {
        let error = "Monthly quota exceeded for this account";
        assert_eq!(diagnose_error(error), Some(FailureReason::QuotaExceeded));
        assert!(classify(error).is_retryable());
    }

    #[test]
    fn test_unknown_is_internal() {
        assert!(matches!(classify("segfault in ffmpeg"), ProviderError::Internal(_)));
        assert_eq!(diagnose_error("   "), None);
    }

    #[test]
    fn test_context_prefers_error_line() {
        let raw = "[youtube] Extracting URL\nERROR: [youtube] x: Video unavailable\n";
        let diag = analyze_error(raw);
        assert_eq!(diag.reason, FailureReason::VideoUnavailable);
        assert_eq!(diag.context.as_deref(), Some("ERROR: [youtube] x: Video unavailable"));
        assert!(diag.matched_patterns.contains(&"video unavailable".to_string()));
    }
}
