// Orchestrator - ordered provider chain with retry, timeout and fallback
//
// Flow per request:
// 1. Normalize the identifier (failure short-circuits, no provider runs)
// 2. Try each provider in order under the shared retry policy
// 3. First success wins; otherwise aggregate every failure

use std::future::{self, Future};
use std::time::Duration;
use tokio::time::timeout;
use tracing::{error, info, warn};

use super::errors::ProviderError;
use super::models::{
    ErrorKind, LanguagePreference, ProviderAttempt, TranscriptPayload, TranscriptResult, VideoRef,
};
use super::retry::{Retried, RetryPolicy};
use super::traits::TranscriptProvider;
use super::video_id::normalize;

pub struct TranscriptOrchestrator {
    providers: Vec<Box<dyn TranscriptProvider>>,
    retry: RetryPolicy,
    attempt_timeout: Duration,
    strict_ids: bool,
    default_languages: Vec<String>,
}

impl TranscriptOrchestrator {
    pub fn new(retry: RetryPolicy) -> Self {
        Self {
            providers: Vec::new(),
            retry,
            attempt_timeout: Duration::from_secs(60),
            strict_ids: true,
            default_languages: vec![LanguagePreference::DEFAULT_TAG.to_string()],
        }
    }

    /// Limit for a single provider call; running over counts as a transient failure
    pub fn with_attempt_timeout(mut self, limit: Duration) -> Self {
        self.attempt_timeout = limit;
        self
    }

    pub fn with_strict_ids(mut self, strict: bool) -> Self {
        self.strict_ids = strict;
        self
    }

    /// Languages used when a request names none
    pub fn with_default_languages(mut self, languages: Vec<String>) -> Self {
        self.default_languages = languages;
        self
    }

    pub fn add_provider(&mut self, provider: Box<dyn TranscriptProvider>) {
        self.providers.push(provider);
    }

    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    pub async fn fetch(&self, raw_input: &str, preferred_languages: &[String]) -> TranscriptResult {
        self.fetch_until(raw_input, preferred_languages, future::pending()).await
    }

    /// Like [`fetch`](Self::fetch), but gives up with `Cancelled` as soon as
    /// `cancel` resolves. The in-flight provider call is dropped.
    pub async fn fetch_until<C>(
        &self,
        raw_input: &str,
        preferred_languages: &[String],
        cancel: C,
    ) -> TranscriptResult
    where
        C: Future<Output = ()>,
    {
        let video = match normalize(raw_input, self.strict_ids) {
            Ok(video) => video,
            Err(e) => {
                warn!(input = %raw_input, "Rejected video identifier");
                return TranscriptResult::failed(ErrorKind::InvalidIdentifier, e.to_string(), Vec::new());
            }
        };
        let prefs = LanguagePreference::new(preferred_languages, &self.default_languages);

        tokio::pin!(cancel);

        let mut attempts: Vec<ProviderAttempt> = Vec::with_capacity(self.providers.len());
        let mut failures: Vec<String> = Vec::with_capacity(self.providers.len());

        for provider in &self.providers {
            let name = provider.name();
            info!(provider = name, video = %video.canonical_id(), "Trying provider");

            let retried = tokio::select! {
                biased;
                _ = &mut cancel => {
                    warn!(provider = name, "Request cancelled");
                    return TranscriptResult::failed(
                        ErrorKind::Cancelled,
                        "Request was cancelled",
                        attempts,
                    );
                }
                retried = self.try_provider(provider.as_ref(), &video, &prefs) => retried,
            };

            let retry_count = retried.retry_count();
            match retried.result {
                Ok(payload) => {
                    info!(
                        provider = name,
                        language = %payload.language_code,
                        auto = payload.is_auto_generated,
                        retries = retry_count,
                        "Transcript acquired"
                    );
                    return TranscriptResult::succeeded(payload, name);
                }
                Err(e) => {
                    if let ProviderError::Internal(detail) = &e {
                        error!(provider = name, video = %video.canonical_id(), detail = %detail, "Provider failed unexpectedly");
                    } else {
                        warn!(provider = name, kind = %e.kind(), retries = retry_count, error = %e, "Provider failed");
                    }

                    failures.push(format!("{}: {}", name, e));
                    attempts.push(ProviderAttempt {
                        provider_name: name.to_string(),
                        retry_count,
                        last_error_kind: e.kind(),
                    });
                }
            }
        }

        let message = if failures.is_empty() {
            "No transcript providers are configured".to_string()
        } else {
            format!("All transcript methods failed. {}", failures.join("; "))
        };
        warn!(video = %video.canonical_id(), tried = attempts.len(), "All providers exhausted");

        TranscriptResult::failed(ErrorKind::AllMethodsFailed, message, attempts)
    }

    async fn try_provider(
        &self,
        provider: &dyn TranscriptProvider,
        video: &VideoRef,
        prefs: &LanguagePreference,
    ) -> Retried<TranscriptPayload> {
        let limit = self.attempt_timeout;

        self.retry
            .run(move || async move {
                match timeout(limit, provider.fetch(video, prefs)).await {
                    Ok(result) => result,
                    Err(_) => Err(ProviderError::Transient(format!(
                        "{} did not answer within {}s",
                        provider.name(),
                        limit.as_secs_f64()
                    ))),
                }
            })
            .await
    }
}
