// Audio-transcription provider - media URL resolution plus speech-to-text

use async_trait::async_trait;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::transcript::diagnostics::{diagnose_error, FailureReason};
use crate::transcript::errors::ProviderError;
use crate::transcript::models::{LanguagePreference, TranscriptPayload, VideoRef};
use crate::transcript::traits::{JobStatus, MediaUrlResolver, SpeechToText, TranscriptProvider};

/// Polling limits for a speech-to-text job
#[derive(Debug, Clone)]
pub struct PollConfig {
    pub interval: Duration,
    pub max_polls: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(3),
            max_polls: 200,
        }
    }
}

pub struct AudioTranscriptionProvider<R, S> {
    name: String,
    resolver: R,
    speech: S,
    poll: PollConfig,
}

impl<R: MediaUrlResolver, S: SpeechToText> AudioTranscriptionProvider<R, S> {
    pub const DEFAULT_NAME: &'static str = "speech-to-text";

    pub fn new(resolver: R, speech: S, poll: PollConfig) -> Self {
        Self {
            name: Self::DEFAULT_NAME.to_string(),
            resolver,
            speech,
            poll,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

/// Terminal job error: recoverable conditions retry, everything else is permanent
pub fn classify_job_error(message: &str) -> ProviderError {
    match diagnose_error(message) {
        Some(reason) if reason.is_retryable() => reason.into_provider_error(message),
        Some(FailureReason::Unknown) | None => ProviderError::Unavailable(format!(
            "Transcription failed: {}",
            if message.is_empty() { "no reason given" } else { message }
        )),
        Some(reason) => reason.into_provider_error(message),
    }
}

#[async_trait]
impl<R: MediaUrlResolver, S: SpeechToText> TranscriptProvider for AudioTranscriptionProvider<R, S> {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(
        &self,
        video: &VideoRef,
        prefs: &LanguagePreference,
    ) -> Result<TranscriptPayload, ProviderError> {
        let media_url = self.resolver.resolve_audio_url(video).await?;
        debug!(provider = %self.name, video = %video.canonical_id(), "Resolved audio URL");

        // Configured defaults are only a ranking; let the service detect the spoken language
        let language = prefs.is_explicit().then(|| prefs.primary());
        let job = self.speech.submit(&media_url, language).await?;
        info!(provider = %self.name, job = %job, "Submitted transcription job");

        for poll in 1..=self.poll.max_polls {
            let state = self.speech.poll(&job).await?;
            debug!(provider = %self.name, job = %job, poll, status = ?state.status, "Polled transcription job");

            match state.status {
                JobStatus::Completed => {
                    let text = state
                        .text
                        .map(|t| t.split_whitespace().collect::<Vec<_>>().join(" "))
                        .unwrap_or_default();
                    if text.is_empty() {
                        return Err(ProviderError::EmptyResult);
                    }
                    return Ok(TranscriptPayload {
                        text,
                        language_code: state
                            .language_code
                            .unwrap_or_else(|| prefs.primary().to_string()),
                        is_auto_generated: true,
                    });
                }
                JobStatus::Error => {
                    let message = state.error.unwrap_or_default();
                    warn!(provider = %self.name, job = %job, error = %message, "Transcription job failed");
                    return Err(classify_job_error(&message));
                }
                JobStatus::Queued | JobStatus::Processing => sleep(self.poll.interval).await,
            }
        }

        Err(ProviderError::Transient(format!(
            "Transcription job {} still running after {} polls",
            job, self.poll.max_polls
        )))
    }
}
