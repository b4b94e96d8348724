// Provider and collaborator trait definitions

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::errors::ProviderError;
use super::models::{LanguagePreference, TimedEntry, TranscriptPayload, TranscriptTrack, VideoRef};

/// One transcript acquisition strategy
#[async_trait]
pub trait TranscriptProvider: Send + Sync {
    /// Name of the provider (reported as the transcript source)
    fn name(&self) -> &str;

    /// Fetch a transcript, or a classified failure
    async fn fetch(
        &self,
        video: &VideoRef,
        prefs: &LanguagePreference,
    ) -> Result<TranscriptPayload, ProviderError>;
}

/// Index of caption tracks published for a video
#[async_trait]
pub trait CaptionIndex: Send + Sync {
    async fn list_tracks(&self, video_id: &str) -> Result<Vec<TranscriptTrack>, ProviderError>;

    async fn fetch_track(&self, track: &TranscriptTrack) -> Result<Vec<TimedEntry>, ProviderError>;
}

/// Out-of-process subtitle downloader
#[async_trait]
pub trait SubtitleDownloader: Send + Sync {
    /// Download timed-text files for `video` into `dir`, returning the files written.
    ///
    /// Machine-generated tracks carry an `.auto.` marker in their file name.
    async fn download(
        &self,
        video: &VideoRef,
        prefs: &LanguagePreference,
        dir: &Path,
    ) -> Result<Vec<PathBuf>, ProviderError>;
}

/// Resolves a direct, fetchable media URL for a video's audio
#[async_trait]
pub trait MediaUrlResolver: Send + Sync {
    async fn resolve_audio_url(&self, video: &VideoRef) -> Result<String, ProviderError>;
}

/// Speech-to-text job status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Processing,
    Completed,
    Error,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Error)
    }
}

/// One poll of a speech-to-text job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobState {
    pub status: JobStatus,
    pub text: Option<String>,
    pub error: Option<String>,
    pub language_code: Option<String>,
}

/// External speech-to-text service
#[async_trait]
pub trait SpeechToText: Send + Sync {
    /// Submit a media URL, returning a job handle
    async fn submit(&self, media_url: &str, language: Option<&str>) -> Result<String, ProviderError>;

    async fn poll(&self, job: &str) -> Result<JobState, ProviderError>;
}
