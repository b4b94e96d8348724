// Structured-caption provider - caption index lookup plus timed entries

use async_trait::async_trait;
use tracing::{debug, info};

use crate::transcript::errors::ProviderError;
use crate::transcript::language;
use crate::transcript::models::{LanguagePreference, TimedEntry, TranscriptPayload, VideoRef};
use crate::transcript::traits::{CaptionIndex, TranscriptProvider};

pub struct CaptionTrackProvider<C> {
    name: String,
    index: C,
}

impl<C: CaptionIndex> CaptionTrackProvider<C> {
    pub const DEFAULT_NAME: &'static str = "youtube-captions";

    pub fn new(index: C) -> Self {
        Self::named(Self::DEFAULT_NAME, index)
    }

    pub fn named(name: impl Into<String>, index: C) -> Self {
        Self {
            name: name.into(),
            index,
        }
    }
}

/// Chronological concatenation; newlines inside an entry become single spaces
pub fn join_entries(mut entries: Vec<TimedEntry>) -> String {
    entries.sort_by(|a, b| a.start_offset.total_cmp(&b.start_offset));

    entries
        .iter()
        .map(|e| e.text.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string()
}

#[async_trait]
impl<C: CaptionIndex> TranscriptProvider for CaptionTrackProvider<C> {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(
        &self,
        video: &VideoRef,
        prefs: &LanguagePreference,
    ) -> Result<TranscriptPayload, ProviderError> {
        let tracks = self.index.list_tracks(video.canonical_id()).await?;
        debug!(provider = %self.name, count = tracks.len(), "Caption tracks listed");

        let track = language::select(prefs, &tracks)
            .map_err(|e| ProviderError::NotFound(e.to_string()))?;

        info!(
            provider = %self.name,
            language = %track.language_code,
            auto = track.is_auto_generated,
            "Selected caption track"
        );

        let entries = self.index.fetch_track(&track).await?;
        let text = join_entries(entries);
        if text.is_empty() {
            return Err(ProviderError::EmptyResult);
        }

        Ok(TranscriptPayload {
            text,
            language_code: track.language_code,
            is_auto_generated: track.is_auto_generated,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcript::models::TranscriptTrack;
    use crate::transcript::video_id::normalize;

    struct FakeIndex {
        tracks: Vec<TranscriptTrack>,
        entries: Vec<TimedEntry>,
    }

    #[async_trait]
    impl CaptionIndex for FakeIndex {
        async fn list_tracks(&self, _video_id: &str) -> Result<Vec<TranscriptTrack>, ProviderError> {
            Ok(self.tracks.clone())
        }

        async fn fetch_track(&self, track: &TranscriptTrack) -> Result<Vec<TimedEntry>, ProviderError> {
            assert_eq!(track.locator, "manual-en");
            Ok(self.entries.clone())
        }
    }

    fn entry(text: &str, start: f64) -> TimedEntry {
        TimedEntry {
            text: text.to_string(),
            start_offset: start,
        }
    }

    fn tracks() -> Vec<TranscriptTrack> {
        vec![
            TranscriptTrack {
                language_code: "en".to_string(),
                is_auto_generated: true,
                source_name: "English (auto-generated)".to_string(),
                locator: "auto-en".to_string(),
            },
            TranscriptTrack {
                language_code: "en".to_string(),
                is_auto_generated: false,
                source_name: "English".to_string(),
                locator: "manual-en".to_string(),
            },
        ]
    }

    #[test]
    fn test_join_orders_and_collapses() {
        let text = join_entries(vec![
            entry("world\nagain ", 2.0),
            entry("  hello", 0.5),
            entry("   ", 1.0),
        ]);
        assert_eq!(text, "hello world again");
    }

    #[tokio::test]
    async fn test_fetches_manual_track() {
        let provider = CaptionTrackProvider::new(FakeIndex {
            tracks: tracks(),
            entries: vec![entry("hello", 0.0), entry("world", 1.0)],
        });
        let video = normalize("dQw4w9WgXcQ", true).unwrap();

        let payload = provider
            .fetch(&video, &LanguagePreference::default())
            .await
            .unwrap();

        assert_eq!(payload.text, "hello world");
        assert_eq!(payload.language_code, "en");
        assert!(!payload.is_auto_generated);
    }

    #[tokio::test]
    async fn test_whitespace_only_is_empty_result() {
        let provider = CaptionTrackProvider::new(FakeIndex {
            tracks: tracks(),
            entries: vec![entry(" \n ", 0.0)],
        });
        let video = normalize("dQw4w9WgXcQ", true).unwrap();

        let err = provider
            .fetch(&video, &LanguagePreference::default())
            .await
            .unwrap_err();
        assert_eq!(err, ProviderError::EmptyResult);
    }

    #[tokio::test]
    async fn test_no_tracks_is_not_found() {
        let provider = CaptionTrackProvider::new(FakeIndex {
            tracks: Vec::new(),
            entries: Vec::new(),
        });
        let video = normalize("dQw4w9WgXcQ", true).unwrap();

        let err = provider
            .fetch(&video, &LanguagePreference::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::NotFound(_)));
    }
}
