// Subtitle-file provider - out-of-process download of timed-text files
//
// Files land in a per-request scratch directory named
// `<id>[.auto].<lang>.vtt`; the `.auto.` marker flags generated tracks.

use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use std::path::Path;
use tracing::{debug, info};

use crate::transcript::errors::ProviderError;
use crate::transcript::language;
use crate::transcript::models::{LanguagePreference, TranscriptPayload, TranscriptTrack, VideoRef};
use crate::transcript::traits::{SubtitleDownloader, TranscriptProvider};

/// File-name marker for machine-generated subtitle files
pub const AUTO_MARKER: &str = ".auto.";

/// yt-dlp's suffix for the untranslated generated track
const ORIGINAL_SUFFIX: &str = "-orig";

lazy_static! {
    static ref TIMING_RE: Regex =
        Regex::new(r"^(?:\d{1,2}:)?\d{2}:\d{2}[.,]\d{3}\s+-->\s+(?:\d{1,2}:)?\d{2}:\d{2}[.,]\d{3}").unwrap();
    static ref TAG_RE: Regex = Regex::new(r"<[^>]*>").unwrap();
    static ref CUE_NUMBER_RE: Regex = Regex::new(r"^\d+$").unwrap();
}

pub struct SubtitleFileProvider<D> {
    name: String,
    downloader: D,
}

impl<D: SubtitleDownloader> SubtitleFileProvider<D> {
    pub const DEFAULT_NAME: &'static str = "yt-dlp-subtitles";

    pub fn new(downloader: D) -> Self {
        Self::named(Self::DEFAULT_NAME, downloader)
    }

    pub fn named(name: impl Into<String>, downloader: D) -> Self {
        Self {
            name: name.into(),
            downloader,
        }
    }
}

/// Describe a downloaded subtitle file as a track, if its name is parseable
pub fn track_from_path(path: &Path) -> Option<TranscriptTrack> {
    let file_name = path.file_name()?.to_str()?;
    let stem = file_name.strip_suffix(".vtt")?;
    let (_, language_code) = stem.rsplit_once('.')?;
    let language_code = language_code
        .strip_suffix(ORIGINAL_SUFFIX)
        .unwrap_or(language_code);
    if language_code.is_empty() {
        return None;
    }

    let is_auto_generated = file_name.contains(AUTO_MARKER);

    Some(TranscriptTrack {
        language_code: language_code.to_string(),
        is_auto_generated,
        source_name: file_name.to_string(),
        locator: path.to_string_lossy().to_string(),
    })
}

fn decode_entities(line: &str) -> String {
    line.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

/// Reduce WebVTT content to plain text
pub fn clean_vtt(content: &str) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut in_header_block = false;
    let mut raw_lines = content.lines().map(str::trim).peekable();

    while let Some(line) = raw_lines.next() {

        if line.is_empty() {
            in_header_block = false;
            continue;
        }

        if line.starts_with("WEBVTT")
            || line.starts_with("NOTE")
            || line.starts_with("STYLE")
            || line.starts_with("REGION")
        {
            in_header_block = true;
            continue;
        }

        if in_header_block || line.starts_with("Kind:") || line.starts_with("Language:") {
            continue;
        }

        if TIMING_RE.is_match(line) {
            continue;
        }

        // A cue identifier sits directly above its timing line
        if CUE_NUMBER_RE.is_match(line) && raw_lines.peek().is_some_and(|next| TIMING_RE.is_match(next)) {
            continue;
        }

        let text = decode_entities(&TAG_RE.replace_all(line, ""));
        let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
        if text.is_empty() {
            continue;
        }

        // Rolling auto captions repeat the previous line
        if lines.last() == Some(&text) {
            continue;
        }
        lines.push(text);
    }

    lines.join(" ")
}

#[async_trait]
impl<D: SubtitleDownloader> TranscriptProvider for SubtitleFileProvider<D> {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(
        &self,
        video: &VideoRef,
        prefs: &LanguagePreference,
    ) -> Result<TranscriptPayload, ProviderError> {
        let scratch = tempfile::Builder::new()
            .prefix("transcript-")
            .tempdir()
            .map_err(|e| ProviderError::Internal(format!("Failed to create scratch dir: {}", e)))?;

        let files = self.downloader.download(video, prefs, scratch.path()).await?;
        let tracks: Vec<TranscriptTrack> = files.iter().filter_map(|p| track_from_path(p)).collect();
        debug!(provider = %self.name, files = files.len(), tracks = tracks.len(), "Subtitle files downloaded");

        let track = language::select(prefs, &tracks)
            .map_err(|_| ProviderError::NotFound("No subtitle files were produced".to_string()))?;

        info!(
            provider = %self.name,
            file = %track.source_name,
            auto = track.is_auto_generated,
            "Selected subtitle file"
        );

        let content = tokio::fs::read_to_string(&track.locator)
            .await
            .map_err(|e| ProviderError::Internal(format!("Failed to read subtitle file: {}", e)))?;

        let text = clean_vtt(&content);
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
