// YouTube caption index - watch-page scraping plus json3 timed text

use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

use crate::transcript::diagnostics::classify;
use crate::transcript::errors::{from_status, ProviderError};
use crate::transcript::models::{TimedEntry, TranscriptTrack};
use crate::transcript::traits::CaptionIndex;

pub const DEFAULT_BASE_URL: &str = "https://www.youtube.com";

const USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36";

lazy_static! {
    // The page may mention the name before assigning it, e.g. `window["ytInitialPlayerResponse"] = null`
    static ref PLAYER_RESPONSE_ASSIGNMENT: Regex =
        Regex::new(r"ytInitialPlayerResponse\s*=\s*\{").unwrap();
}

pub struct YoutubeCaptionIndex {
    client: reqwest::Client,
    base_url: String,
}

impl YoutubeCaptionIndex {
    pub fn new(proxy: Option<&str>, timeout: Duration) -> Result<Self, ProviderError> {
        let mut builder = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout);
        if let Some(proxy) = proxy {
            let proxy = reqwest::Proxy::all(proxy)
                .map_err(|e| ProviderError::Internal(format!("Invalid proxy URL: {}", e)))?;
            builder = builder.proxy(proxy);
        }

        let client = builder
            .build()
            .map_err(|e| ProviderError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    async fn get_text(&self, url: &str) -> Result<String, ProviderError> {
        let response = self
            .client
            .get(url)
            .header("Accept-Language", "en-US,en;q=0.9")
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            warn!(status = status.as_u16(), url, "YouTube request failed");
            return Err(from_status(status.as_u16(), &body));
        }
        Ok(body)
    }
}

/// Pull the embedded player response object out of a watch page
pub fn extract_player_response(html: &str) -> Option<Value> {
    let assignment = PLAYER_RESPONSE_ASSIGNMENT.find(html)?;
    let open = assignment.end() - 1;

    serde_json::Deserializer::from_str(&html[open..])
        .into_iter::<Value>()
        .next()?
        .ok()
}

fn track_name(track: &Value) -> String {
    let name = &track["name"];
    if let Some(text) = name["simpleText"].as_str() {
        return text.to_string();
    }
    name["runs"]
        .as_array()
        .map(|runs| runs.iter().filter_map(|r| r["text"].as_str()).collect::<String>())
        .unwrap_or_default()
}

/// Turn a watch page into the list of advertised caption tracks
pub fn parse_watch_page(html: &str) -> Result<Vec<TranscriptTrack>, ProviderError> {
    let player = match extract_player_response(html) {
        Some(player) => player,
        None if html.contains("g-recaptcha") => {
            return Err(ProviderError::Transient(
                "Bot check served instead of the watch page".to_string(),
            ))
        }
        None => {
            return Err(ProviderError::Internal(
                "Watch page did not contain player data".to_string(),
            ))
        }
    };

    let playability = &player["playabilityStatus"];
    let status = playability["status"].as_str().unwrap_or("OK");
    if status != "OK" {
        let reason = playability["reason"].as_str().unwrap_or(status);
        return Err(match classify(reason) {
            ProviderError::Internal(_) => ProviderError::Unavailable(format!("{}: {}", status, reason)),
            classified => classified,
        });
    }

    let tracks = match player["captions"]["playerCaptionsTracklistRenderer"]["captionTracks"].as_array() {
        Some(tracks) => tracks,
        None => {
            return Err(ProviderError::Disabled(
                "Subtitles are disabled for this video".to_string(),
            ))
        }
    };

    Ok(tracks
        .iter()
        .filter_map(|track| {
            let locator = track["baseUrl"].as_str()?;
            let language_code = track["languageCode"].as_str()?;
            Some(TranscriptTrack {
                language_code: language_code.to_string(),
                is_auto_generated: track["kind"].as_str() == Some("asr"),
                source_name: track_name(track),
                locator: locator.to_string(),
            })
        })
        .collect())
}

#[derive(Debug, Deserialize)]
struct TimedText {
    #[serde(default)]
    events: Vec<TimedEvent>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TimedEvent {
    #[serde(default)]
    t_start_ms: u64,
    #[serde(default)]
    segs: Vec<Segment>,
}

#[derive(Debug, Deserialize)]
struct Segment {
    #[serde(default)]
    utf8: String,
}

/// Parse a json3 timed-text document into entries
pub fn parse_timed_text(body: &str) -> Result<Vec<TimedEntry>, ProviderError> {
    let doc: TimedText = serde_json::from_str(body)
        .map_err(|e| ProviderError::Internal(format!("Invalid timed-text document: {}", e)))?;

    Ok(doc
        .events
        .into_iter()
        .filter(|e| !e.segs.is_empty())
        .map(|e| TimedEntry {
            text: e.segs.into_iter().map(|s| s.utf8).collect(),
            start_offset: e.t_start_ms as f64 / 1000.0,
        })
        .collect())
}

fn with_json3_format(locator: &str) -> String {
    let separator = if locator.contains('?') { '&' } else { '?' };
    format!("{}{}fmt=json3", locator, separator)
}

#[async_trait]
impl CaptionIndex for YoutubeCaptionIndex {
    async fn list_tracks(&self, video_id: &str) -> Result<Vec<TranscriptTrack>, ProviderError> {
        let url = format!("{}/watch?v={}", self.base_url, video_id);
        let html = self.get_text(&url).await?;
        let tracks = parse_watch_page(&html)?;
        debug!(video = video_id, count = tracks.len(), "Parsed caption tracks");
        Ok(tracks)
    }

    async fn fetch_track(&self, track: &TranscriptTrack) -> Result<Vec<TimedEntry>, ProviderError> {
        let body = self.get_text(&with_json3_format(&track.locator)).await?;
        if body.trim().is_empty() {
            return Err(ProviderError::EmptyResult);
        }
        parse_timed_text(&body)
    }
}
