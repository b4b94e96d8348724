// Provider chain assembly from settings, done once at startup

use std::str::FromStr;
use std::time::Duration;
use tracing::{info, warn};

use super::backends::{assembly_ai::AssemblyAi, youtube::YoutubeCaptionIndex, ytdlp::YtDlp};
use super::errors::ProviderError;
use super::orchestrator::TranscriptOrchestrator;
use super::providers::{AudioTranscriptionProvider, CaptionTrackProvider, PollConfig, SubtitleFileProvider};
use super::tools::ToolManager;
use super::traits::TranscriptProvider;
use crate::config::Settings;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Captions,
    Subtitles,
    Audio,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Captions => "captions",
            ProviderKind::Subtitles => "subtitles",
            ProviderKind::Audio => "audio",
        }
    }
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "captions" | "youtube-captions" => Ok(ProviderKind::Captions),
            "subtitles" | "yt-dlp" | "yt-dlp-subtitles" => Ok(ProviderKind::Subtitles),
            "audio" | "speech-to-text" => Ok(ProviderKind::Audio),
            other => Err(format!("Unknown provider: {}", other)),
        }
    }
}

/// Parse the configured chain, dropping unknown names and repeats
pub fn parse_chain(names: &[String]) -> Vec<ProviderKind> {
    let mut chain = Vec::with_capacity(names.len());
    for name in names {
        match name.parse::<ProviderKind>() {
            Ok(kind) if !chain.contains(&kind) => chain.push(kind),
            Ok(kind) => warn!(provider = kind.as_str(), "Provider listed twice, keeping the first"),
            Err(e) => warn!("{}", e),
        }
    }
    chain
}

struct ChainBuilder<'a> {
    settings: &'a Settings,
    ytdlp: Option<YtDlp>,
}

impl<'a> ChainBuilder<'a> {
    fn new(settings: &'a Settings, tools: &ToolManager) -> Self {
        let info = tools.get_tool_info(&settings.ytdlp.binary);
        let ytdlp = match info.path {
            Some(path) => {
                info!(path = %path, version = ?info.version, "Found yt-dlp");
                Some(
                    YtDlp::new(path)
                        .with_proxy(settings.network.proxy.clone())
                        .with_cookies(settings.network.cookies_path.clone())
                        .with_socket_timeout(settings.ytdlp.socket_timeout_secs)
                        .with_timeout(settings.provider_timeout()),
                )
            }
            None => None,
        };

        Self { settings, ytdlp }
    }

    fn build(&self, kind: ProviderKind) -> Result<Option<Box<dyn TranscriptProvider>>, ProviderError> {
        let settings = self.settings;

        let provider: Box<dyn TranscriptProvider> = match kind {
            ProviderKind::Captions => {
                let index = YoutubeCaptionIndex::new(
                    settings.network.proxy.as_deref(),
                    settings.network.http_timeout(),
                )?;
                Box::new(CaptionTrackProvider::new(index))
            }
            ProviderKind::Subtitles => match &self.ytdlp {
                Some(ytdlp) => Box::new(SubtitleFileProvider::new(ytdlp.clone())),
                None => {
                    warn!(binary = %settings.ytdlp.binary, "yt-dlp not found, skipping subtitle provider");
                    return Ok(None);
                }
            },
            ProviderKind::Audio => {
                let api_key = match settings.speech.api_key.as_deref().filter(|k| !k.trim().is_empty()) {
                    Some(key) => key,
                    None => {
                        warn!("No speech-to-text API key configured, skipping audio provider");
                        return Ok(None);
                    }
                };
                let ytdlp = match &self.ytdlp {
                    Some(ytdlp) => ytdlp.clone(),
                    None => {
                        warn!(binary = %settings.ytdlp.binary, "yt-dlp not found, skipping audio provider");
                        return Ok(None);
                    }
                };
                let speech = AssemblyAi::new(
                    api_key,
                    &settings.speech.base_url,
                    settings.network.proxy.as_deref(),
                    settings.network.http_timeout(),
                )?;
                let poll = PollConfig {
                    interval: Duration::from_millis(settings.speech.poll_interval_ms),
                    max_polls: settings.speech.max_polls,
                };
                Box::new(AudioTranscriptionProvider::new(ytdlp, speech, poll))
            }
        };

        Ok(Some(provider))
    }
}

/// Build the orchestrator with every configured provider that can run here
pub fn build_orchestrator(settings: &Settings, tools: &ToolManager) -> Result<TranscriptOrchestrator, ProviderError> {
    let mut orchestrator = TranscriptOrchestrator::new(settings.retry.policy())
        .with_attempt_timeout(settings.provider_timeout())
        .with_strict_ids(settings.transcript.strict_ids)
        .with_default_languages(settings.transcript.default_languages.clone());

    let builder = ChainBuilder::new(settings, tools);
    for kind in parse_chain(&settings.transcript.chain) {
        if let Some(provider) = builder.build(kind)? {
            orchestrator.add_provider(provider);
        }
    }

    info!(chain = ?orchestrator.provider_names(), "Transcript chain ready");
    if orchestrator.provider_names().is_empty() {
        warn!("No transcript providers are available; every request will fail");
    }

    Ok(orchestrator)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_chain_keeps_order_and_drops_junk() {
        let names: Vec<String> = ["audio", " Captions ", "bogus", "captions", "yt-dlp"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        assert_eq!(
            parse_chain(&names),
            [ProviderKind::Audio, ProviderKind::Captions, ProviderKind::Subtitles]
        );
    }

    #[test]
    fn test_missing_tools_are_skipped() {
        let mut settings = Settings::defaults().unwrap();
        settings.ytdlp.binary = "/nonexistent/dir/yt-dlp".to_string();
        settings.speech.api_key = Some("key".to_string());

        let orchestrator = build_orchestrator(&settings, &ToolManager::new()).unwrap();
        assert_eq!(orchestrator.provider_names(), ["youtube-captions"]);
    }

    #[test]
    fn test_empty_chain_builds() {
        let mut settings = Settings::defaults().unwrap();
        settings.transcript.chain.clear();

        let orchestrator = build_orchestrator(&settings, &ToolManager::new()).unwrap();
        assert!(orchestrator.provider_names().is_empty());
    }
}
