// Layered service configuration

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::transcript::retry::RetryPolicy;

pub const APP_DIR: &str = "youtube-transcript";

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub app: AppSettings,
    pub transcript: TranscriptSettings,
    pub retry: RetrySettings,
    pub network: NetworkSettings,
    pub ytdlp: YtDlpSettings,
    pub speech: SpeechSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppSettings {
    pub host: String,
    pub port: u16,
}

/// How orchestration outcomes map onto HTTP status codes
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ResponsePolicy {
    /// Always 200; failures are carried in the body
    #[default]
    Permissive,
    /// Status code derived from the error kind
    Strict,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TranscriptSettings {
    /// Provider names in the order they are tried
    pub chain: Vec<String>,
    pub default_languages: Vec<String>,
    pub strict_ids: bool,
    pub response_policy: ResponsePolicy,
    pub expose_attempts: bool,
    pub provider_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub jitter: f64,
}

impl RetrySettings {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts, Duration::from_millis(self.base_delay_ms))
            .with_max_delay(Duration::from_millis(self.max_delay_ms))
            .with_jitter(self.jitter)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct NetworkSettings {
    pub proxy: Option<String>,
    pub cookies_path: Option<String>,
    /// Per-request limit for the caption and speech-to-text HTTP clients
    pub http_timeout_secs: u64,
}

impl NetworkSettings {
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct YtDlpSettings {
    pub binary: String,
    pub socket_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SpeechSettings {
    pub api_key: Option<String>,
    pub base_url: String,
    pub poll_interval_ms: u64,
    pub max_polls: u32,
}

/// Per-user config file, e.g. `~/.config/youtube-transcript/config.toml`
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join("config"))
}

impl Settings {
    pub fn load() -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false));

        if let Some(path) = user_config_path() {
            builder = builder.add_source(File::from(path).required(false));
        }

        let config = Self::with_defaults(builder)?
            .add_source(
                Environment::with_prefix("TRANSCRIPT")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("transcript.chain")
                    .with_list_parse_key("transcript.default_languages"),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Built-in defaults only, ignoring files and the environment
    pub fn defaults() -> Result<Self, ConfigError> {
        Self::with_defaults(Config::builder())?.build()?.try_deserialize()
    }

    fn with_defaults(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        builder
            .set_default("app.host", "0.0.0.0")?
            .set_default("app.port", 8080)?
            .set_default("transcript.chain", vec!["captions", "subtitles", "audio"])?
            .set_default("transcript.default_languages", vec!["en", "en-US", "en-GB"])?
            .set_default("transcript.strict_ids", true)?
            .set_default("transcript.response_policy", "permissive")?
            .set_default("transcript.expose_attempts", false)?
            .set_default("transcript.provider_timeout_secs", 120)?
            .set_default("retry.max_attempts", 3)?
            .set_default("retry.base_delay_ms", 500)?
            .set_default("retry.max_delay_ms", 8000)?
            .set_default("retry.jitter", 0.25)?
            .set_default("network.proxy", None::<String>)?
            .set_default("network.cookies_path", None::<String>)?
            .set_default("network.http_timeout_secs", 30)?
            .set_default("ytdlp.binary", "yt-dlp")?
            .set_default("ytdlp.socket_timeout_secs", 15)?
            .set_default("speech.api_key", None::<String>)?
            .set_default("speech.base_url", crate::transcript::backends::assembly_ai::DEFAULT_BASE_URL)?
            .set_default("speech.poll_interval_ms", 3000)?
            .set_default("speech.max_polls", 200)
    }

    pub fn provider_timeout(&self) -> Duration {
        Duration::from_secs(self.transcript.provider_timeout_secs)
    }
}
