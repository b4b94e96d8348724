//! AssemblyAI speech-to-text client.
//!
//! Only the two calls the audio provider needs: create a transcript job from
//! a media URL, and read its status back.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use crate::transcript::errors::{from_status, ProviderError};
use crate::transcript::traits::{JobState, JobStatus, SpeechToText};

pub const DEFAULT_BASE_URL: &str = "https://api.assemblyai.com";

#[derive(Debug, Serialize)]
struct CreateTranscriptRequest<'a> {
    audio_url: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    language_code: Option<String>,
    /// Let the service detect the language when none was requested
    language_detection: bool,
}

#[derive(Debug, Deserialize)]
struct TranscriptResponse {
    id: String,
    status: JobStatus,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    language_code: Option<String>,
}

impl From<TranscriptResponse> for JobState {
    fn from(r: TranscriptResponse) -> Self {
        Self {
            status: r.status,
            text: r.text,
            error: r.error,
            language_code: r.language_code,
        }
    }
}

/// BCP-47 style tag to the service's code, e.g. `en-US` to `en_us`
pub fn service_language_code(tag: &str) -> String {
    let code = tag.trim().to_ascii_lowercase().replace('-', "_");
    match code.as_str() {
        "en_gb" => "en_uk".to_string(),
        _ => code,
    }
}

pub struct AssemblyAi {
    client: reqwest::Client,
    base_url: String,
}

impl AssemblyAi {
    pub fn new(
        api_key: &str,
        base_url: &str,
        proxy: Option<&str>,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let mut header_value = HeaderValue::from_str(api_key)
            .map_err(|_| ProviderError::Internal("Invalid API key format".to_string()))?;
        header_value.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, header_value);

        let mut builder = reqwest::Client::builder()
            .default_headers(headers)
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
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn read(&self, response: reqwest::Response) -> Result<TranscriptResponse, ProviderError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), body = %body, "AssemblyAI request failed");
            return Err(from_status(status.as_u16(), &body));
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl SpeechToText for AssemblyAi {
    async fn submit(&self, media_url: &str, language: Option<&str>) -> Result<String, ProviderError> {
        let url = format!("{}/v2/transcript", self.base_url);
        let request = CreateTranscriptRequest {
            audio_url: media_url,
            language_code: language.map(service_language_code),
            language_detection: language.is_none(),
        };

        let response = self.client.post(&url).json(&request).send().await?;
        let transcript = self.read(response).await?;
        debug!(job = %transcript.id, status = ?transcript.status, "Created AssemblyAI transcript");
        Ok(transcript.id)
    }

    async fn poll(&self, job: &str) -> Result<JobState, ProviderError> {
        let url = format!("{}/v2/transcript/{}", self.base_url, job);
        let response = self.client.get(&url).send().await?;
        Ok(self.read(response).await?.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    #[tokio::test]
    async fn test_submit_sends_key_and_url() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/v2/transcript")
            .match_header("authorization", "test_key")
            .match_body(Matcher::Json(serde_json::json!({
                "audio_url": "https://media.example/a.m4a",
                "language_code": "en",
                "language_detection": false
            })))
            .with_status(200)
            .with_body(r#"{"id": "job-42", "status": "queued"}"#)
            .create_async()
            .await;

        let client = AssemblyAi::new("test_key", &server.url(), None, Duration::from_secs(5)).unwrap();
        let job = client
            .submit("https://media.example/a.m4a", Some("en"))
            .await
            .unwrap();

        assert_eq!(job, "job-42");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_submit_normalizes_region_tag() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/v2/transcript")
            .match_body(Matcher::Json(serde_json::json!({
                "audio_url": "https://media.example/a.m4a",
                "language_code": "en_us",
                "language_detection": false
            })))
            .with_status(200)
            .with_body(r#"{"id": "job-43", "status": "queued"}"#)
            .create_async()
            .await;

        let client = AssemblyAi::new("test_key", &server.url(), None, Duration::from_secs(5)).unwrap();
        client
            .submit("https://media.example/a.m4a", Some("en-US"))
            .await
            .unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_submit_without_language_enables_detection() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/v2/transcript")
            .match_body(Matcher::Json(serde_json::json!({
                "audio_url": "https://media.example/a.m4a",
                "language_detection": true
            })))
            .with_status(200)
            .with_body(r#"{"id": "job-44", "status": "queued"}"#)
            .create_async()
            .await;

        let client = AssemblyAi::new("test_key", &server.url(), None, Duration::from_secs(5)).unwrap();
        let job = client.submit("https://media.example/a.m4a", None).await.unwrap();

        assert_eq!(job, "job-44");
        mock.assert_async().await;
    }

    #[test]
    fn test_service_language_code() {
        assert_eq!(service_language_code("en-US"), "en_us");
        assert_eq!(service_language_code("en-GB"), "en_uk");
        assert_eq!(service_language_code("FR"), "fr");
    }

    #[tokio::test]
    async fn test_poll_reads_completed_job() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/v2/transcript/job-42")
            .with_status(200)
            .with_body(r#"{"id": "job-42", "status": "completed", "text": "hi there", "language_code": "en_us"}"#)
            .create_async()
            .await;

        let client = AssemblyAi::new("test_key", &server.url(), None, Duration::from_secs(5)).unwrap();
        let state = client.poll("job-42").await.unwrap();

        assert_eq!(state.status, JobStatus::Completed);
        assert_eq!(state.text.as_deref(), Some("hi there"));
        assert_eq!(state.language_code.as_deref(), Some("en_us"));
    }

    #[tokio::test]
    async fn test_http_errors_are_classified() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/v2/transcript/busy")
            .with_status(503)
            .with_body("Service Unavailable")
            .create_async()
            .await;
        server
            .mock("GET", "/v2/transcript/gone")
            .with_status(404)
            .with_body(r#"{"error": "Transcript not found"}"#)
            .create_async()
            .await;

        let client = AssemblyAi::new("test_key", &server.url(), None, Duration::from_secs(5)).unwrap();

        assert!(client.poll("busy").await.unwrap_err().is_retryable());
        assert!(matches!(
            client.poll("gone").await.unwrap_err(),
            ProviderError::Unavailable(_)
        ));
    }
}
