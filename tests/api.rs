use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tower::ServiceExt;

use youtube_transcript_lib::api::{build_router, state::AppState};
use youtube_transcript_lib::config::ResponsePolicy;
use youtube_transcript_lib::transcript::models::TranscriptPayload;
use youtube_transcript_lib::transcript::{
    LanguagePreference, ProviderError, RetryPolicy, TranscriptOrchestrator, TranscriptProvider, VideoRef,
};

struct Disabled;

#[async_trait]
impl TranscriptProvider for Disabled {
    fn name(&self) -> &str {
        "youtube-captions"
    }

    async fn fetch(&self, _video: &VideoRef, _prefs: &LanguagePreference) -> Result<TranscriptPayload, ProviderError> {
        Err(ProviderError::Disabled("owner turned captions off".into()))
    }
}

/// Succeeds only for one video, echoing the first requested language
struct OnlyFor(&'static str);

#[async_trait]
impl TranscriptProvider for OnlyFor {
    fn name(&self) -> &str {
        "yt-dlp-subtitles"
    }

    async fn fetch(&self, video: &VideoRef, prefs: &LanguagePreference) -> Result<TranscriptPayload, ProviderError> {
        if video.canonical_id() != self.0 {
            return Err(ProviderError::NotFound("no files".into()));
        }
        Ok(TranscriptPayload {
            text: "never gonna give you up".to_string(),
            language_code: prefs.primary().to_string(),
            is_auto_generated: true,
        })
    }
}

fn app(policy: ResponsePolicy, expose_attempts: bool) -> Router {
    let (_, shutdown) = watch::channel(false);
    app_with_shutdown(policy, expose_attempts, shutdown)
}

fn app_with_shutdown(policy: ResponsePolicy, expose_attempts: bool, shutdown: watch::Receiver<bool>) -> Router {
    let mut orchestrator = TranscriptOrchestrator::new(RetryPolicy::new(2, Duration::from_millis(1)))
        .with_default_languages(vec!["en".to_string()]);
    orchestrator.add_provider(Box::new(Disabled));
    orchestrator.add_provider(Box::new(OnlyFor("dQw4w9WgXcQ")));

    build_router(AppState {
        orchestrator: Arc::new(orchestrator),
        policy,
        expose_attempts,
        shutdown,
    })
}

async fn post_transcript(app: Router, body: Value) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/transcript")
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_health() {
    let response = app(ResponsePolicy::Permissive, false)
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body, json!({"status": "ok"}));
}

#[tokio::test]
async fn test_transcript_falls_back_to_second_provider() {
    let (status, body) = post_transcript(
        app(ResponsePolicy::Permissive, false),
        json!({"video_id": "https://youtu.be/dQw4w9WgXcQ?t=42", "preferred_languages": ["de", "en"]}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["text"], "never gonna give you up");
    assert_eq!(body["language"], "de");
    assert_eq!(body["is_auto_generated"], true);
    assert_eq!(body["source"], "yt-dlp-subtitles");
    assert!(body.get("attempts").is_none());
}

#[tokio::test]
async fn test_video_url_alias_and_default_languages() {
    let (_, body) = post_transcript(
        app(ResponsePolicy::Permissive, false),
        json!({"video_url": "https://www.youtube.com/watch?v=dQw4w9WgXcQ"}),
    )
    .await;

    assert_eq!(body["success"], true);
    assert_eq!(body["language"], "en");
}

#[tokio::test]
async fn test_permissive_failure_is_200() {
    let (status, body) = post_transcript(
        app(ResponsePolicy::Permissive, true),
        json!({"video_id": "aaaaaaaaaaa"}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert_eq!(body["error_type"], "AllMethodsFailed");
    assert_eq!(body["attempts"].as_array().unwrap().len(), 2);
    assert_eq!(body["attempts"][0]["last_error_kind"], "Disabled");
    assert_eq!(body["attempts"][1]["last_error_kind"], "NotFound");
}

#[tokio::test]
async fn test_strict_policy_status_codes() {
    let (status, body) = post_transcript(
        app(ResponsePolicy::Strict, false),
        json!({"video_id": "definitely not an id"}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_type"], "InvalidIdentifier");

    let (status, _) = post_transcript(app(ResponsePolicy::Strict, false), json!({"video_id": "aaaaaaaaaaa"})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_shutdown_cancels_requests() {
    let (tx, shutdown) = watch::channel(false);
    tx.send(true).unwrap();

    let (status, body) = post_transcript(
        app_with_shutdown(ResponsePolicy::Strict, false, shutdown),
        json!({"video_id": "dQw4w9WgXcQ"}),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error_type"], "Cancelled");
}
