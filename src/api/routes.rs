use axum::{extract::State, response::Response, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use super::response::TranscriptResponse;
use super::state::AppState;

#[derive(Debug, Deserialize)]
pub struct TranscriptRequest {
    #[serde(alias = "video_url")]
    pub video_id: String,
    #[serde(default)]
    pub preferred_languages: Option<Vec<String>>,
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn transcript(State(state): State<AppState>, Json(body): Json<TranscriptRequest>) -> Response {
    info!(input = %body.video_id, languages = ?body.preferred_languages, "Transcript requested");

    let languages = body.preferred_languages.unwrap_or_default();
    let mut shutdown = state.shutdown.clone();
    let cancel = async move {
        let stopping = shutdown.wait_for(|stop| *stop).await.is_ok();
        // A dropped sender means nobody will ever ask us to stop
        if !stopping {
            std::future::pending::<()>().await;
        }
    };

    let result = state
        .orchestrator
        .fetch_until(&body.video_id, &languages, cancel)
        .await;

    TranscriptResponse::from_result(result, state.expose_attempts).into_response_with(state.policy)
}
