use std::sync::Arc;
use tokio::sync::watch;

use crate::config::{ResponsePolicy, Settings};
use crate::transcript::TranscriptOrchestrator;

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<TranscriptOrchestrator>,
    pub policy: ResponsePolicy,
    /// Include the per-provider attempt log in responses
    pub expose_attempts: bool,
    /// Flips to `true` when the server starts shutting down
    pub shutdown: watch::Receiver<bool>,
}

impl AppState {
    pub fn new(orchestrator: TranscriptOrchestrator, settings: &Settings, shutdown: watch::Receiver<bool>) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
            policy: settings.transcript.response_policy,
            expose_attempts: settings.transcript.expose_attempts,
            shutdown,
        }
    }
}
