// Wire shape of transcript responses and the status-code policy

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::config::ResponsePolicy;
use crate::transcript::{ErrorKind, ProviderAttempt, TranscriptResult};

#[derive(Debug, Serialize, PartialEq)]
pub struct TranscriptResponse {
    pub success: bool,
    pub text: Option<String>,
    pub language: Option<String>,
    pub is_auto_generated: Option<bool>,
    pub source: Option<String>,
    pub error: Option<String>,
    pub error_type: Option<ErrorKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attempts: Option<Vec<ProviderAttempt>>,
}

impl TranscriptResponse {
    pub fn from_result(result: TranscriptResult, expose_attempts: bool) -> Self {
        let (error, error_type, attempts) = match result.error {
            Some(info) => (
                Some(info.message),
                Some(info.kind),
                expose_attempts.then_some(info.attempts),
            ),
            None => (None, None, expose_attempts.then(Vec::new)),
        };

        Self {
            success: result.success,
            text: result.text,
            language: result.language_used,
            is_auto_generated: result.is_auto_generated,
            source: result.source_name,
            error,
            error_type,
            attempts,
        }
    }

    pub fn into_response_with(self, policy: ResponsePolicy) -> Response {
        let status = status_for(self.error_type, policy);
        (status, Json(self)).into_response()
    }
}

/// HTTP status for an outcome under `policy`
pub fn status_for(kind: Option<ErrorKind>, policy: ResponsePolicy) -> StatusCode {
    let kind = match (policy, kind) {
        (ResponsePolicy::Permissive, _) | (_, None) => return StatusCode::OK,
        (ResponsePolicy::Strict, Some(kind)) => kind,
    };

    match kind {
        ErrorKind::InvalidIdentifier => StatusCode::BAD_REQUEST,
        ErrorKind::Disabled | ErrorKind::NotFound | ErrorKind::Unavailable | ErrorKind::AllMethodsFailed => {
            StatusCode::NOT_FOUND
        }
        ErrorKind::Transient => StatusCode::SERVICE_UNAVAILABLE,
        ErrorKind::InternalError | ErrorKind::Cancelled => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
