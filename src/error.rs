use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::audio::AudioError;
use crate::inference::InferenceError;
use crate::storage::StorageError;

#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    Unauthorized(&'static str),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Text length exceeds the limit of {0} characters")]
    TextTooLong(usize),

    #[error("Target voice not supported. Choose from: {}", .choices.join(", "))]
    UnsupportedVoice { voice: String, choices: Vec<String> },

    #[error("{0}")]
    NotFound(&'static str),

    #[error("{0}")]
    ModelNotReady(&'static str),

    /// Execution failure. `message` goes to the caller, `source` only to the log.
    #[error("{message}: {source}")]
    Internal {
        message: &'static str,
        #[source]
        source: ExecutionError,
    },
}

/// Anything that can go wrong after validation, kept apart per layer
#[derive(thiserror::Error, Debug)]
pub enum ExecutionError {
    #[error("inference: {0}")]
    Inference(#[from] InferenceError),

    #[error("audio: {0}")]
    Audio(#[from] AudioError),

    #[error("storage: {0}")]
    Storage(#[from] StorageError),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("worker: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl AppError {
    pub fn internal(message: &'static str, source: impl Into<ExecutionError>) -> Self {
        AppError::Internal {
            message,
            source: source.into(),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Unauthorized(msg) => {
                (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.to_string())
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::TextTooLong(_) => {
                (StatusCode::BAD_REQUEST, "TEXT_TOO_LONG", self.to_string())
            }
            AppError::UnsupportedVoice { voice, .. } => {
                tracing::debug!("Unknown voice requested: {}", voice);
                (
                    StatusCode::BAD_REQUEST,
                    "UNSUPPORTED_VOICE",
                    self.to_string(),
                )
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.to_string()),
            AppError::ModelNotReady(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "MODEL_NOT_READY",
                msg.to_string(),
            ),
            AppError::Internal { message, source } => {
                tracing::error!("{}: {}", message, source);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    message.to_string(),
                )
            }
        };

        if status.is_client_error() {
            tracing::warn!("Request rejected: {} - {}", code, message);
        }

        (
            status,
            Json(ErrorResponse {
                error: message,
                code: code.to_string(),
            }),
        )
            .into_response()
    }
}
