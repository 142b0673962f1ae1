use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use cloudcost_chat::ChatError;
use cloudcost_persist::PersistError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Thread not found: {0}")]
    ThreadNotFound(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("{0}")]
    PayloadTooLarge(String),

    #[error("Persistence error: {0}")]
    Persist(PersistError),

    #[error("AI service error: {0}")]
    Llm(String),

    #[error("Internal server error")]
    Internal,
}

impl From<PersistError> for ApiError {
    fn from(err: PersistError) -> Self {
        match err {
            PersistError::ThreadNotFound(id) => ApiError::ThreadNotFound(id),
            PersistError::FileNotFound(id) => ApiError::FileNotFound(id),
            PersistError::InvalidInput(msg) => ApiError::BadRequest(msg),
            e @ PersistError::FileTooLarge { .. } => ApiError::PayloadTooLarge(e.to_string()),
            other => ApiError::Persist(other),
        }
    }
}

impl From<ChatError> for ApiError {
    fn from(err: ChatError) -> Self {
        match err {
            ChatError::ThreadNotFound(id) => ApiError::ThreadNotFound(id),
            ChatError::Storage(e) => e.into(),
            e @ (ChatError::Llm(_) | ChatError::Timeout(_)) => ApiError::Llm(e.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::ThreadNotFound(_) | ApiError::FileNotFound(_) => {
                (StatusCode::NOT_FOUND, self.to_string())
            }
            ApiError::BadRequest(_) => {
                (StatusCode::BAD_REQUEST, self.to_string())
            }
            ApiError::PayloadTooLarge(_) => {
                (StatusCode::PAYLOAD_TOO_LARGE, self.to_string())
            }
            ApiError::Persist(ref e) => {
                tracing::error!("Persistence error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Storage error".to_string())
            }
            ApiError::Llm(ref e) => {
                tracing::error!("LLM error: {}", e);
                (StatusCode::BAD_GATEWAY, "AI service error".to_string())
            }
            ApiError::Internal => {
                tracing::error!("Internal error: {}", self);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
