//! Error payloads of the HTTP boundary.

use arena_core::ArenaError;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    pub retryable: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Arena(#[from] ArenaError),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),
}

impl From<JsonRejection> for ApiError {
    fn from(r: JsonRejection) -> Self {
        ApiError::BadRequest(r.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(r: QueryRejection) -> Self {
        ApiError::BadRequest(r.body_text())
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Arena(e) => match e {
                ArenaError::NotEnoughCandidates { .. } => StatusCode::CONFLICT,
                ArenaError::UnknownUseCase(_) | ArenaError::RoundNotFound(_) => {
                    StatusCode::NOT_FOUND
                }
                ArenaError::InvalidRoundState { .. } | ArenaError::AlreadyVoted(_) => {
                    StatusCode::CONFLICT
                }
                // Failed sides come back degraded inside the round; this arm is
                // unused by the current handlers.
                ArenaError::Generation { .. } => StatusCode::BAD_GATEWAY,
                ArenaError::GenerationUnavailable => StatusCode::SERVICE_UNAVAILABLE,
                ArenaError::InvalidRatingState { .. } | ArenaError::Storage(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "E_BAD_REQUEST",
            ApiError::NotFound(_) => "E_NOT_FOUND",
            ApiError::Arena(e) => e.code(),
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, ApiError::Arena(e) if e.is_retryable())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(event = "request_failed", code = self.code(), error = %self);
        }
        let body = ErrorResponse {
            error: ErrorDetail {
                code: self.code().to_string(),
                // Storage internals stay in the log.
                message: if status == StatusCode::INTERNAL_SERVER_ERROR {
                    "internal error".to_string()
                } else {
                    self.to_string()
                },
                retryable: self.retryable(),
            },
        };
        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<Json<T>, ApiError>;
