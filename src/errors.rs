use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum AppError {
    #[error("Invalid video identifier: {0}")]
    InvalidIdentifier(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error(transparent)]
    TranscriptUnavailable(#[from] TranscriptUnavailable),

    #[error("Too many requests. Slow down and try again.")]
    RateLimited,

    #[error("Quiz generation failed: {0}")]
    GenerationFailed(String),

    #[error("Internal server error: {0}")]
    InternalError(String),
}

/// Why no usable transcript could be acquired.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranscriptUnavailable {
    #[error("Transcript unavailable: {0}")]
    NotFound(String),

    #[error("Transcript too short: {chars} characters, at least {min} required")]
    TooShort { chars: usize, min: usize },
}

impl AppError {
    fn error_code(&self) -> &'static str {
        match self {
            AppError::InvalidIdentifier(_) => "INVALID_IDENTIFIER",
            AppError::ValidationError(_) => "VALIDATION_ERROR",
            AppError::TranscriptUnavailable(TranscriptUnavailable::NotFound(_)) => {
                "TRANSCRIPT_NOT_FOUND"
            }
            AppError::TranscriptUnavailable(TranscriptUnavailable::TooShort { .. }) => {
                "TRANSCRIPT_TOO_SHORT"
            }
            AppError::RateLimited => "RATE_LIMITED",
            AppError::GenerationFailed(_) => "GENERATION_FAILED",
            AppError::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    // Internal details are logged, never returned to the caller.
    fn public_message(&self) -> String {
        match self {
            AppError::InternalError(_) => "Internal server error".to_string(),
            AppError::GenerationFailed(_) => "Quiz generation failed".to_string(),
            AppError::TranscriptUnavailable(TranscriptUnavailable::NotFound(_)) => {
                "No transcript could be obtained for this video".to_string()
            }
            other => other.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
    pub kind: &'static str,
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidIdentifier(_) => StatusCode::BAD_REQUEST,
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::TranscriptUnavailable(TranscriptUnavailable::NotFound(_)) => {
                StatusCode::NOT_FOUND
            }
            AppError::TranscriptUnavailable(TranscriptUnavailable::TooShort { .. }) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            AppError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            AppError::GenerationFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if self.status_code().is_server_error() {
            log::error!("{}", self);
        }
        HttpResponse::build(self.status_code()).json(ErrorResponse {
            error: self.public_message(),
            code: self.status_code().as_u16(),
            kind: self.error_code(),
        })
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::ValidationError(err.to_string())
    }
}

pub type AppResult<T> = Result<T, AppError>;
