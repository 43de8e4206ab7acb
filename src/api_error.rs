use actix_web::{HttpResponse, ResponseError};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Internal server error")]
    InternalServerError,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid goal configuration: {0}")]
    InvalidGoalConfig(String),

    #[error("At least 4 players are required to generate teams ({available} available)")]
    InsufficientPlayers { available: usize },

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Email already in use: {0}")]
    DuplicateEmail(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Data store unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

/// Error families surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    NotFound,
    Conflict,
    Upstream,
    Internal,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::ValidationError(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::Conflict(message.into())
    }

    pub fn upstream(message: impl Into<String>) -> Self {
        ApiError::UpstreamUnavailable(message.into())
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            ApiError::ValidationError(_)
            | ApiError::InvalidGoalConfig(_)
            | ApiError::InsufficientPlayers { .. } => ErrorCategory::Validation,
            ApiError::NotFound(_) => ErrorCategory::NotFound,
            ApiError::DuplicateEmail(_) | ApiError::Conflict(_) => ErrorCategory::Conflict,
            ApiError::UpstreamUnavailable(_) | ApiError::DatabaseError(_) => {
                ErrorCategory::Upstream
            }
            ApiError::Unauthorized | ApiError::InternalServerError => ErrorCategory::Internal,
        }
    }

    /// True when the store could not be reached at all.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, ApiError::UpstreamUnavailable(_))
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ApiError::ValidationError(errors.to_string())
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    code: u16,
    details: Option<String>,
}

impl ResponseError for ApiError {
    fn error_response(&self) -> HttpResponse {
        use actix_web::http::StatusCode;

        let (status, message) = match self {
            ApiError::InternalServerError => (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()),
            ApiError::ValidationError(_)
            | ApiError::InvalidGoalConfig(_)
            | ApiError::InsufficientPlayers { .. } => (StatusCode::BAD_REQUEST, self.to_string()),
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string()),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            ApiError::DuplicateEmail(_) | ApiError::Conflict(_) => {
                (StatusCode::CONFLICT, self.to_string())
            }
            ApiError::UpstreamUnavailable(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, "Data store unavailable".to_string())
            }
            ApiError::DatabaseError(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Database error".to_string())
            }
        };

        let error_response = ErrorResponse {
            error: message,
            code: status.as_u16(),
            details: Some(self.to_string()),
        };

        HttpResponse::build(status).json(error_response)
    }
}
