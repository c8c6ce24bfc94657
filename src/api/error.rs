use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::fmt;

use super::ApiResponse;
use crate::services::{AccountError, ElectionError, MailError, VotingError};

#[derive(Debug)]
pub enum ApiError {
    NotFound(String),

    DatabaseError(String),

    ExternalApiError { service: String, message: String },

    ValidationError(String),

    TooManyRequests(String),

    Conflict(String),

    InternalError(String),

    Unauthorized(String),

    Forbidden(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(msg) => write!(f, "Not found: {msg}"),
            Self::DatabaseError(msg) => write!(f, "Database error: {msg}"),
            Self::ExternalApiError { service, message } => {
                write!(f, "{service} error: {message}")
            }
            Self::ValidationError(msg) => write!(f, "Validation error: {msg}"),
            Self::TooManyRequests(msg) => write!(f, "Too many requests: {msg}"),
            Self::Conflict(msg) => write!(f, "Conflict: {msg}"),
            Self::InternalError(msg) => write!(f, "Internal error: {msg}"),
            Self::Unauthorized(msg) => write!(f, "Unauthorized: {msg}"),
            Self::Forbidden(msg) => write!(f, "Forbidden: {msg}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            Self::DatabaseError(msg) => {
                tracing::error!("Database error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "A database error occurred".to_string(),
                )
            }
            Self::ExternalApiError { service, message } => {
                tracing::warn!("{} error: {}", service, message);
                (StatusCode::BAD_GATEWAY, message.clone())
            }
            Self::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            Self::TooManyRequests(msg) => (StatusCode::TOO_MANY_REQUESTS, msg.clone()),
            Self::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            Self::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred".to_string(),
                )
            }
            Self::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            Self::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
        };

        let body = ApiResponse::<()>::error(error_message);
        (status, Json(body)).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self::InternalError(err.to_string())
    }
}

impl From<MailError> for ApiError {
    fn from(err: MailError) -> Self {
        Self::ExternalApiError {
            service: "Email".to_string(),
            message: format!("Error sending email: {err}"),
        }
    }
}

impl From<AccountError> for ApiError {
    fn from(err: AccountError) -> Self {
        match err {
            AccountError::Validation(_)
            | AccountError::WeakPassword(_)
            | AccountError::SessionExpired(_)
            | AccountError::InvalidOtp(_)
            | AccountError::OtpExpired => Self::ValidationError(err.to_string()),
            AccountError::ResendTooSoon(_) => Self::TooManyRequests(err.to_string()),
            AccountError::InvalidCredentials | AccountError::Inactive => {
                Self::Unauthorized(err.to_string())
            }
            AccountError::WrongPortal(msg) => Self::Forbidden(msg),
            AccountError::UserNotFound => Self::NotFound(err.to_string()),
            AccountError::Mail(mail) => mail.into(),
            AccountError::Internal(msg) => Self::InternalError(msg),
        }
    }
}

impl From<ElectionError> for ApiError {
    fn from(err: ElectionError) -> Self {
        match err {
            ElectionError::NotFound(_)
            | ElectionError::CandidateNotFound(_)
            | ElectionError::StudentNotFound(_) => Self::NotFound(err.to_string()),
            ElectionError::AdminProtected => Self::Forbidden(err.to_string()),
            ElectionError::Validation(msg) => Self::ValidationError(msg),
            ElectionError::Image(_) => Self::ValidationError(err.to_string()),
            ElectionError::Internal(msg) => Self::InternalError(msg),
        }
    }
}

impl From<VotingError> for ApiError {
    fn from(err: VotingError) -> Self {
        match err {
            VotingError::ElectionNotFound(_) | VotingError::VoteNotFound => {
                Self::NotFound(err.to_string())
            }
            VotingError::AlreadyVoted => Self::Conflict(err.to_string()),
            VotingError::NotActive
            | VotingError::MissingData
            | VotingError::InvalidCandidate
            | VotingError::Image(_) => Self::ValidationError(err.to_string()),
            VotingError::Internal(msg) => Self::InternalError(msg),
        }
    }
}

impl ApiError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationError(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::InternalError(msg.into())
    }

    pub fn session(err: &tower_sessions::session::Error) -> Self {
        Self::InternalError(format!("Session error: {err}"))
    }
}
