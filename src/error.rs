//! Domain-specific error types for access-hub

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Main error type for the access-hub API
#[derive(Error, Debug)]
pub enum AccessHubError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Database error: {message}")]
    Database { message: String },

    #[error("Serialization error: {message}")]
    Serialization { message: String },

    #[error("{message}")]
    Unauthorized { message: String },

    #[error("{message}")]
    Forbidden { message: String },

    #[error("{message}")]
    Validation { message: String },

    #[error("{message}")]
    NotFound { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl AccessHubError {
    pub fn unauthorized(message: impl Into<String>) -> Self {
        AccessHubError::Unauthorized {
            message: message.into(),
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        AccessHubError::Forbidden {
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        AccessHubError::Validation {
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        AccessHubError::NotFound {
            message: message.into(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AccessHubError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            AccessHubError::Forbidden { .. } => StatusCode::FORBIDDEN,
            AccessHubError::Validation { .. } => StatusCode::BAD_REQUEST,
            AccessHubError::NotFound { .. } => StatusCode::NOT_FOUND,
            AccessHubError::Config { .. }
            | AccessHubError::Database { .. }
            | AccessHubError::Serialization { .. }
            | AccessHubError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<anyhow::Error> for AccessHubError {
    fn from(err: anyhow::Error) -> Self {
        AccessHubError::Internal {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for AccessHubError {
    fn from(err: serde_json::Error) -> Self {
        AccessHubError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<rusqlite::Error> for AccessHubError {
    fn from(err: rusqlite::Error) -> Self {
        AccessHubError::Database {
            message: err.to_string(),
        }
    }
}

impl From<tokio::task::JoinError> for AccessHubError {
    fn from(err: tokio::task::JoinError) -> Self {
        AccessHubError::Internal {
            message: format!("Blocking task failed: {}", err),
        }
    }
}

/// Render as the API failure envelope
impl IntoResponse for AccessHubError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("{}", self);
        }
        (
            status,
            Json(json!({
                "success": false,
                "error": self.to_string(),
            })),
        )
            .into_response()
    }
}

/// Result type alias for access-hub operations
pub type Result<T> = std::result::Result<T, AccessHubError>;
