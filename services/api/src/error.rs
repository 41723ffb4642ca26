//! services/api/src/error.rs
//!
//! Defines the primary error type for the entire API service and how each
//! variant is rendered as an HTTP response.

use crate::config::ConfigError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use qa_relay_core::ports::PortError;
use serde::Serialize;
use tracing::error;

/// The primary error type for the `api` service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error that propagated up from one of the core service ports.
    #[error("Service Port Error: {0}")]
    Port(#[from] PortError),

    /// Represents an error from the underlying database library.
    #[error("Database Error: {0}")]
    Database(#[from] sqlx::Error),

    /// Represents an error while running database migrations.
    #[error("Migration Error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Represents a standard Input/Output error (e.g., binding to a network socket).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Missing or malformed input.
    #[error("{0}")]
    BadRequest(String),

    /// Bad credentials or a missing/invalid session token.
    #[error("{0}")]
    Unauthorized(String),

    /// A verified identity without the required capability.
    #[error("{0}")]
    Forbidden(String),

    #[error("Method not allowed")]
    MethodNotAllowed,

    /// Some realtime publishes did not go through.
    #[error("Notification delivery failed: {0}")]
    Delivery(String),

    /// A catch-all for any other unexpected errors.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}

/// The JSON body of every error response.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::Port(PortError::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Port(PortError::Conflict(_)) => StatusCode::CONFLICT,
            ApiError::Port(PortError::Unauthorized) => StatusCode::UNAUTHORIZED,
            ApiError::Port(PortError::Unexpected(_))
            | ApiError::Config(_)
            | ApiError::Database(_)
            | ApiError::Migration(_)
            | ApiError::Io(_)
            | ApiError::Delivery(_)
            | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(&self) -> ErrorBody {
        match self {
            ApiError::Port(PortError::NotFound(msg)) | ApiError::Port(PortError::Conflict(msg)) => {
                ErrorBody {
                    error: msg.clone(),
                    details: None,
                }
            }
            ApiError::Port(PortError::Unauthorized) => ErrorBody {
                error: "Unauthorized".to_string(),
                details: None,
            },
            ApiError::Port(PortError::Unexpected(detail)) => ErrorBody {
                error: "Internal server error".to_string(),
                details: Some(detail.clone()),
            },
            ApiError::Delivery(detail) => ErrorBody {
                error: "Notification delivery failed".to_string(),
                details: Some(detail.clone()),
            },
            ApiError::Config(_)
            | ApiError::Database(_)
            | ApiError::Migration(_)
            | ApiError::Io(_)
            | ApiError::Internal(_) => ErrorBody {
                error: "Internal server error".to_string(),
                details: Some(self.to_string()),
            },
            _ => ErrorBody {
                error: self.to_string(),
                details: None,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        }
        (status, Json(self.body())).into_response()
    }
}
