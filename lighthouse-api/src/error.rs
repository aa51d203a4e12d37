//! Error Types for the Lighthouse API
//!
//! This module defines error handling for the HTTP layer, including:
//! - ApiError struct for structured error responses
//! - ErrorCode enum for categorizing errors
//! - IntoResponse implementation for Axum HTTP responses
//!
//! Action invocations do not use this type for application errors; those
//! are reported through the dispatch envelope instead.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use lighthouse_core::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::ConfigError;
use crate::sources::IpcError;

// ============================================================================
// ERROR CODE ENUM
// ============================================================================

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Configuration value is invalid (400)
    InvalidConfig,

    // ========================================================================
    // Not Found Errors (404)
    // ========================================================================
    /// No action is registered under this name
    ActionNotFound,

    /// Path did not match any route or argument type
    RouteNotFound,

    // ========================================================================
    // Server Errors (500)
    // ========================================================================
    /// Internal server error
    InternalError,

    /// A topic cache could not be read
    CacheUnavailable,
}

impl ErrorCode {
    /// Get the HTTP status code for this error code.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ErrorCode::InvalidConfig => StatusCode::BAD_REQUEST,
            ErrorCode::ActionNotFound | ErrorCode::RouteNotFound => StatusCode::NOT_FOUND,
            ErrorCode::InternalError | ErrorCode::CacheUnavailable => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

// ============================================================================
// API ERROR STRUCT
// ============================================================================

/// Structured error response for API operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code categorizing the error
    pub code: ErrorCode,

    /// Human-readable error message
    pub message: String,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        self.code.status_code()
    }

    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidConfig, message)
    }

    pub fn action_not_found(name: impl fmt::Display) -> Self {
        Self::new(ErrorCode::ActionNotFound, format!("Action {} not found", name))
    }

    pub fn route_not_found(path: impl fmt::Display) -> Self {
        Self::new(ErrorCode::RouteNotFound, format!("No route matches {}", path))
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    pub fn cache_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::CacheUnavailable, message)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

// ============================================================================
// AXUM INTEGRATION
// ============================================================================

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(self);
        (status, body).into_response()
    }
}

// ============================================================================
// CONVERSIONS
// ============================================================================

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ActionNotFound { name } => ApiError::action_not_found(name),
            CoreError::LockPoisoned { topic } => {
                tracing::error!(topic = %topic, "Topic lock poisoned");
                ApiError::cache_unavailable(format!("Topic {} is unavailable", topic))
            }
            CoreError::DuplicateAction { .. } | CoreError::DuplicateRoute { .. } => {
                ApiError::invalid_config(err.to_string())
            }
            other => ApiError::internal_error(other.to_string()),
        }
    }
}

impl From<ConfigError> for ApiError {
    fn from(err: ConfigError) -> Self {
        ApiError::invalid_config(err.to_string())
    }
}

impl From<IpcError> for ApiError {
    fn from(err: IpcError) -> Self {
        match err {
            IpcError::InvalidQueueName { .. } => ApiError::invalid_config(err.to_string()),
            other => ApiError::internal_error(other.to_string()),
        }
    }
}

/// Result type alias for API operations.
pub type ApiResult<T> = Result<T, ApiError>;
