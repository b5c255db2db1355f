// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    #[error("Validation failed: {}", .0.join(", "))]
    Validation(Vec<String>),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Authentication required")]
    Unauthorized,

    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Known login provider that this deployment has not configured.
    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Duplicate key: {0}")]
    DuplicateKey(String),

    /// Failure with a client-facing message; `detail` is only set when the
    /// environment allows exposing it.
    #[error("{message}")]
    Failed {
        message: &'static str,
        detail: Option<String>,
    },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    success: bool,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message, error) = match self {
            AppError::MissingFields(fields) => (
                StatusCode::BAD_REQUEST,
                format!("All fields are required (missing: {})", fields.join(", ")),
                None,
            ),
            AppError::Validation(messages) => {
                (StatusCode::BAD_REQUEST, messages.join(", "), None)
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg, None),
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "Authentication required. Please login first.".to_string(),
                None,
            ),
            AppError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                msg,
                Some("Endpoint not found".to_string()),
            ),
            AppError::ProviderUnavailable(provider) => (
                StatusCode::NOT_FOUND,
                format!("Authentication provider {} is not configured", provider),
                Some("Provider not available".to_string()),
            ),
            AppError::DuplicateKey(_) => (
                StatusCode::CONFLICT,
                "An application with this email already exists".to_string(),
                None,
            ),
            AppError::Failed { message, detail } => {
                (StatusCode::INTERNAL_SERVER_ERROR, message.to_string(), detail)
            }
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "Database error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                    None,
                )
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                    None,
                )
            }
        };

        let body = ErrorResponse {
            success: false,
            message,
            error,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
