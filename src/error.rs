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
    #[error("Calendar is not connected for this user")]
    NotAuthenticated,

    #[error("Invalid or expired OAuth state")]
    InvalidState,

    #[error("Token exchange failed: {0}")]
    TokenExchange(String),

    #[error("Calendar API error: {0}")]
    CalendarApi(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unknown function: {0}")]
    UnknownFunction(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("LLM provider error: {0}")]
    Llm(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Google's token endpoint answers with this when a refresh token or
    /// authorization code is no longer valid.
    pub const INVALID_GRANT: &'static str = "invalid_grant";

    /// Stable machine-readable code for this error.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::NotAuthenticated => "not_authenticated",
            AppError::InvalidState => "invalid_state",
            AppError::TokenExchange(_) => "token_exchange_failed",
            AppError::CalendarApi(_) => "calendar_error",
            AppError::NotFound(_) => "not_found",
            AppError::Validation(_) => "validation_error",
            AppError::UnknownFunction(_) => "unknown_function",
            AppError::BadRequest(_) => "bad_request",
            AppError::Llm(_) => "llm_error",
            AppError::Internal(_) => "internal_error",
        }
    }

    /// Whether a token endpoint failure means the grant itself is dead.
    pub fn is_invalid_grant(&self) -> bool {
        matches!(self, AppError::TokenExchange(msg) if msg.contains(Self::INVALID_GRANT))
    }

    /// Plain-language explanation suitable for a chat reply.
    pub fn user_message(&self) -> String {
        match self {
            AppError::NotAuthenticated => {
                "I can't reach your calendar yet. Please connect your Google Calendar first."
                    .to_string()
            }
            AppError::NotFound(_) => "I couldn't find that event in your calendar.".to_string(),
            AppError::Validation(msg) => format!("Some of the event details look wrong: {}", msg),
            AppError::UnknownFunction(name) => {
                format!("I don't know how to perform the operation '{}'.", name)
            }
            AppError::CalendarApi(_) => {
                "Google Calendar returned an error, so I couldn't complete that.".to_string()
            }
            _ => "Sorry, something went wrong while handling your request.".to_string(),
        }
    }
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, details) = match &self {
            AppError::NotAuthenticated => (StatusCode::UNAUTHORIZED, None),
            AppError::InvalidState => (StatusCode::BAD_REQUEST, None),
            AppError::TokenExchange(msg) => (StatusCode::BAD_REQUEST, Some(msg.clone())),
            AppError::CalendarApi(msg) => (StatusCode::BAD_GATEWAY, Some(msg.clone())),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, Some(msg.clone())),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, Some(msg.clone())),
            AppError::UnknownFunction(name) => (StatusCode::BAD_REQUEST, Some(name.clone())),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, Some(msg.clone())),
            AppError::Llm(msg) => {
                tracing::error!(error = %msg, "LLM provider error");
                (StatusCode::BAD_GATEWAY, None)
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, None)
            }
        };

        let body = ErrorResponse {
            error: self.kind().to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
