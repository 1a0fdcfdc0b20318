//! API error types and handling.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use formulary::FormularyError;
use serde::Serialize;

/// API error type.
#[derive(Debug)]
pub enum ApiError {
    /// Bad request from client.
    BadRequest(String),
    /// Internal server error.
    Internal(String),
    /// Error from the formulary library.
    Formulary(FormularyError),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
}

/// Status and error code for a library error.
fn classify(err: &FormularyError) -> (StatusCode, &'static str) {
    match err {
        FormularyError::UnknownColumn { .. } => (StatusCode::BAD_REQUEST, "unknown_column"),
        FormularyError::Syntax { .. } => (StatusCode::BAD_REQUEST, "syntax_error"),
        FormularyError::TypeMismatch { .. } => (StatusCode::BAD_REQUEST, "type_error"),
        FormularyError::Range { .. } => (StatusCode::BAD_REQUEST, "range_error"),
        FormularyError::InvalidName { .. } => (StatusCode::BAD_REQUEST, "invalid_name"),
        FormularyError::Schema { .. } => (StatusCode::BAD_REQUEST, "schema_error"),
        FormularyError::DuplicateName { .. } => (StatusCode::CONFLICT, "duplicate_name"),
        FormularyError::DuplicateRule { .. } => (StatusCode::CONFLICT, "duplicate_rule"),
        FormularyError::SuggestionIndex { .. } => (StatusCode::NOT_FOUND, "not_found"),
        FormularyError::NoTableLoaded => (StatusCode::NOT_FOUND, "no_table"),
        FormularyError::Provider(_) => (StatusCode::BAD_REQUEST, "provider_error"),
        _ => (StatusCode::BAD_REQUEST, "formulary_error"),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "internal", msg),
            ApiError::Formulary(e) => {
                let (status, error) = classify(&e);
                (status, error, e.to_string())
            }
        };

        (
            status,
            Json(ErrorResponse {
                error: error.to_string(),
                message,
            }),
        )
            .into_response()
    }
}

impl From<FormularyError> for ApiError {
    fn from(err: FormularyError) -> Self {
        ApiError::Formulary(err)
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::Internal(msg) => write!(f, "Internal error: {}", msg),
            ApiError::Formulary(e) => write!(f, "Formulary error: {}", e),
        }
    }
}

impl std::error::Error for ApiError {}
