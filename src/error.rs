// src/error.rs

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::collections::BTreeMap;
use std::fmt;

/// Field name -> list of messages, mirroring the serializer-style error bodies
/// the frontend already understands (`{"concept": ["This field is required."]}`).
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Global Application Error Enum.
/// Centralizes error handling and mapping to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    // 500 Internal Server Error
    InternalServerError(String),

    // 400 Bad Request with a plain detail message
    BadRequest(String),

    // 400 Bad Request with per-field messages
    Validation(FieldErrors),

    // 401 Unauthorized
    AuthError(String),

    // 404 Not Found
    NotFound(String),

    // 409 Conflict (e.g., duplicate username)
    Conflict(String),
}

impl AppError {
    /// Single-field validation error shorthand.
    pub fn field(name: &str, message: &str) -> Self {
        let mut errors = FieldErrors::new();
        errors.insert(name.to_string(), vec![message.to_string()]);
        AppError::Validation(errors)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl std::error::Error for AppError {}

/// Implements `IntoResponse` for `AppError`.
/// Converts the error into a JSON response with appropriate HTTP status code.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Internal Server Error", "message": msg }),
                )
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, json!({ "detail": msg })),
            AppError::Validation(errors) => (StatusCode::BAD_REQUEST, json!(errors)),
            AppError::AuthError(msg) => (StatusCode::UNAUTHORIZED, json!({ "detail": msg })),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, json!({ "detail": msg })),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, json!({ "detail": msg })),
        };

        (status, Json(body)).into_response()
    }
}

/// Converts `sqlx::Error` into `AppError::InternalServerError`.
/// Allows using `?` operator on database queries.
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::InternalServerError(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

/// Records a "required" error unless the string field is present and
/// non-blank. Returns the trimmed value when valid.
pub fn require_text(errors: &mut FieldErrors, field: &str, value: Option<&str>) -> Option<String> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Some(v.to_string()),
        _ => {
            errors.insert(field.to_string(), vec!["This field is required.".to_string()]);
            None
        }
    }
}

/// Records an error unless the integer field is present and >= 1.
pub fn require_min_1(errors: &mut FieldErrors, field: &str, value: Option<i64>) -> Option<i64> {
    match value {
        Some(v) if v >= 1 => Some(v),
        Some(_) => {
            errors.insert(
                field.to_string(),
                vec!["Ensure this value is greater than or equal to 1.".to_string()],
            );
            None
        }
        None => {
            errors.insert(field.to_string(), vec!["This field is required.".to_string()]);
            None
        }
    }
}

/// True if the underlying database error is a unique-constraint violation.
/// Used by the session-code retry loop and duplicate-username detection.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(|db| matches!(db.kind(), sqlx::error::ErrorKind::UniqueViolation))
}
