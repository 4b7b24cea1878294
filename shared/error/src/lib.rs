//! Shared error taxonomy and HTTP response envelope.
//!
//! `AppError` is the single error type threaded through every `Result` in the
//! workspace. `IntoResponse` is the only place that maps an error kind to a
//! status code and a rendered `Envelope` — callers never construct HTTP
//! responses directly.

use axum::{http::StatusCode, response::IntoResponse, response::Response, Json};
use serde::Serialize;
use std::fmt;

/// A single field-level validation failure.
#[derive(Debug, Clone, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self { field: field.into(), message: message.into() }
    }
}

/// The canonical response envelope: `{status, message, data?, details?}`.
///
/// This is the single sum-type the HTTP adapter renders through — success and
/// failure both serialize through the same shape, never a `result` key.
#[derive(Debug, Serialize)]
pub struct Envelope<T: Serialize> {
    pub status: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<FieldError>>,
}

impl<T: Serialize> Envelope<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self { status: true, message: message.into(), data: Some(data), details: None }
    }
}

impl Envelope<()> {
    pub fn ok_empty(message: impl Into<String>) -> Self {
        Self { status: true, message: message.into(), data: None, details: None }
    }
}

#[derive(Debug)]
pub enum AppError {
    /// Missing/malformed/bad-signature/wrong-tenant bearer or refresh token.
    /// Always coalesced to "Unauthorized" per §7 policy.
    MissingAuth,

    /// Wrong password, wrong identifier, or any other credential mismatch.
    /// Carries the (already coalesced) user-facing message.
    InvalidCredentials(String),

    /// Tenant inactive or user soft-deleted.
    TenantOrUserInactive,

    /// Syntactic validation failures (emails, usernames, etc). Reported in full.
    ValidationSyntactic(Vec<FieldError>),

    /// Missing required fields / enum mismatches.
    ValidationSemantic(String),

    /// Invitation code invalid, or redirect_uri not in the allow-list.
    RoleForbidden(String),

    /// Uniqueness conflicts (email/username/tenant name already exists, role mixing).
    Conflict(String),

    /// Entity not found (also used for the role-probe mitigation on login).
    NotFound(String),

    /// Refresh token expired (distinct from the coalesced access-token case).
    TokenExpired,

    /// Sliding-window attempt budget exceeded.
    RateLimited,

    /// Anything else; never leaks internals to the client.
    Internal(String),

    /// Persistence layer failure.
    Database(sqlx::Error),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::MissingAuth => write!(f, "Unauthorized"),
            AppError::InvalidCredentials(msg) => write!(f, "{msg}"),
            AppError::TenantOrUserInactive => write!(f, "Forbidden"),
            AppError::ValidationSyntactic(_) => write!(f, "Validation failed"),
            AppError::ValidationSemantic(msg) => write!(f, "{msg}"),
            AppError::RoleForbidden(msg) => write!(f, "{msg}"),
            AppError::Conflict(msg) => write!(f, "{msg}"),
            AppError::NotFound(msg) => write!(f, "{msg}"),
            AppError::TokenExpired => write!(f, "Token expired"),
            AppError::RateLimited => write!(f, "Too Many Requests"),
            AppError::Internal(msg) => write!(f, "Internal error: {msg}"),
            AppError::Database(e) => write!(f, "Database error: {e}"),
        }
    }
}

impl std::error::Error for AppError {}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Database(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message, details) = match self {
            AppError::MissingAuth => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string(), None),
            AppError::InvalidCredentials(msg) => (StatusCode::UNAUTHORIZED, msg, None),
            AppError::TenantOrUserInactive => {
                (StatusCode::FORBIDDEN, "Forbidden".to_string(), None)
            },
            AppError::ValidationSyntactic(details) => {
                let message = details
                    .first()
                    .map(|d| d.message.clone())
                    .unwrap_or_else(|| "Validation failed".to_string());
                (StatusCode::UNPROCESSABLE_ENTITY, message, Some(details))
            },
            AppError::ValidationSemantic(msg) => (StatusCode::BAD_REQUEST, msg, None),
            AppError::RoleForbidden(msg) => (StatusCode::FORBIDDEN, msg, None),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg, None),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg, None),
            AppError::TokenExpired => {
                (StatusCode::UNAUTHORIZED, "Token expired".to_string(), None)
            },
            AppError::RateLimited => {
                (StatusCode::TOO_MANY_REQUESTS, "Too Many Requests".to_string(), None)
            },
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string(), None)
            },
            AppError::Database(e) => {
                tracing::error!(error = %e, "database error");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string(), None)
            },
        };

        let body = Envelope::<()> { status: false, message, data: None, details };
        (status, Json(body)).into_response()
    }
}
