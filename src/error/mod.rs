//! # Error Handling
//!
//! One error enum for the whole HTTP layer. Handlers return
//! `Result<T, AppError>` and axum turns the error side into a JSON body
//! through [`IntoResponse`].
//!
//! Representation builders never fail; every variant here comes from
//! request parsing, guards or the collaborator services.
//!
//! ```json
//! {
//!   "error": "Unprocessable Entity",
//!   "message": "Validation error: name: too short",
//!   "status_code": 422,
//!   "details": { "name": ["too short"] }
//! }
//! ```

use std::collections::BTreeMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, warn};

pub type Result<T, E = AppError> = std::result::Result<T, E>;

// =====================================
// AppError
// =====================================
#[derive(Debug, Error)]
pub enum AppError {
    /// Malformed JSON, multipart, path or query - 400
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Missing, expired or revoked token - 401
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Signed in, but not staff or admin - 403
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Unknown resource, or a draft the viewer may not see
    #[error("Not found: {0}")]
    NotFound(String),

    /// Duplicates, and deletions blocked by enrolled students
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Business rules such as publishing an empty lesson - 422
    #[error("Validation error: {0}")]
    Validation(String),

    /// `validator` rejections - 422, field messages go to `details`
    #[error("Validation error: {0}")]
    InvalidFields(#[from] validator::ValidationErrors),

    /// OAuth provider or other remote collaborator failed - 502
    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Token error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("URL error: {0}")]
    UrlParse(#[from] url::ParseError),
}

impl AppError {
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Validation(_) | Self::InvalidFields(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
            Self::Internal(_) | Self::Config(_) | Self::Jwt(_) | Self::UrlParse(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    #[must_use]
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }

    /// `{ field: [message, ...] }` for `InvalidFields`, sorted by field.
    #[must_use]
    pub fn details(&self) -> Option<serde_json::Value> {
        let Self::InvalidFields(errors) = self else {
            return None;
        };

        let fields: BTreeMap<String, Vec<String>> = errors
            .field_errors()
            .into_iter()
            .map(|(field, errs)| {
                let messages = errs
                    .iter()
                    .map(|e| {
                        e.message
                            .as_ref()
                            .map_or_else(|| e.code.to_string(), ToString::to_string)
                    })
                    .collect();
                (field.to_string(), messages)
            })
            .collect();

        serde_json::to_value(fields).ok()
    }

    /// Guard rejection when no valid access token came with the request
    #[must_use]
    pub fn unauthorized() -> Self {
        Self::Unauthorized("Authentication required".to_string())
    }

    /// Guard rejection for a role the caller does not hold
    #[must_use]
    pub fn forbidden() -> Self {
        Self::Forbidden("Insufficient permissions".to_string())
    }
}

// =====================================
// JSON body
// =====================================
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Reason phrase, e.g. "Not Found"
    pub error: String,

    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl From<&AppError> for ErrorResponse {
    fn from(err: &AppError) -> Self {
        let status = err.status_code();

        // 5xx causes stay in the log
        let message = if status.is_server_error() && !matches!(err, AppError::Upstream(_)) {
            "Something went wrong".to_string()
        } else {
            err.to_string()
        };

        Self {
            error: status.canonical_reason().unwrap_or("Error").to_string(),
            message,
            status_code: Some(status.as_u16()),
            details: err.details(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::Upstream(_) => warn!(error = %self, "Upstream failure"),
            e if e.is_server_error() => error!(error = %self, "Server error occurred"),
            _ => {}
        }

        (self.status_code(), Json(ErrorResponse::from(&self))).into_response()
    }
}

// =====================================
// Extensions
// =====================================
pub trait ResultExt<T, E> {
    /// Any error becomes `AppError::Internal`
    fn map_internal(self) -> Result<T>;

    fn map_app_err<F>(self, f: F) -> Result<T>
    where
        F: FnOnce(E) -> AppError;
}

impl<T, E: std::fmt::Display> ResultExt<T, E> for std::result::Result<T, E> {
    fn map_internal(self) -> Result<T> {
        self.map_err(|e| AppError::Internal(e.to_string()))
    }

    fn map_app_err<F>(self, f: F) -> Result<T>
    where
        F: FnOnce(E) -> AppError,
    {
        self.map_err(f)
    }
}

pub trait OptionExt<T> {
    /// `None` becomes `AppError::NotFound`
    fn ok_or_not_found(self, message: impl Into<String>) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_not_found(self, message: impl Into<String>) -> Result<T> {
        self.ok_or_else(|| AppError::NotFound(message.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use validator::Validate;

    #[derive(Validate)]
    struct Named {
        #[validate(length(min = 2, message = "too short"))]
        name: String,
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(AppError::Conflict("Lesson has students".into()).status_code(), StatusCode::CONFLICT);
        assert_eq!(AppError::Upstream("github".into()).status_code(), StatusCode::BAD_GATEWAY);
        assert_eq!(AppError::Config("port".into()).status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_internal_message_is_hidden() {
        let body = ErrorResponse::from(&AppError::Internal("db pool exhausted".into()));

        assert_eq!(body.error, "Internal Server Error");
        assert_eq!(body.message, "Something went wrong");
        assert_eq!(body.status_code, Some(500));
    }

    #[test]
    fn test_upstream_message_is_kept() {
        let body = ErrorResponse::from(&AppError::Upstream("github is unavailable".into()));
        assert_eq!(body.message, "Upstream error: github is unavailable");
    }

    #[test]
    fn test_field_errors_become_details() {
        let err: AppError = Named { name: "x".to_string() }
            .validate()
            .unwrap_err()
            .into();

        assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            ErrorResponse::from(&err).details,
            Some(serde_json::json!({ "name": ["too short"] }))
        );
    }

    #[test]
    fn test_extensions() {
        let missing: Option<i32> = None;
        assert!(matches!(missing.ok_or_not_found("Series not found"), Err(AppError::NotFound(_))));

        let err: std::result::Result<i32, &str> = Err("bad hash");
        assert!(matches!(err.map_internal(), Err(AppError::Internal(_))));
    }
}
