//! Error types for Warbler
//!
//! All errors in the application are converted to `AppError`,
//! which implements `IntoResponse` for proper HTTP error responses.

use axum::http::{StatusCode, header};
use axum::response::{Html, IntoResponse, Response};
use axum_extra::extract::cookie::CookieJar;
use thiserror::Error;

/// Application-wide error type
///
/// This enum represents all possible errors that can occur
/// in the application. It implements `IntoResponse` to
/// automatically convert errors to appropriate HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    /// Resource not found (404)
    #[error("Resource not found")]
    NotFound,

    /// Session missing or not resolvable to a user
    ///
    /// Rendered as the flash-then-redirect outcome: the browser is sent
    /// back to `/` with an "Access unauthorized." warning, never a bare
    /// 401 page.
    #[error("Access unauthorized")]
    Unauthorized,

    /// Validation error: rejected before anything touches the store (400)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Constraint violation surfaced when staged data is committed (409)
    ///
    /// Unique, not-null, foreign-key and check violations from the store
    /// are mapped here so callers can distinguish them from transport
    /// failures (e.g. to re-render a signup form).
    #[error("Integrity error: {0}")]
    Integrity(String),

    /// Database error (500)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Configuration error (500)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Token signing/verification error (500)
    #[error("Encryption error: {0}")]
    Encryption(String),

    /// Internal server error (500)
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

impl IntoResponse for AppError {
    /// Convert error to HTTP response
    ///
    /// Maps each error variant to the appropriate HTTP status code and a
    /// minimal HTML body. `Unauthorized` is special-cased into the
    /// flash-plus-redirect flow the rest of the app uses.
    fn into_response(self) -> Response {
        use crate::auth::session::{FLASH_UNAUTHORIZED, flash_cookie};
        use crate::metrics::ERRORS_TOTAL;

        if let AppError::Unauthorized = self {
            ERRORS_TOTAL
                .with_label_values(&["unauthorized", "unknown"])
                .inc();
            let jar = CookieJar::new().add(flash_cookie(FLASH_UNAUTHORIZED));
            return (StatusCode::FOUND, [(header::LOCATION, "/")], jar).into_response();
        }

        let (status, error_message, error_type) = match &self {
            AppError::NotFound => (StatusCode::NOT_FOUND, self.to_string(), "not_found"),
            AppError::Unauthorized => unreachable!("handled above"),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone(), "validation"),
            AppError::Integrity(_) => (
                StatusCode::CONFLICT,
                "Conflict with existing data".to_string(),
                "integrity",
            ),
            AppError::Database(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Database error".to_string(),
                "database",
            ),
            AppError::Config(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone(), "config"),
            AppError::Encryption(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, msg.clone(), "encryption")
            }
            AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
                "internal",
            ),
        };

        // Record error metric
        ERRORS_TOTAL
            .with_label_values(&[error_type, "unknown"])
            .inc();

        let body = Html(format!(
            "<!DOCTYPE html>\n<html><head><title>{status}</title></head>\
             <body><h1>{status}</h1><p>{message}</p></body></html>",
            status = status.as_u16(),
            message = html_escape::encode_text(&error_message),
        ));

        (status, body).into_response()
    }
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;
