// crates/auth-lib/src/error.rs

//! Central error type + Axum integration.
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::storage::StoreError;
use crate::validation::ValidationError;

/// Application error types with error codes and context
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid input")]
    InvalidInput,

    #[error("Username too short")]
    UsernameTooShort,

    #[error("Weak password")]
    WeakPassword,

    #[error("Username already exists")]
    DuplicateUsername,

    /// Covers both unknown usernames and wrong passwords; the two are
    /// distinguished only in internal logs, never in the response.
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Account temporarily locked")]
    AccountLocked,

    #[error("Not logged in")]
    NotLoggedIn,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Invalid or expired session")]
    InvalidSession,

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidInput
            | AppError::UsernameTooShort
            | AppError::WeakPassword
            | AppError::DuplicateUsername
            | AppError::NotLoggedIn => StatusCode::BAD_REQUEST,
            AppError::InvalidCredentials
            | AppError::Unauthorized
            | AppError::InvalidSession => StatusCode::UNAUTHORIZED,
            AppError::AccountLocked => StatusCode::FORBIDDEN,
            AppError::Store(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::InvalidInput => "VAL_001",
            AppError::UsernameTooShort => "VAL_002",
            AppError::WeakPassword => "VAL_003",
            AppError::DuplicateUsername => "REG_001",
            AppError::InvalidCredentials => "AUTH_001",
            AppError::AccountLocked => "AUTH_002",
            AppError::NotLoggedIn => "SESSION_001",
            AppError::Unauthorized => "SESSION_002",
            AppError::InvalidSession => "SESSION_003",
            AppError::Store(_) => "STORE_001",
            AppError::Internal(_) => "INT_001",
        }
    }

    /// Get a sanitized message suitable for production use
    pub fn sanitized_message(&self) -> String {
        match self {
            AppError::Store(_) | AppError::Internal(_) => {
                "An internal server error occurred".to_string()
            },
            other => other.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_code = self.error_code();

        // Use detailed messages in development, sanitized in production
        let message = if cfg!(debug_assertions) {
            self.to_string()
        } else {
            self.sanitized_message()
        };

        let body = serde_json::json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        });

        (status, axum::Json(body)).into_response()
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::MissingCredentials => AppError::InvalidInput,
            ValidationError::UsernameTooShort => AppError::UsernameTooShort,
        }
    }
}
