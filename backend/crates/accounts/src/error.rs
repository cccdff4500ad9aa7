//! Accounts Error Types
//!
//! This module provides account-specific error variants that integrate
//! with the unified `kernel::error::AppError` system.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use thiserror::Error;

/// Accounts-specific result type alias
pub type AccountsResult<T> = Result<T, AccountsError>;

/// Accounts-specific error variants
#[derive(Debug, Error)]
pub enum AccountsError {
    /// Account not found
    #[error("Account not found")]
    AccountNotFound,

    /// Email already registered
    #[error("Email already registered")]
    EmailTaken,

    /// User name already exists
    #[error("User name already exists")]
    UserNameTaken,

    /// Invalid credentials (unknown identifier or wrong password)
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Account has not completed email verification
    #[error("Account is not active")]
    AccountInactive,

    /// Email is already verified
    #[error("Email is already verified")]
    AlreadyVerified,

    /// Verification or reset token missing, consumed, or expired
    #[error("Invalid or expired token")]
    TokenNotFoundOrExpired,

    /// Access token missing, malformed, or expired
    #[error("Invalid or expired access token")]
    AccessTokenInvalid,

    /// Caller lacks the required role
    #[error("Administrator role required")]
    AdminRequired,

    /// Demoting the only remaining administrator
    #[error("Cannot remove the last administrator")]
    LastAdministrator,

    /// Unknown role name
    #[error("Unknown role: {0}")]
    UnknownRole(String),

    /// Password validation error
    #[error("Password validation failed: {0}")]
    PasswordValidation(String),

    /// Input validation error (email, user name, public id)
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AccountsError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AccountsError::AccountNotFound => StatusCode::NOT_FOUND,
            AccountsError::EmailTaken
            | AccountsError::UserNameTaken
            | AccountsError::AlreadyVerified
            | AccountsError::LastAdministrator => StatusCode::CONFLICT,
            AccountsError::InvalidCredentials | AccountsError::AccessTokenInvalid => {
                StatusCode::UNAUTHORIZED
            }
            AccountsError::AccountInactive | AccountsError::AdminRequired => StatusCode::FORBIDDEN,
            AccountsError::TokenNotFoundOrExpired => StatusCode::GONE,
            AccountsError::UnknownRole(_)
            | AccountsError::PasswordValidation(_)
            | AccountsError::Validation(_) => StatusCode::BAD_REQUEST,
            AccountsError::Database(_) | AccountsError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            AccountsError::AccountNotFound => ErrorKind::NotFound,
            AccountsError::EmailTaken
            | AccountsError::UserNameTaken
            | AccountsError::AlreadyVerified
            | AccountsError::LastAdministrator => ErrorKind::Conflict,
            AccountsError::InvalidCredentials | AccountsError::AccessTokenInvalid => {
                ErrorKind::Unauthorized
            }
            AccountsError::AccountInactive | AccountsError::AdminRequired => ErrorKind::Forbidden,
            AccountsError::TokenNotFoundOrExpired => ErrorKind::Gone,
            AccountsError::UnknownRole(_)
            | AccountsError::PasswordValidation(_)
            | AccountsError::Validation(_) => ErrorKind::BadRequest,
            AccountsError::Database(_) | AccountsError::Internal(_) => {
                ErrorKind::InternalServerError
            }
        }
    }

    /// Convert to AppError
    pub fn to_app_error(&self) -> AppError {
        AppError::new(self.kind(), self.to_string())
    }

    /// Log the error with appropriate level
    fn log(&self) {
        match self {
            AccountsError::Database(e) => {
                tracing::error!(error = %e, "Accounts database error");
            }
            AccountsError::Internal(msg) => {
                tracing::error!(message = %msg, "Accounts internal error");
            }
            AccountsError::InvalidCredentials => {
                tracing::warn!("Invalid login attempt");
            }
            AccountsError::AccessTokenInvalid => {
                tracing::warn!("Rejected access token");
            }
            AccountsError::TokenNotFoundOrExpired => {
                tracing::debug!("Token lookup failed: absent, consumed, or expired");
            }
            _ => {
                tracing::debug!(error = %self, "Accounts error");
            }
        }
    }
}

impl IntoResponse for AccountsError {
    fn into_response(self) -> Response {
        self.log();
        self.to_app_error().into_response()
    }
}

impl From<AppError> for AccountsError {
    fn from(err: AppError) -> Self {
        AccountsError::Internal(err.to_string())
    }
}

impl From<platform::credential::CredentialError> for AccountsError {
    fn from(err: platform::credential::CredentialError) -> Self {
        // Only reachable through a bad parameter configuration
        AccountsError::Internal(err.to_string())
    }
}
