//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server-side errors to
//! Sentry before responding to the client. All route handlers return
//! `Result<T, AppError>`. Every error carries a stable machine-readable
//! `kind` so the frontend can branch on it without parsing messages.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use pixelport_core::TransitionError;

use crate::db::RepositoryError;
use crate::services::assets::AssetStoreError;
use crate::services::auth::AuthError;

/// Application-level error type for the API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Malformed or inconsistent input; user-correctable.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Missing or invalid credentials.
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Authenticated but not allowed to perform the operation.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Unknown identifier.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Operation not valid for the current lifecycle state.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// The buyer already owns one of the requested games.
    #[error("Already owned: {0}")]
    AlreadyOwned(String),

    /// The author already reviewed this game.
    #[error("Duplicate review")]
    DuplicateReview,

    /// The listing is not publicly available.
    #[error("Not available: {0}")]
    NotAvailable(String),

    /// An external collaborator (asset store, SMTP) failed.
    #[error("Dependency error: {0}")]
    Dependency(String),

    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(RepositoryError),
}

impl AppError {
    /// The stable wire identifier for this error.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_error",
            Self::Auth(_) => "auth_error",
            Self::Forbidden(_) => "forbidden",
            Self::NotFound(_) => "not_found",
            Self::InvalidState(_) => "invalid_state",
            Self::AlreadyOwned(_) => "already_owned",
            Self::DuplicateReview => "duplicate_review",
            Self::NotAvailable(_) => "not_available",
            Self::Dependency(_) => "dependency_error",
            Self::Database(_) => "internal",
        }
    }

    /// The HTTP status this error maps to.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Auth(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) | Self::NotAvailable(_) => StatusCode::NOT_FOUND,
            Self::InvalidState(_) | Self::AlreadyOwned(_) | Self::DuplicateReview => {
                StatusCode::CONFLICT
            }
            Self::Dependency(_) => StatusCode::BAD_GATEWAY,
            Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => Self::NotFound("resource not found".to_owned()),
            other => Self::Database(other),
        }
    }
}

impl From<TransitionError> for AppError {
    fn from(err: TransitionError) -> Self {
        Self::InvalidState(err.to_string())
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials | AuthError::TokenInvalid => {
                Self::Auth("invalid credentials".to_owned())
            }
            AuthError::AccountUnverified => {
                Self::Forbidden("account not verified; check your email".to_owned())
            }
            AuthError::UserAlreadyExists => {
                Self::Validation("an account with this email already exists".to_owned())
            }
            AuthError::WeakPassword(msg) => Self::Validation(msg),
            AuthError::InvalidEmail(e) => Self::Validation(e.to_string()),
            AuthError::PasswordHash => Self::Database(RepositoryError::DataCorruption(
                "password hashing failed".to_owned(),
            )),
            AuthError::Repository(e) => e.into(),
        }
    }
}

impl From<AssetStoreError> for AppError {
    fn from(err: AssetStoreError) -> Self {
        Self::Dependency(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if matches!(self, Self::Database(_) | Self::Dependency(_)) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = self.status();

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Database(_) => "Internal server error".to_owned(),
            Self::Dependency(_) => "External service error".to_owned(),
            other => other.to_string(),
        };

        let body = Json(json!({
            "error": {
                "kind": self.kind(),
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("game 123".to_owned());
        assert_eq!(err.to_string(), "Not found: game 123");

        let err = AppError::Validation("price cannot be negative".to_owned());
        assert_eq!(err.to_string(), "Validation error: price cannot be negative");
    }

    #[test]
    fn test_stable_kinds() {
        assert_eq!(AppError::Validation(String::new()).kind(), "validation_error");
        assert_eq!(AppError::Auth(String::new()).kind(), "auth_error");
        assert_eq!(AppError::Forbidden(String::new()).kind(), "forbidden");
        assert_eq!(AppError::NotFound(String::new()).kind(), "not_found");
        assert_eq!(AppError::InvalidState(String::new()).kind(), "invalid_state");
        assert_eq!(AppError::AlreadyOwned(String::new()).kind(), "already_owned");
        assert_eq!(AppError::DuplicateReview.kind(), "duplicate_review");
        assert_eq!(AppError::NotAvailable(String::new()).kind(), "not_available");
        assert_eq!(AppError::Dependency(String::new()).kind(), "dependency_error");
    }

    #[test]
    fn test_app_error_status_codes() {
        fn get_status(err: AppError) -> StatusCode {
            err.into_response().status()
        }

        assert_eq!(
            get_status(AppError::Validation("test".to_owned())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Auth("test".to_owned())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::Forbidden("test".to_owned())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            get_status(AppError::NotFound("test".to_owned())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::NotAvailable("test".to_owned())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::InvalidState("test".to_owned())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(AppError::AlreadyOwned("test".to_owned())),
            StatusCode::CONFLICT
        );
        assert_eq!(get_status(AppError::DuplicateReview), StatusCode::CONFLICT);
        assert_eq!(
            get_status(AppError::Dependency("test".to_owned())),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_transition_error_maps_to_invalid_state() {
        use pixelport_core::{ListingStatus, ReviewDecision};

        let err = ListingStatus::Approved
            .decide(ReviewDecision::Approve)
            .expect_err("approved is terminal");
        let app: AppError = err.into();
        assert_eq!(app.kind(), "invalid_state");
        assert_eq!(app.status(), StatusCode::CONFLICT);
    }
}
