//! Authentication extractors.
//!
//! Every protected operation declares the role it requires through one of
//! these extractors; handlers never re-check roles internally. The bearer
//! credential is opaque to everything above the auth service.

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
};

use crate::error::AppError;
use crate::models::User;
use crate::services::auth::AuthService;
use crate::state::AppState;

/// Extractor requiring a valid bearer token and a verified account.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     CurrentUser(user): CurrentUser,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", user.name)
/// }
/// ```
pub struct CurrentUser(pub User);

/// Extractor requiring a developer (or admin) account.
pub struct RequireDeveloper(pub User);

/// Extractor requiring an admin account.
pub struct RequireAdmin(pub User);

/// Extractor that optionally resolves the caller.
///
/// Unlike [`CurrentUser`], this never rejects: anonymous and invalid
/// credentials both yield `None`.
pub struct OptionalUser(pub Option<User>);

/// Pull the bearer token out of the `Authorization` header.
///
/// # Errors
///
/// Returns `AppError::Auth` when the header is missing or malformed.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AppError> {
    let header = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Auth("missing bearer credential".to_owned()))?;

    header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::Auth("malformed authorization header".to_owned()))
}

async fn authenticate(state: &AppState, parts: &Parts) -> Result<User, AppError> {
    let token = bearer_token(&parts.headers)?;
    let user = AuthService::new(state.pool()).authenticate(token).await?;
    Ok(user)
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = authenticate(state, parts).await?;

        if !user.verified {
            return Err(AppError::Forbidden(
                "account not verified; check your email".to_owned(),
            ));
        }

        Ok(Self(user))
    }
}

impl FromRequestParts<AppState> for RequireDeveloper {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;

        if !user.role.can_publish() {
            return Err(AppError::Forbidden(
                "a developer account is required".to_owned(),
            ));
        }

        Ok(Self(user))
    }
}

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;

        if !user.role.is_admin() {
            return Err(AppError::Forbidden(
                "admin privileges are required".to_owned(),
            ));
        }

        Ok(Self(user))
    }
}

impl FromRequestParts<AppState> for OptionalUser {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(Self(authenticate(state, parts).await.ok()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_bearer_token_missing_header() {
        let headers = HeaderMap::new();
        assert!(matches!(bearer_token(&headers), Err(AppError::Auth(_))));
    }

    #[test]
    fn test_bearer_token_wrong_scheme() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic dXNlcg=="));
        assert!(matches!(bearer_token(&headers), Err(AppError::Auth(_))));
    }

    #[test]
    fn test_bearer_token_extracts_value() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer tok-123"));
        assert_eq!(bearer_token(&headers).ok(), Some("tok-123"));
    }
}
