//! Authentication route handlers.
//!
//! Registration, login, email verification, and password management. Email
//! delivery is best-effort throughout: a failed send is logged and the
//! request still succeeds.

use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
};
use serde::{Deserialize, Serialize};

use pixelport_core::AccountRole;

use crate::error::{AppError, Result};
use crate::middleware::{CurrentUser, bearer_token};
use crate::models::User;
use crate::routes::MessageResponse;
use crate::services::auth::AuthService;
use crate::state::AppState;

// =============================================================================
// Payload Types
// =============================================================================

/// Registration payload.
#[derive(Debug, Deserialize)]
pub struct RegisterPayload {
    pub name: String,
    pub email: String,
    pub password: String,
    /// Requested tier; defaults to buyer. Admin accounts come from the CLI.
    pub role: Option<AccountRole>,
}

/// Login payload.
#[derive(Debug, Deserialize)]
pub struct LoginPayload {
    pub email: String,
    pub password: String,
}

/// Password change payload.
#[derive(Debug, Deserialize)]
pub struct ChangePasswordPayload {
    pub current_password: String,
    pub new_password: String,
}

/// Password reset request payload.
#[derive(Debug, Deserialize)]
pub struct ResetRequestPayload {
    pub email: String,
}

/// Password reset completion payload.
#[derive(Debug, Deserialize)]
pub struct ResetPasswordPayload {
    pub new_password: String,
}

/// Login response: the bearer credential plus the profile.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub user: User,
}

// =============================================================================
// Handlers
// =============================================================================

/// Register a new account and send the verification email.
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterPayload>,
) -> Result<(StatusCode, Json<MessageResponse>)> {
    let role = payload.role.unwrap_or(AccountRole::Buyer);
    if role.is_admin() {
        return Err(AppError::Validation(
            "admin accounts cannot be self-registered".to_owned(),
        ));
    }

    if payload.name.trim().is_empty() {
        return Err(AppError::Validation("a display name is required".to_owned()));
    }

    let service = AuthService::new(state.pool());
    let (user, token) = service
        .register(payload.name.trim(), &payload.email, &payload.password, role)
        .await?;

    if let Some(email) = state.email() {
        let verify_url = format!(
            "{}/api/auth/verificar/{token}",
            state.config().base_url.trim_end_matches('/')
        );
        if let Err(e) = email
            .send_verification_email(user.email.as_str(), &user.name, &verify_url)
            .await
        {
            tracing::warn!(error = %e, user = %user.email, "failed to send verification email");
        }
    } else {
        tracing::info!(user = %user.email, "email disabled; verification token not delivered");
    }

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::ok(
            "Account created. Check your email to verify it.",
        )),
    ))
}

/// Login, minting a bearer token.
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginPayload>,
) -> Result<Json<TokenResponse>> {
    let service = AuthService::new(state.pool());
    let (user, token) = service.login(&payload.email, &payload.password).await?;

    tracing::info!(user = %user.email, "login");

    Ok(Json(TokenResponse {
        access_token: token,
        token_type: "bearer",
        user,
    }))
}

/// Revoke the presented bearer token.
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<MessageResponse>> {
    let token = bearer_token(&headers)?;
    AuthService::new(state.pool()).logout(token).await?;

    Ok(Json(MessageResponse::ok("Session closed.")))
}

/// The authenticated caller's profile.
pub async fn profile(CurrentUser(user): CurrentUser) -> Json<User> {
    Json(user)
}

/// Consume an email verification token.
pub async fn verify_email(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Json<MessageResponse>> {
    AuthService::new(state.pool()).verify_email(&token).await?;

    Ok(Json(MessageResponse::ok(
        "Email verified. You can now sign in.",
    )))
}

/// Change password, requiring the current one.
pub async fn change_password(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<ChangePasswordPayload>,
) -> Result<Json<MessageResponse>> {
    AuthService::new(state.pool())
        .change_password(user.id, &payload.current_password, &payload.new_password)
        .await?;

    tracing::info!(user = %user.email, "password changed");

    Ok(Json(MessageResponse::ok("Password updated.")))
}

/// Start a password reset.
///
/// Always answers the same way so the endpoint cannot be used to probe
/// which addresses have accounts.
pub async fn request_password_reset(
    State(state): State<AppState>,
    Json(payload): Json<ResetRequestPayload>,
) -> Result<Json<MessageResponse>> {
    let outcome = AuthService::new(state.pool())
        .request_password_reset(&payload.email)
        .await;

    match outcome {
        Ok(Some((user, token))) => {
            if let Some(email) = state.email() {
                let reset_url = format!(
                    "{}/resetear?token={token}",
                    state.config().base_url.trim_end_matches('/')
                );
                if let Err(e) = email
                    .send_password_reset(user.email.as_str(), &user.name, &reset_url)
                    .await
                {
                    tracing::warn!(error = %e, user = %user.email, "failed to send reset email");
                }
            }
        }
        Ok(None) => {
            tracing::info!("password reset requested for unknown address");
        }
        // Malformed addresses get the same neutral answer as unknown ones.
        Err(e) => {
            tracing::debug!(error = %e, "password reset request rejected");
        }
    }

    Ok(Json(MessageResponse::ok(
        "If the address exists, a reset link is on its way.",
    )))
}

/// Finish a password reset with the emailed token.
pub async fn reset_password(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Json(payload): Json<ResetPasswordPayload>,
) -> Result<Json<MessageResponse>> {
    AuthService::new(state.pool())
        .reset_password(&token, &payload.new_password)
        .await?;

    Ok(Json(MessageResponse::ok("Password updated.")))
}
