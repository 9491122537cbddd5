//! Authentication service.
//!
//! Passwords are hashed with Argon2id. Session credentials are opaque
//! bearer tokens: 32 random bytes, base64url-encoded for the client, stored
//! server-side as a SHA-256 hex digest with an expiry. The token itself
//! carries no claims; the database row is the source of truth, so logout is
//! a simple delete.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use sha2::{Digest, Sha256};
use sqlx::PgPool;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use pixelport_core::{AccountRole, Email, EmailError, UserId};

use crate::db::RepositoryError;
use crate::db::tokens::{TokenRepository, VerificationKind};
use crate::db::users::UserRepository;
use crate::models::User;

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Bearer token lifetime.
fn access_token_ttl() -> Duration {
    Duration::days(7)
}

/// Email verification token lifetime.
fn email_token_ttl() -> Duration {
    Duration::hours(24)
}

/// Password reset token lifetime.
fn reset_token_ttl() -> Duration {
    Duration::hours(1)
}

/// Authentication errors.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Wrong email or password (indistinguishable on purpose).
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The email is already registered.
    #[error("account already exists")]
    UserAlreadyExists,

    /// Password fails the strength requirements.
    #[error("{0}")]
    WeakPassword(String),

    /// Email address fails validation.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// Bearer or verification token is unknown, expired, or already used.
    #[error("invalid or expired token")]
    TokenInvalid,

    /// The account exists but has not verified its email.
    #[error("account not verified")]
    AccountUnverified,

    /// Password hashing failed.
    #[error("password hashing failed")]
    PasswordHash,

    /// Underlying repository failure.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Authentication service.
///
/// Handles registration, login, bearer token lifecycle, email verification,
/// and password changes/resets.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
    tokens: TokenRepository<'a>,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            users: UserRepository::new(pool),
            tokens: TokenRepository::new(pool),
        }
    }

    // =========================================================================
    // Registration & verification
    // =========================================================================

    /// Register a new account and mint its email verification token.
    ///
    /// Returns the created user and the verification token to embed in the
    /// email link.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` / `AuthError::WeakPassword` on
    /// validation failure and `AuthError::UserAlreadyExists` for duplicate
    /// emails.
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
        role: AccountRole,
    ) -> Result<(User, String), AuthError> {
        let email = Email::parse(email)?;
        validate_password(password)?;
        let password_hash = hash_password(password)?;

        let user = self
            .users
            .create(name, &email, &password_hash, role)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })?;

        let token = mint_token();
        self.tokens
            .insert_verification_token(
                user.id,
                &token,
                VerificationKind::Email,
                Utc::now() + email_token_ttl(),
            )
            .await?;

        Ok((user, token))
    }

    /// Consume an email verification token and mark the account verified.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::TokenInvalid` for unknown, used, or expired
    /// tokens.
    pub async fn verify_email(&self, token: &str) -> Result<(), AuthError> {
        let user_id = self
            .tokens
            .consume_verification_token(token, VerificationKind::Email)
            .await?
            .ok_or(AuthError::TokenInvalid)?;

        self.users.set_verified(user_id).await?;

        Ok(())
    }

    // =========================================================================
    // Login & bearer tokens
    // =========================================================================

    /// Login with email and password, minting a bearer token.
    ///
    /// Returns the user and the plaintext token; only its hash is stored.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong.
    pub async fn login(&self, email: &str, password: &str) -> Result<(User, String), AuthError> {
        let email = Email::parse(email).map_err(|_| AuthError::InvalidCredentials)?;

        let (user, password_hash) = self
            .users
            .get_with_password(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;

        let token = mint_token();
        self.tokens
            .insert_access_token(user.id, &token_hash(&token), Utc::now() + access_token_ttl())
            .await?;

        Ok((user, token))
    }

    /// Resolve a bearer token to its user.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::TokenInvalid` for unknown or expired tokens.
    pub async fn authenticate(&self, token: &str) -> Result<User, AuthError> {
        self.tokens
            .find_user_by_access_token(&token_hash(token))
            .await?
            .ok_or(AuthError::TokenInvalid)
    }

    /// Revoke a bearer token (logout).
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if the delete fails.
    pub async fn logout(&self, token: &str) -> Result<(), AuthError> {
        self.tokens.revoke_access_token(&token_hash(token)).await?;
        Ok(())
    }

    // =========================================================================
    // Password management
    // =========================================================================

    /// Change a password, requiring the current one.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the current password is
    /// wrong, or `AuthError::WeakPassword` if the new one is too weak.
    pub async fn change_password(
        &self,
        user_id: UserId,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        let current_hash = self.users.get_password_hash(user_id).await?;
        verify_password(current_password, &current_hash)?;

        validate_password(new_password)?;
        let new_hash = hash_password(new_password)?;
        self.users.set_password(user_id, &new_hash).await?;

        Ok(())
    }

    /// Start a password reset.
    ///
    /// Returns `None` for unknown addresses so callers can answer
    /// identically either way and not reveal account existence.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` for malformed addresses.
    pub async fn request_password_reset(
        &self,
        email: &str,
    ) -> Result<Option<(User, String)>, AuthError> {
        let email = Email::parse(email)?;

        let Some(user) = self.users.get_by_email(&email).await? else {
            return Ok(None);
        };

        let token = mint_token();
        self.tokens
            .insert_verification_token(
                user.id,
                &token,
                VerificationKind::PasswordReset,
                Utc::now() + reset_token_ttl(),
            )
            .await?;

        Ok(Some((user, token)))
    }

    /// Finish a password reset with a token from the email link.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::TokenInvalid` for unknown, used, or expired
    /// tokens, and `AuthError::WeakPassword` for weak replacements.
    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<(), AuthError> {
        validate_password(new_password)?;

        let user_id = self
            .tokens
            .consume_verification_token(token, VerificationKind::PasswordReset)
            .await?
            .ok_or(AuthError::TokenInvalid)?;

        let new_hash = hash_password(new_password)?;
        self.users.set_password(user_id, &new_hash).await?;

        Ok(())
    }
}

/// Validate password meets requirements.
///
/// # Errors
///
/// Returns `AuthError::WeakPassword` when too short.
pub fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    Ok(())
}

/// Hash a password using Argon2id.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
///
/// # Errors
///
/// Returns `AuthError::InvalidCredentials` on mismatch.
pub fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

/// Mint an opaque token: 32 random bytes, base64url without padding.
#[must_use]
pub fn mint_token() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// The stored form of a bearer token: SHA-256 hex digest.
#[must_use]
pub fn token_hash(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hash_roundtrip() {
        let hash = hash_password("correct horse battery").unwrap();
        assert!(verify_password("correct horse battery", &hash).is_ok());
        assert!(matches!(
            verify_password("wrong password", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_hashes_are_salted() {
        let a = hash_password("same password").unwrap();
        let b = hash_password("same password").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_validate_password_too_short() {
        assert!(matches!(
            validate_password("short"),
            Err(AuthError::WeakPassword(_))
        ));
        assert!(validate_password("long enough").is_ok());
    }

    #[test]
    fn test_mint_token_shape() {
        let token = mint_token();
        // 32 bytes -> 43 base64url chars, no padding
        assert_eq!(token.len(), 43);
        assert!(!token.contains('='));
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn test_mint_token_unique() {
        assert_ne!(mint_token(), mint_token());
    }

    #[test]
    fn test_token_hash_is_stable_sha256_hex() {
        let a = token_hash("some-token");
        let b = token_hash("some-token");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, token_hash("other-token"));
    }
}
