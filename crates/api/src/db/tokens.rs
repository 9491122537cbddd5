//! Bearer and verification token repositories.
//!
//! Bearer tokens are stored hashed (SHA-256 hex); the plaintext exists only
//! in the response that issued it. Verification tokens are single-use and
//! expiring, for email verification and password resets.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use pixelport_core::UserId;

use super::RepositoryError;
use crate::models::User;

/// Kind discriminator for verification tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationKind {
    Email,
    PasswordReset,
}

impl VerificationKind {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::PasswordReset => "password_reset",
        }
    }
}

/// Repository for token database operations.
pub struct TokenRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> TokenRepository<'a> {
    /// Create a new token repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    // Bearer tokens
    // =========================================================================

    /// Store a freshly minted bearer token hash.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn insert_access_token(
        &self,
        user_id: UserId,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO auth_tokens (user_id, token_hash, expires_at) VALUES ($1, $2, $3)",
        )
        .bind(user_id)
        .bind(token_hash)
        .bind(expires_at)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Resolve a bearer token hash to its user, if the token is live.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_user_by_access_token(
        &self,
        token_hash: &str,
    ) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT u.id, u.name, u.email, u.role, u.verified, u.avatar_ref, u.bio,
                    u.created_at, u.updated_at
             FROM auth_tokens t
             JOIN users u ON u.id = t.user_id
             WHERE t.token_hash = $1 AND t.expires_at > now()",
        )
        .bind(token_hash)
        .fetch_optional(self.pool)
        .await?;

        Ok(user)
    }

    /// Revoke a bearer token (logout).
    ///
    /// Revoking an unknown token is not an error.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn revoke_access_token(&self, token_hash: &str) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM auth_tokens WHERE token_hash = $1")
            .bind(token_hash)
            .execute(self.pool)
            .await?;

        Ok(())
    }

    // =========================================================================
    // Verification tokens
    // =========================================================================

    /// Store a verification or password-reset token.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn insert_verification_token(
        &self,
        user_id: UserId,
        token: &str,
        kind: VerificationKind,
        expires_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO verification_tokens (user_id, token, kind, expires_at)
             VALUES ($1, $2, $3, $4)",
        )
        .bind(user_id)
        .bind(token)
        .bind(kind.as_str())
        .bind(expires_at)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Consume a verification token, returning its user.
    ///
    /// A single UPDATE marks the token used and returns the owner, so a
    /// token can be consumed exactly once even under concurrent requests.
    /// Returns `None` for unknown, already-used, or expired tokens.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn consume_verification_token(
        &self,
        token: &str,
        kind: VerificationKind,
    ) -> Result<Option<UserId>, RepositoryError> {
        let row: Option<(UserId,)> = sqlx::query_as(
            "UPDATE verification_tokens
             SET used = TRUE
             WHERE token = $1 AND kind = $2 AND used = FALSE AND expires_at > now()
             RETURNING user_id",
        )
        .bind(token)
        .bind(kind.as_str())
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(|(id,)| id))
    }
}
