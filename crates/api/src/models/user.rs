//! User account model.

use chrono::{DateTime, Utc};
use serde::Serialize;

use pixelport_core::{AccountRole, Email, UserId};

/// A marketplace account.
///
/// The credential hash never leaves the database layer; this struct is safe
/// to serialize into API responses.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Email address (unique).
    pub email: Email,
    /// Account tier.
    pub role: AccountRole,
    /// Whether the email address has been verified.
    pub verified: bool,
    /// Optional avatar asset reference.
    pub avatar_ref: Option<String>,
    /// Optional profile bio.
    pub bio: Option<String>,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
    /// When the account was last updated.
    pub updated_at: Option<DateTime<Utc>>,
}
