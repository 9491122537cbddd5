//! Database operations for the Pixelport `PostgreSQL` database.
//!
//! ## Tables
//!
//! - `users` - Accounts (buyer / developer / admin) and credential hashes
//! - `auth_tokens` - Opaque bearer tokens (hashed)
//! - `verification_tokens` - Email verification and password reset tokens
//! - `games` - Game listings with their approval lifecycle
//! - `purchases` - Checkout receipts
//! - `entitlements` - Library entries, doubling as receipt line items;
//!   at most one per (buyer, game)
//! - `reviews` - Buyer reviews; at most one per (author, game)
//! - `download_log` - Download audit
//! - `audit_log` - Destructive admin operations
//!
//! # Migrations
//!
//! Migrations are stored in `crates/api/migrations/` and run via:
//! ```bash
//! cargo run -p pixelport-cli -- migrate
//! ```
//!
//! All queries use runtime-checked `sqlx::query`/`query_as` so the workspace
//! builds without a live database.

pub mod admin;
pub mod entitlements;
pub mod games;
pub mod reviews;
pub mod tokens;
pub mod users;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use admin::AdminRepository;
pub use entitlements::EntitlementRepository;
pub use games::GameRepository;
pub use reviews::ReviewRepository;
pub use tokens::TokenRepository;
pub use users::UserRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Map a sqlx error, converting unique violations into `Conflict`.
    pub(crate) fn from_unique_violation(err: sqlx::Error, what: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = err
            && db_err.is_unique_violation()
        {
            return Self::Conflict(format!("{what} already exists"));
        }
        Self::Database(err)
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
