//! CLI command implementations.

pub mod admin;
pub mod migrate;
pub mod users;

use secrecy::SecretString;
use sqlx::PgPool;

/// Errors surfaced by CLI commands.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Repository error: {0}")]
    Repository(#[from] pixelport_api::db::RepositoryError),

    #[error("Auth error: {0}")]
    Auth(#[from] pixelport_api::services::auth::AuthError),

    #[error("Invalid email: {0}")]
    Email(#[from] pixelport_core::EmailError),

    #[error("{0}")]
    Invalid(String),
}

/// Connect to the database named by the environment.
pub async fn connect() -> Result<PgPool, CliError> {
    dotenvy::dotenv().ok();

    let url = std::env::var("PIXELPORT_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map_err(|_| CliError::MissingEnvVar("PIXELPORT_DATABASE_URL"))?;

    let pool = pixelport_api::db::create_pool(&SecretString::from(url)).await?;

    Ok(pool)
}
