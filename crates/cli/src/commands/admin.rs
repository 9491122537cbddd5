//! Admin account management commands.
//!
//! Admin accounts are never self-registered through the API; they are
//! created or promoted here, by an operator with database access.

use pixelport_api::db::users::UserRepository;
use pixelport_api::services::auth;
use pixelport_core::{AccountRole, Email};

use super::CliError;

/// Create a new admin account, already verified.
///
/// # Errors
///
/// Returns `CliError` if the email is taken or the password is too weak.
pub async fn create(email: &str, name: &str, password: &str) -> Result<(), CliError> {
    let email = Email::parse(email)?;
    auth::validate_password(password)?;
    let password_hash = auth::hash_password(password)?;

    let pool = super::connect().await?;
    let users = UserRepository::new(&pool);

    let user = users
        .create(name, &email, &password_hash, AccountRole::Admin)
        .await?;
    users.set_verified(user.id).await?;

    tracing::info!(email = %user.email, "admin account created");

    Ok(())
}

/// Promote an existing account to admin.
///
/// # Errors
///
/// Returns `CliError` if no account exists for the address.
pub async fn promote(email: &str) -> Result<(), CliError> {
    let email = Email::parse(email)?;

    let pool = super::connect().await?;

    let result = sqlx::query("UPDATE users SET role = $1, updated_at = now() WHERE email = $2")
        .bind(AccountRole::Admin)
        .bind(&email)
        .execute(&pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(CliError::Invalid(format!("no account for {email}")));
    }

    tracing::info!(%email, "account promoted to admin");

    Ok(())
}
