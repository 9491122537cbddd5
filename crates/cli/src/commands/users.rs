//! User account management commands.

use chrono::{Duration, Utc};

use pixelport_api::db::admin::AdminRepository;
use pixelport_api::db::users::UserRepository;
use pixelport_core::Email;

use super::CliError;

/// Mark an account verified without the email round-trip.
///
/// # Errors
///
/// Returns `CliError` if no account exists for the address.
pub async fn verify(email: &str) -> Result<(), CliError> {
    let email = Email::parse(email)?;

    let pool = super::connect().await?;
    let users = UserRepository::new(&pool);

    let user = users
        .get_by_email(&email)
        .await?
        .ok_or_else(|| CliError::Invalid(format!("no account for {email}")))?;

    users.set_verified(user.id).await?;

    tracing::info!(%email, "account verified");

    Ok(())
}

/// Delete unverified accounts older than `days`.
///
/// # Errors
///
/// Returns `CliError` for a negative threshold or database failure.
pub async fn prune_unverified(days: i64) -> Result<(), CliError> {
    if days < 0 {
        return Err(CliError::Invalid("days must be non-negative".to_owned()));
    }

    let pool = super::connect().await?;
    let cutoff = Utc::now() - Duration::days(days);

    let removed = AdminRepository::new(&pool).prune_unverified(cutoff).await?;

    tracing::info!(days, removed, "unverified accounts pruned");

    Ok(())
}
