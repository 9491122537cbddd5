//! Admin console repository: aggregates, paginated listings, destructive
//! operations, and the audit log.
//!
//! Destructive operations delete dependent rows in a fixed order inside one
//! transaction (reviews, entitlements, download log, receipts, listings,
//! account), mirroring the referential structure of the schema.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use pixelport_core::{AccountRole, Email, GameId, ListingStatus, Price, UserId};

use super::RepositoryError;

/// System-wide counters for the admin dashboard.
#[derive(Debug, Clone, serde::Serialize, sqlx::FromRow)]
pub struct AdminStats {
    pub total_users: i64,
    pub verified_users: i64,
    pub total_games: i64,
    pub approved_games: i64,
    pub total_purchases: i64,
    pub total_downloads: i64,
}

/// A user row in the admin console listing.
#[derive(Debug, Clone, serde::Serialize, sqlx::FromRow)]
pub struct AdminUserRow {
    pub id: UserId,
    pub name: String,
    pub email: Email,
    pub role: AccountRole,
    pub verified: bool,
    pub game_count: i64,
    pub purchase_count: i64,
}

/// A game row in the admin console listing.
#[derive(Debug, Clone, serde::Serialize, sqlx::FromRow)]
pub struct AdminGameRow {
    pub id: GameId,
    pub title: String,
    pub developer_name: String,
    pub price: Price,
    pub status: ListingStatus,
    pub download_count: i64,
    pub review_count: i64,
}

/// Repository for admin console operations.
pub struct AdminRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AdminRepository<'a> {
    /// Create a new admin repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// System-wide counters.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn stats(&self) -> Result<AdminStats, RepositoryError> {
        let stats = sqlx::query_as::<_, AdminStats>(
            "SELECT (SELECT COUNT(*) FROM users) AS total_users,
                    (SELECT COUNT(*) FROM users WHERE verified) AS verified_users,
                    (SELECT COUNT(*) FROM games) AS total_games,
                    (SELECT COUNT(*) FROM games WHERE status = 'approved') AS approved_games,
                    (SELECT COUNT(*) FROM purchases) AS total_purchases,
                    (SELECT COUNT(*) FROM download_log) AS total_downloads",
        )
        .fetch_one(self.pool)
        .await?;

        Ok(stats)
    }

    /// Paginated user listing with per-user counts.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_users(
        &self,
        skip: i64,
        limit: i64,
        verified: Option<bool>,
    ) -> Result<Vec<AdminUserRow>, RepositoryError> {
        let rows = sqlx::query_as::<_, AdminUserRow>(
            "SELECT u.id, u.name, u.email, u.role, u.verified,
                    (SELECT COUNT(*) FROM games g WHERE g.developer_id = u.id) AS game_count,
                    (SELECT COUNT(*) FROM purchases p WHERE p.buyer_id = u.id) AS purchase_count
             FROM users u
             WHERE ($3::boolean IS NULL OR u.verified = $3)
             ORDER BY u.id
             OFFSET $1 LIMIT $2",
        )
        .bind(skip)
        .bind(limit)
        .bind(verified)
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }

    /// Paginated game listing with optional status / developer filters.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_games(
        &self,
        skip: i64,
        limit: i64,
        status: Option<ListingStatus>,
        developer_id: Option<UserId>,
    ) -> Result<Vec<AdminGameRow>, RepositoryError> {
        let rows = sqlx::query_as::<_, AdminGameRow>(
            "SELECT g.id, g.title, u.name AS developer_name, g.price, g.status,
                    (SELECT COUNT(*) FROM download_log d WHERE d.game_id = g.id) AS download_count,
                    (SELECT COUNT(*) FROM reviews r WHERE r.game_id = g.id) AS review_count
             FROM games g
             JOIN users u ON u.id = g.developer_id
             WHERE ($3::listing_status IS NULL OR g.status = $3)
               AND ($4::integer IS NULL OR g.developer_id = $4)
             ORDER BY g.id
             OFFSET $1 LIMIT $2",
        )
        .bind(skip)
        .bind(limit)
        .bind(status)
        .bind(developer_id.map(|id| id.as_i32()))
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }

    /// Delete a listing and all its dependent rows.
    ///
    /// Returns the number of rows removed (listing included).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the listing doesn't exist.
    pub async fn delete_game(&self, game_id: GameId) -> Result<u64, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let mut removed = 0;

        for sql in [
            "DELETE FROM reviews WHERE game_id = $1",
            "DELETE FROM entitlements WHERE game_id = $1",
            "DELETE FROM download_log WHERE game_id = $1",
        ] {
            removed += sqlx::query(sql).bind(game_id).execute(&mut *tx).await?.rows_affected();
        }

        let deleted = sqlx::query("DELETE FROM games WHERE id = $1")
            .bind(game_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if deleted == 0 {
            tx.rollback().await?;
            return Err(RepositoryError::NotFound);
        }

        tx.commit().await?;

        Ok(removed + deleted)
    }

    /// Delete a user's listings (and their dependent rows) while keeping the
    /// account.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the transaction fails.
    pub async fn delete_user_games(&self, user_id: UserId) -> Result<u64, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let removed = Self::delete_games_of(&mut tx, user_id).await?;
        tx.commit().await?;

        Ok(removed)
    }

    /// Delete a user and every row that references them.
    ///
    /// With `delete_games` false the operation refuses to orphan listings and
    /// returns `Conflict` if the user still has any.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist, or
    /// `RepositoryError::Conflict` when listings block the deletion.
    pub async fn delete_user(
        &self,
        user_id: UserId,
        delete_games: bool,
    ) -> Result<u64, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let mut removed = 0;

        for sql in [
            "DELETE FROM verification_tokens WHERE user_id = $1",
            "DELETE FROM auth_tokens WHERE user_id = $1",
            "DELETE FROM reviews WHERE author_id = $1",
            "DELETE FROM entitlements WHERE buyer_id = $1",
            "DELETE FROM download_log WHERE user_id = $1",
            "DELETE FROM purchases WHERE buyer_id = $1",
        ] {
            removed += sqlx::query(sql).bind(user_id).execute(&mut *tx).await?.rows_affected();
        }

        if delete_games {
            removed += Self::delete_games_of(&mut tx, user_id).await?;
        } else {
            let (game_count,): (i64,) =
                sqlx::query_as("SELECT COUNT(*) FROM games WHERE developer_id = $1")
                    .bind(user_id)
                    .fetch_one(&mut *tx)
                    .await?;
            if game_count > 0 {
                tx.rollback().await?;
                return Err(RepositoryError::Conflict(
                    "user still has published listings".to_owned(),
                ));
            }
        }

        let deleted = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if deleted == 0 {
            tx.rollback().await?;
            return Err(RepositoryError::NotFound);
        }

        tx.commit().await?;

        Ok(removed + deleted)
    }

    /// Bulk-delete unverified accounts registered before `cutoff`.
    ///
    /// Returns the number of accounts removed. Unverified accounts cannot
    /// have published, purchased, or reviewed anything (those paths require
    /// verification), so only their tokens need sweeping first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the transaction fails.
    pub async fn prune_unverified(&self, cutoff: DateTime<Utc>) -> Result<u64, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        for sql in [
            "DELETE FROM verification_tokens WHERE user_id IN
               (SELECT id FROM users WHERE NOT verified AND created_at < $1)",
            "DELETE FROM auth_tokens WHERE user_id IN
               (SELECT id FROM users WHERE NOT verified AND created_at < $1)",
        ] {
            sqlx::query(sql).bind(cutoff).execute(&mut *tx).await?;
        }

        let deleted = sqlx::query("DELETE FROM users WHERE NOT verified AND created_at < $1")
            .bind(cutoff)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;

        Ok(deleted)
    }

    /// Record a destructive admin operation in the audit log.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn record_audit(
        &self,
        actor_id: UserId,
        action: &str,
        target: &str,
    ) -> Result<(), RepositoryError> {
        sqlx::query("INSERT INTO audit_log (actor_id, action, target) VALUES ($1, $2, $3)")
            .bind(actor_id)
            .bind(action)
            .bind(target)
            .execute(self.pool)
            .await?;

        Ok(())
    }

    /// Delete the listings of one developer plus their dependent rows,
    /// inside the caller's transaction.
    async fn delete_games_of(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        user_id: UserId,
    ) -> Result<u64, RepositoryError> {
        let mut removed = 0;

        for sql in [
            "DELETE FROM reviews WHERE game_id IN
               (SELECT id FROM games WHERE developer_id = $1)",
            "DELETE FROM entitlements WHERE game_id IN
               (SELECT id FROM games WHERE developer_id = $1)",
            "DELETE FROM download_log WHERE game_id IN
               (SELECT id FROM games WHERE developer_id = $1)",
            "DELETE FROM games WHERE developer_id = $1",
        ] {
            removed += sqlx::query(sql)
                .bind(user_id)
                .execute(&mut **tx)
                .await?
                .rows_affected();
        }

        Ok(removed)
    }
}
