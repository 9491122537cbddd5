//! Purchase and entitlement repository.
//!
//! Entitlements double as receipt line items: a checkout inserts one receipt
//! row plus one entitlement per game, all in one transaction. The
//! `(buyer_id, game_id)` unique index is the arbiter under concurrent
//! duplicate requests.

use sqlx::PgPool;

use pixelport_core::{CheckoutTotals, GameId, Price, PurchaseId, UserId};

use super::RepositoryError;
use crate::models::{Entitlement, LibraryEntry, Purchase, PurchaseItem};

const ENTITLEMENT_COLUMNS: &str = "id, buyer_id, game_id, purchase_id, price_paid, created_at";
const PURCHASE_COLUMNS: &str =
    "id, buyer_id, order_number, payment_method, subtotal, tax, total, created_at";

/// Repository for commerce database operations.
pub struct EntitlementRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> EntitlementRepository<'a> {
    /// Create a new entitlement repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get the entitlement for a (buyer, game) pair, if any.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find(
        &self,
        buyer_id: UserId,
        game_id: GameId,
    ) -> Result<Option<Entitlement>, RepositoryError> {
        let entitlement = sqlx::query_as::<_, Entitlement>(&format!(
            "SELECT {ENTITLEMENT_COLUMNS} FROM entitlements
             WHERE buyer_id = $1 AND game_id = $2"
        ))
        .bind(buyer_id)
        .bind(game_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(entitlement)
    }

    /// Which of `game_ids` the buyer already owns.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn owned_among(
        &self,
        buyer_id: UserId,
        game_ids: &[GameId],
    ) -> Result<Vec<GameId>, RepositoryError> {
        let raw_ids: Vec<i32> = game_ids.iter().map(GameId::as_i32).collect();
        let rows: Vec<(GameId,)> = sqlx::query_as(
            "SELECT game_id FROM entitlements WHERE buyer_id = $1 AND game_id = ANY($2)",
        )
        .bind(buyer_id)
        .bind(&raw_ids)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    /// Record a successful checkout: one receipt plus one entitlement per
    /// game, atomically.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if any (buyer, game) entitlement
    /// already exists — the whole transaction rolls back, no partial commit.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn record_checkout(
        &self,
        buyer_id: UserId,
        order_number: &str,
        payment_method: &str,
        totals: &CheckoutTotals,
        items: &[(GameId, Price)],
    ) -> Result<Purchase, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let purchase = sqlx::query_as::<_, Purchase>(&format!(
            "INSERT INTO purchases (buyer_id, order_number, payment_method, subtotal, tax, total)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {PURCHASE_COLUMNS}"
        ))
        .bind(buyer_id)
        .bind(order_number)
        .bind(payment_method)
        .bind(totals.subtotal)
        .bind(totals.tax)
        .bind(totals.total)
        .fetch_one(&mut *tx)
        .await?;

        for (game_id, price_paid) in items {
            sqlx::query(
                "INSERT INTO entitlements (buyer_id, game_id, purchase_id, price_paid)
                 VALUES ($1, $2, $3, $4)",
            )
            .bind(buyer_id)
            .bind(*game_id)
            .bind(purchase.id)
            .bind(*price_paid)
            .execute(&mut *tx)
            .await
            .map_err(|e| RepositoryError::from_unique_violation(e, "entitlement"))?;
        }

        tx.commit().await?;

        Ok(purchase)
    }

    /// Grant a free-claim entitlement, idempotently.
    ///
    /// The insert is `ON CONFLICT DO NOTHING`, so a repeated (or concurrent
    /// duplicate) claim reads back the existing row instead of erroring.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the transaction fails.
    pub async fn claim_free(
        &self,
        buyer_id: UserId,
        game_id: GameId,
    ) -> Result<Entitlement, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO entitlements (buyer_id, game_id, price_paid)
             VALUES ($1, $2, $3)
             ON CONFLICT (buyer_id, game_id) DO NOTHING",
        )
        .bind(buyer_id)
        .bind(game_id)
        .bind(Price::ZERO)
        .execute(&mut *tx)
        .await?;

        let entitlement = sqlx::query_as::<_, Entitlement>(&format!(
            "SELECT {ENTITLEMENT_COLUMNS} FROM entitlements
             WHERE buyer_id = $1 AND game_id = $2"
        ))
        .bind(buyer_id)
        .bind(game_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(entitlement)
    }

    /// The buyer's library: every entitlement joined with its listing.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn library(&self, buyer_id: UserId) -> Result<Vec<LibraryEntry>, RepositoryError> {
        let entries = sqlx::query_as::<_, LibraryEntry>(
            "SELECT e.id AS entitlement_id, e.game_id, g.title, g.genre, g.cover_ref,
                    u.name AS developer_name, g.download_kind, e.price_paid,
                    e.created_at AS acquired_at
             FROM entitlements e
             JOIN games g ON g.id = e.game_id
             JOIN users u ON u.id = g.developer_id
             WHERE e.buyer_id = $1
             ORDER BY e.created_at DESC",
        )
        .bind(buyer_id)
        .fetch_all(self.pool)
        .await?;

        Ok(entries)
    }

    /// Record a download in the audit log.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn log_download(
        &self,
        user_id: UserId,
        game_id: GameId,
    ) -> Result<(), RepositoryError> {
        sqlx::query("INSERT INTO download_log (user_id, game_id) VALUES ($1, $2)")
            .bind(user_id)
            .bind(game_id)
            .execute(self.pool)
            .await?;

        Ok(())
    }

    /// The buyer's receipts, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn purchases(&self, buyer_id: UserId) -> Result<Vec<Purchase>, RepositoryError> {
        let purchases = sqlx::query_as::<_, Purchase>(&format!(
            "SELECT {PURCHASE_COLUMNS} FROM purchases
             WHERE buyer_id = $1 ORDER BY created_at DESC"
        ))
        .bind(buyer_id)
        .fetch_all(self.pool)
        .await?;

        Ok(purchases)
    }

    /// Line items for a set of receipts.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn items_for_purchases(
        &self,
        purchase_ids: &[PurchaseId],
    ) -> Result<Vec<PurchaseItem>, RepositoryError> {
        let raw_ids: Vec<i32> = purchase_ids.iter().map(PurchaseId::as_i32).collect();
        let items = sqlx::query_as::<_, PurchaseItem>(
            "SELECT e.purchase_id, e.game_id, g.title, e.price_paid
             FROM entitlements e
             JOIN games g ON g.id = e.game_id
             WHERE e.purchase_id = ANY($1)",
        )
        .bind(&raw_ids)
        .fetch_all(self.pool)
        .await?;

        Ok(items)
    }
}
