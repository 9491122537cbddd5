//! Commerce workflow: checkout, free claims, library, and downloads.
//!
//! The cart never exists server-side; checkout receives the client-held
//! list of game ids and reconciles it into a receipt plus entitlements in
//! one transaction. Payment is simulated: authorization always succeeds and
//! nothing settles anywhere.

use std::collections::HashSet;

use sqlx::PgPool;
use url::Url;

use pixelport_core::{CheckoutTotals, GameId, ListingStatus, Price};

use crate::db::RepositoryError;
use crate::db::entitlements::EntitlementRepository;
use crate::db::games::GameRepository;
use crate::error::{AppError, Result};
use crate::models::{Entitlement, Game, LibraryEntry, Purchase, PurchaseItem, User};
use crate::services::assets::AssetStore;

/// Where a download should send the client.
#[derive(Debug, Clone)]
pub struct DownloadTarget {
    /// The URL to redirect to: a signed store link or the external link.
    pub url: Url,
    /// The game title, for `Content-Disposition`-style hints client-side.
    pub title: String,
}

/// Commerce workflow.
pub struct CommerceService<'a> {
    games: GameRepository<'a>,
    entitlements: EntitlementRepository<'a>,
}

impl<'a> CommerceService<'a> {
    /// Create a new commerce service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            games: GameRepository::new(pool),
            entitlements: EntitlementRepository::new(pool),
        }
    }

    /// Price a client-held cart without committing anything.
    ///
    /// Returns the games (validated present and approved) and the totals
    /// they would check out at right now.
    ///
    /// # Errors
    ///
    /// Same validation failures as [`checkout`](Self::checkout), minus the
    /// ownership check.
    pub async fn quote(&self, game_ids: &[GameId]) -> Result<(Vec<Game>, CheckoutTotals)> {
        let ids = dedupe(game_ids);
        if ids.is_empty() {
            return Err(AppError::Validation("the cart is empty".to_owned()));
        }

        let games = self.load_available(&ids).await?;
        let totals = CheckoutTotals::from_prices(games.iter().map(|g| g.price));

        Ok((games, totals))
    }

    /// Which of the given games the buyer already owns.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if the query fails.
    pub async fn owned(&self, buyer: &User, game_ids: &[GameId]) -> Result<Vec<GameId>> {
        Ok(self.entitlements.owned_among(buyer.id, game_ids).await?)
    }

    /// Check out a cart: verify availability and ownership, compute totals,
    /// simulate payment authorization, and atomically record the receipt
    /// plus one entitlement per game at the current listing price.
    ///
    /// # Errors
    ///
    /// - `AppError::Validation` for an empty cart or missing payment method
    /// - `AppError::NotFound` if any game does not exist
    /// - `AppError::NotAvailable` if any game is not approved
    /// - `AppError::AlreadyOwned` if any game is already owned; the entire
    ///   checkout is rejected, nothing is committed
    pub async fn checkout(
        &self,
        buyer: &User,
        game_ids: &[GameId],
        payment_method: &str,
    ) -> Result<(Purchase, Vec<PurchaseItem>)> {
        if payment_method.trim().is_empty() {
            return Err(AppError::Validation("a payment method is required".to_owned()));
        }

        let ids = dedupe(game_ids);
        if ids.is_empty() {
            return Err(AppError::Validation("the cart is empty".to_owned()));
        }

        let games = self.load_available(&ids).await?;

        let owned = self.entitlements.owned_among(buyer.id, &ids).await?;
        if let Some(first) = owned.first() {
            return Err(AppError::AlreadyOwned(format!(
                "game {first} is already in your library"
            )));
        }

        let totals = CheckoutTotals::from_prices(games.iter().map(|g| g.price));

        // Simulated payment: authorization always succeeds, nothing settles.
        authorize_payment(payment_method, &totals);

        let order_number = generate_order_number();
        let items: Vec<(GameId, Price)> = games.iter().map(|g| (g.id, g.price)).collect();

        // The (buyer, game) unique index catches concurrent duplicates that
        // slipped past the pre-check; the whole transaction rolls back.
        let purchase = self
            .entitlements
            .record_checkout(buyer.id, &order_number, payment_method, &totals, &items)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => {
                    AppError::AlreadyOwned("a game in the cart is already in your library".to_owned())
                }
                other => other.into(),
            })?;

        tracing::info!(
            buyer = %buyer.email,
            order = %purchase.order_number,
            total = %purchase.total,
            "checkout completed"
        );

        let line_items = self.entitlements.items_for_purchases(&[purchase.id]).await?;

        Ok((purchase, line_items))
    }

    /// Claim a free game into the library, idempotently.
    ///
    /// A repeated claim returns the existing entitlement; no duplicate row,
    /// no error.
    ///
    /// # Errors
    ///
    /// - `AppError::NotFound` for unknown games
    /// - `AppError::NotAvailable` if the game is not approved or not free
    pub async fn claim_free(&self, buyer: &User, game_id: GameId) -> Result<Entitlement> {
        let game = self
            .games
            .get(game_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("game {game_id} not found")))?;

        if game.status != ListingStatus::Approved || !game.price.is_free() {
            return Err(AppError::NotAvailable(format!(
                "game {game_id} is not available as a free claim"
            )));
        }

        let entitlement = self.entitlements.claim_free(buyer.id, game_id).await?;

        Ok(entitlement)
    }

    /// The buyer's library.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if the query fails.
    pub async fn library(&self, buyer: &User) -> Result<Vec<LibraryEntry>> {
        Ok(self.entitlements.library(buyer.id).await?)
    }

    /// Authorize a download: entitlement check, download log, then hand off
    /// to the asset store (signed URL) or the external link.
    ///
    /// # Errors
    ///
    /// - `AppError::Forbidden` without an entitlement
    /// - `AppError::NotFound` if the game row is gone
    /// - `AppError::Dependency` if the asset store cannot mint a link
    pub async fn download(
        &self,
        buyer: &User,
        game_id: GameId,
        assets: &AssetStore,
    ) -> Result<DownloadTarget> {
        self.entitlements
            .find(buyer.id, game_id)
            .await?
            .ok_or_else(|| AppError::Forbidden("you do not own this game".to_owned()))?;

        let game = self
            .games
            .get(game_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("game {game_id} not found")))?;

        let url = match game.download_kind {
            pixelport_core::DownloadKind::File => assets.resolve(&game.build_ref)?,
            pixelport_core::DownloadKind::Link => Url::parse(&game.build_ref).map_err(|e| {
                AppError::Database(RepositoryError::DataCorruption(format!(
                    "stored external link is invalid: {e}"
                )))
            })?,
        };

        self.entitlements.log_download(buyer.id, game_id).await?;

        Ok(DownloadTarget {
            url,
            title: game.title,
        })
    }

    /// The buyer's receipts with their line items.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if the query fails.
    pub async fn history(&self, buyer: &User) -> Result<(Vec<Purchase>, Vec<PurchaseItem>)> {
        let purchases = self.entitlements.purchases(buyer.id).await?;
        let ids: Vec<_> = purchases.iter().map(|p| p.id).collect();
        let items = if ids.is_empty() {
            Vec::new()
        } else {
            self.entitlements.items_for_purchases(&ids).await?
        };

        Ok((purchases, items))
    }

    /// Load the requested games, requiring each to exist and be approved.
    async fn load_available(&self, ids: &[GameId]) -> Result<Vec<Game>> {
        let mut games = self.games.fetch_many(ids).await?;

        for id in ids {
            let Some(game) = games.iter().find(|g| g.id == *id) else {
                return Err(AppError::NotFound(format!("game {id} not found")));
            };
            if game.status != ListingStatus::Approved {
                return Err(AppError::NotAvailable(format!(
                    "game {id} is not available for purchase"
                )));
            }
        }

        // Preserve the cart's order in responses.
        games.sort_by_key(|g| ids.iter().position(|id| *id == g.id));

        Ok(games)
    }
}

/// Simulated payment authorization. Always succeeds.
fn authorize_payment(payment_method: &str, totals: &CheckoutTotals) {
    tracing::info!(
        method = payment_method,
        total = %totals.total,
        "payment authorized (simulated)"
    );
}

/// Drop duplicate ids while preserving first-seen order.
fn dedupe(ids: &[GameId]) -> Vec<GameId> {
    let mut seen = HashSet::new();
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}

/// A human-facing order number: `PX-` plus eight uppercase hex digits.
fn generate_order_number() -> String {
    format!("PX-{:08X}", rand::random::<u32>())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedupe_preserves_order() {
        let ids = [
            GameId::new(3),
            GameId::new(1),
            GameId::new(3),
            GameId::new(2),
            GameId::new(1),
        ];
        assert_eq!(
            dedupe(&ids),
            vec![GameId::new(3), GameId::new(1), GameId::new(2)]
        );
    }

    #[test]
    fn test_dedupe_empty() {
        assert!(dedupe(&[]).is_empty());
    }

    #[test]
    fn test_order_number_shape() {
        let order = generate_order_number();
        assert!(order.starts_with("PX-"));
        assert_eq!(order.len(), 11);
        assert!(
            order[3..]
                .chars()
                .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase())
        );
    }
}
