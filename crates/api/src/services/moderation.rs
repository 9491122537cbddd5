//! Listing lifecycle workflow: submission, review, and visibility.
//!
//! A listing is born `Pending`, moves exactly once to `Approved` or
//! `Rejected` under an admin decision, and only `Approved` listings reach
//! the public catalog. The legality of the move itself lives in
//! [`ListingStatus::decide`]; this service adds the validation, the guarded
//! write, and the visibility rules.

use rust_decimal::Decimal;
use sqlx::PgPool;
use url::Url;

use pixelport_core::{DownloadKind, GameId, ListingStatus, Price, ReviewDecision, UserId};

use crate::db::games::GameRepository;
use crate::error::{AppError, Result};
use crate::models::{CatalogEntry, CatalogFilters, Game, NewGame, User};

/// A developer's listing submission payload, already deserialized.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct ListingSubmission {
    pub title: String,
    pub description: String,
    pub genre: String,
    pub price: Decimal,
    pub requirements: Option<String>,
    pub cover_ref: String,
    #[serde(default)]
    pub screenshot_refs: Vec<String>,
    pub trailer_ref: Option<String>,
    pub download_kind: DownloadKind,
    pub build_ref: String,
    pub size_mb: Option<Decimal>,
}

/// Listing moderation workflow.
pub struct ModerationService<'a> {
    games: GameRepository<'a>,
}

impl<'a> ModerationService<'a> {
    /// Create a new moderation service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            games: GameRepository::new(pool),
        }
    }

    /// Submit a new listing; it starts `Pending`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` if the price is negative or required
    /// metadata is missing.
    pub async fn submit(&self, developer: &User, submission: ListingSubmission) -> Result<Game> {
        let price = Price::new(submission.price).map_err(|e| AppError::Validation(e.to_string()))?;

        for (field, value) in [
            ("title", &submission.title),
            ("description", &submission.description),
            ("genre", &submission.genre),
            ("cover_ref", &submission.cover_ref),
        ] {
            if value.trim().is_empty() {
                return Err(AppError::Validation(format!("{field} is required")));
            }
        }

        match submission.download_kind {
            DownloadKind::File => {
                if submission.build_ref.trim().is_empty() {
                    return Err(AppError::Validation(
                        "a build upload reference is required".to_owned(),
                    ));
                }
            }
            DownloadKind::Link => {
                Url::parse(&submission.build_ref).map_err(|_| {
                    AppError::Validation("the external download link is not a valid URL".to_owned())
                })?;
            }
        }

        let game = self
            .games
            .create(&NewGame {
                developer_id: developer.id,
                title: submission.title,
                description: submission.description,
                genre: submission.genre,
                price,
                requirements: submission.requirements,
                cover_ref: submission.cover_ref,
                screenshot_refs: submission.screenshot_refs,
                trailer_ref: submission.trailer_ref,
                download_kind: submission.download_kind,
                build_ref: submission.build_ref,
                size_mb: submission.size_mb,
            })
            .await?;

        tracing::info!(game_id = %game.id, developer = %developer.email, "listing submitted");

        Ok(game)
    }

    /// Apply an admin review decision to a pending listing.
    ///
    /// # Errors
    ///
    /// - `AppError::NotFound` for unknown listings
    /// - `AppError::Validation` when a rejection has no reason
    /// - `AppError::InvalidState` when the listing is not pending (second
    ///   review included), even under concurrent decisions
    pub async fn review(
        &self,
        admin: &User,
        game_id: GameId,
        decision: ReviewDecision,
        reason: Option<&str>,
    ) -> Result<Game> {
        let game = self
            .games
            .get(game_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("game {game_id} not found")))?;

        let target = game.status.decide(decision)?;

        let reason = match decision {
            ReviewDecision::Reject => {
                let reason = reason.map(str::trim).unwrap_or_default();
                if reason.is_empty() {
                    return Err(AppError::Validation(
                        "a rejection reason is required".to_owned(),
                    ));
                }
                Some(reason)
            }
            ReviewDecision::Approve => None,
        };

        // The guarded update is the arbiter under concurrent reviews: only
        // one decision finds the row still pending.
        let updated = self
            .games
            .record_decision(game_id, target, admin.id, reason)
            .await?;

        match updated {
            Some(game) => {
                tracing::info!(
                    game_id = %game.id,
                    status = %game.status,
                    admin = %admin.email,
                    "listing reviewed"
                );
                Ok(game)
            }
            None => {
                let current = self
                    .games
                    .get(game_id)
                    .await?
                    .ok_or_else(|| AppError::NotFound(format!("game {game_id} not found")))?;
                Err(AppError::InvalidState(format!(
                    "listing is already {}; only pending listings can be reviewed",
                    current.status
                )))
            }
        }
    }

    /// The public catalog: approved listings with filters and pagination.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if the query fails.
    pub async fn catalog(&self, filters: &CatalogFilters) -> Result<Vec<CatalogEntry>> {
        Ok(self.games.list_catalog(filters).await?)
    }

    /// Listing detail with visibility rules.
    ///
    /// Approved listings are public. Pending and rejected listings resolve
    /// only for their owning developer and admins; everyone else gets
    /// `NotAvailable` so hidden listings are indistinguishable from absent
    /// ones at the status-code level.
    ///
    /// # Errors
    ///
    /// `AppError::NotFound` for unknown ids, `AppError::NotAvailable` for
    /// hidden ones.
    pub async fn detail(&self, game_id: GameId, viewer: Option<&User>) -> Result<Game> {
        let game = self
            .games
            .get(game_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("game {game_id} not found")))?;

        if !game.visible_to(viewer) {
            return Err(AppError::NotAvailable(format!(
                "game {game_id} is not available"
            )));
        }

        Ok(game)
    }

    /// All pending listings (the admin review queue).
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if the query fails.
    pub async fn pending(&self) -> Result<Vec<Game>> {
        Ok(self.games.list_pending().await?)
    }

    /// A developer's own listings, any status.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if the query fails.
    pub async fn listings_of(&self, developer_id: UserId) -> Result<Vec<Game>> {
        Ok(self.games.list_by_developer(developer_id).await?)
    }

    /// Whether a listing exists and is approved (helper for other services).
    ///
    /// # Errors
    ///
    /// `AppError::NotFound` when missing, `AppError::NotAvailable` when not
    /// approved.
    pub async fn require_approved(&self, game_id: GameId) -> Result<Game> {
        let game = self
            .games
            .get(game_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("game {game_id} not found")))?;

        if game.status != ListingStatus::Approved {
            return Err(AppError::NotAvailable(format!(
                "game {game_id} is not available"
            )));
        }

        Ok(game)
    }
}
