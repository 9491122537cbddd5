//! Review & rating workflow.
//!
//! Only entitlement holders may review, one review per (author, game), and
//! the aggregate rating is never stored: the catalog query recomputes the
//! mean on every read.

use sqlx::PgPool;

use pixelport_core::{GameId, ReviewId};

use crate::db::RepositoryError;
use crate::db::entitlements::EntitlementRepository;
use crate::db::games::GameRepository;
use crate::db::reviews::ReviewRepository;
use crate::error::{AppError, Result};
use crate::models::review::{MAX_RATING, MIN_RATING};
use crate::models::{Review, User};

/// Review workflow.
pub struct ReviewService<'a> {
    games: GameRepository<'a>,
    entitlements: EntitlementRepository<'a>,
    reviews: ReviewRepository<'a>,
}

impl<'a> ReviewService<'a> {
    /// Create a new review service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            games: GameRepository::new(pool),
            entitlements: EntitlementRepository::new(pool),
            reviews: ReviewRepository::new(pool),
        }
    }

    /// Post a review for an owned game.
    ///
    /// # Errors
    ///
    /// - `AppError::Validation` for an out-of-range rating or empty body
    /// - `AppError::NotFound` for unknown games
    /// - `AppError::Forbidden` without an entitlement (purchase or free claim)
    /// - `AppError::DuplicateReview` on a second review for the same game,
    ///   including under concurrent duplicate posts
    pub async fn post(
        &self,
        author: &User,
        game_id: GameId,
        rating: i32,
        body: &str,
    ) -> Result<Review> {
        if !(MIN_RATING..=MAX_RATING).contains(&rating) {
            return Err(AppError::Validation(format!(
                "rating must be between {MIN_RATING} and {MAX_RATING}"
            )));
        }

        let body = body.trim();
        if body.is_empty() {
            return Err(AppError::Validation("review text is required".to_owned()));
        }

        self.games
            .get(game_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("game {game_id} not found")))?;

        self.entitlements
            .find(author.id, game_id)
            .await?
            .ok_or_else(|| {
                AppError::Forbidden("only owners of this game can review it".to_owned())
            })?;

        let review = self
            .reviews
            .create(game_id, author.id, rating, body)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AppError::DuplicateReview,
                other => other.into(),
            })?;

        Ok(review)
    }

    /// Reviews for a game, newest first.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` for unknown games.
    pub async fn list(&self, game_id: GameId, skip: i64, limit: i64) -> Result<Vec<Review>> {
        self.games
            .get(game_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("game {game_id} not found")))?;

        Ok(self.reviews.list_for_game(game_id, skip, limit).await?)
    }

    /// Delete a review. Allowed for its author and for admins.
    ///
    /// # Errors
    ///
    /// - `AppError::NotFound` for unknown reviews
    /// - `AppError::Forbidden` for anyone else
    pub async fn delete(&self, actor: &User, review_id: ReviewId) -> Result<Review> {
        let review = self
            .reviews
            .get(review_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("review {review_id} not found")))?;

        if review.author_id != actor.id && !actor.role.is_admin() {
            return Err(AppError::Forbidden(
                "only the author or an admin can delete a review".to_owned(),
            ));
        }

        self.reviews.delete(review_id).await?;

        Ok(review)
    }
}
