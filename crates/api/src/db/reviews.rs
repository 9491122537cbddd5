//! Review repository.

use sqlx::PgPool;

use pixelport_core::{GameId, ReviewId, UserId};

use super::RepositoryError;
use crate::models::Review;

const REVIEW_SELECT: &str = "SELECT r.id, r.game_id, r.author_id, u.name AS author_name,
            r.rating, r.body, r.created_at
     FROM reviews r
     JOIN users u ON u.id = r.author_id";

/// Repository for review database operations.
pub struct ReviewRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ReviewRepository<'a> {
    /// Create a new review repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a review.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the author already reviewed
    /// this game (the `(game_id, author_id)` unique index).
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(
        &self,
        game_id: GameId,
        author_id: UserId,
        rating: i32,
        body: &str,
    ) -> Result<Review, RepositoryError> {
        let review_id: (ReviewId,) = sqlx::query_as(
            "INSERT INTO reviews (game_id, author_id, rating, body)
             VALUES ($1, $2, $3, $4)
             RETURNING id",
        )
        .bind(game_id)
        .bind(author_id)
        .bind(rating)
        .bind(body)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_unique_violation(e, "review"))?;

        self.get(review_id.0).await?.ok_or_else(|| {
            RepositoryError::DataCorruption("inserted review vanished".to_owned())
        })
    }

    /// Get a review by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ReviewId) -> Result<Option<Review>, RepositoryError> {
        let review = sqlx::query_as::<_, Review>(&format!("{REVIEW_SELECT} WHERE r.id = $1"))
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        Ok(review)
    }

    /// Reviews for a game, newest first, paginated.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_game(
        &self,
        game_id: GameId,
        skip: i64,
        limit: i64,
    ) -> Result<Vec<Review>, RepositoryError> {
        let reviews = sqlx::query_as::<_, Review>(&format!(
            "{REVIEW_SELECT} WHERE r.game_id = $1
             ORDER BY r.created_at DESC
             OFFSET $2 LIMIT $3"
        ))
        .bind(game_id)
        .bind(skip)
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        Ok(reviews)
    }

    /// Delete a review.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the review doesn't exist.
    pub async fn delete(&self, id: ReviewId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM reviews WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }
}
