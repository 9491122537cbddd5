//! Game listing repository.
//!
//! The catalog query recomputes the aggregate rating on every read (mean of
//! review ratings, one decimal); nothing rating-related is stored on the
//! listing row.

use sqlx::{PgPool, Postgres, QueryBuilder};

use pixelport_core::{GameId, ListingStatus, UserId};

use super::RepositoryError;
use crate::models::{CatalogEntry, CatalogFilters, Game, NewGame};

const GAME_COLUMNS: &str = "id, developer_id, title, description, genre, price, requirements, \
     cover_ref, screenshot_refs, trailer_ref, download_kind, build_ref, size_mb, \
     status, reviewed_by, reviewed_at, rejection_reason, created_at, updated_at";

/// Repository for game listing operations.
pub struct GameRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> GameRepository<'a> {
    /// Create a new game repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new listing in `Pending` state.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, new_game: &NewGame) -> Result<Game, RepositoryError> {
        let game = sqlx::query_as::<_, Game>(&format!(
            "INSERT INTO games (developer_id, title, description, genre, price, requirements,
                                cover_ref, screenshot_refs, trailer_ref, download_kind,
                                build_ref, size_mb)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
             RETURNING {GAME_COLUMNS}"
        ))
        .bind(new_game.developer_id)
        .bind(&new_game.title)
        .bind(&new_game.description)
        .bind(&new_game.genre)
        .bind(new_game.price)
        .bind(&new_game.requirements)
        .bind(&new_game.cover_ref)
        .bind(&new_game.screenshot_refs)
        .bind(&new_game.trailer_ref)
        .bind(new_game.download_kind)
        .bind(&new_game.build_ref)
        .bind(new_game.size_mb)
        .fetch_one(self.pool)
        .await?;

        Ok(game)
    }

    /// Get a listing by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: GameId) -> Result<Option<Game>, RepositoryError> {
        let game =
            sqlx::query_as::<_, Game>(&format!("SELECT {GAME_COLUMNS} FROM games WHERE id = $1"))
                .bind(id)
                .fetch_optional(self.pool)
                .await?;

        Ok(game)
    }

    /// Fetch several listings by ID (order unspecified).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn fetch_many(&self, ids: &[GameId]) -> Result<Vec<Game>, RepositoryError> {
        let raw_ids: Vec<i32> = ids.iter().map(GameId::as_i32).collect();
        let games = sqlx::query_as::<_, Game>(&format!(
            "SELECT {GAME_COLUMNS} FROM games WHERE id = ANY($1)"
        ))
        .bind(&raw_ids)
        .fetch_all(self.pool)
        .await?;

        Ok(games)
    }

    /// Record a review decision, guarded on the listing still being pending.
    ///
    /// The `status = 'pending'` guard makes the transition race-safe: of two
    /// concurrent reviews, exactly one sees a row. Returns `None` when the
    /// listing was not pending (or does not exist) at update time.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn record_decision(
        &self,
        id: GameId,
        status: ListingStatus,
        reviewed_by: UserId,
        rejection_reason: Option<&str>,
    ) -> Result<Option<Game>, RepositoryError> {
        let game = sqlx::query_as::<_, Game>(&format!(
            "UPDATE games
             SET status = $2, reviewed_by = $3, reviewed_at = now(),
                 rejection_reason = $4, updated_at = now()
             WHERE id = $1 AND status = 'pending'
             RETURNING {GAME_COLUMNS}"
        ))
        .bind(id)
        .bind(status)
        .bind(reviewed_by)
        .bind(rejection_reason)
        .fetch_optional(self.pool)
        .await?;

        Ok(game)
    }

    /// All pending listings, oldest first (the admin review queue).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_pending(&self) -> Result<Vec<Game>, RepositoryError> {
        let games = sqlx::query_as::<_, Game>(&format!(
            "SELECT {GAME_COLUMNS} FROM games WHERE status = 'pending' ORDER BY created_at ASC"
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(games)
    }

    /// All listings owned by a developer, regardless of status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_by_developer(
        &self,
        developer_id: UserId,
    ) -> Result<Vec<Game>, RepositoryError> {
        let games = sqlx::query_as::<_, Game>(&format!(
            "SELECT {GAME_COLUMNS} FROM games WHERE developer_id = $1 ORDER BY created_at DESC"
        ))
        .bind(developer_id)
        .fetch_all(self.pool)
        .await?;

        Ok(games)
    }

    /// The public catalog: approved listings only, with filters, sorting,
    /// pagination, and the on-read aggregate rating.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_catalog(
        &self,
        filters: &CatalogFilters,
    ) -> Result<Vec<CatalogEntry>, RepositoryError> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
            "SELECT g.id, g.title, g.genre, g.price, g.cover_ref,
                    u.name AS developer_name, g.created_at,
                    ROUND(AVG(r.rating), 1) AS rating,
                    COUNT(r.id) AS review_count
             FROM games g
             JOIN users u ON u.id = g.developer_id
             LEFT JOIN reviews r ON r.game_id = g.id
             WHERE g.status = ",
        );
        qb.push_bind(ListingStatus::Approved);

        if let Some(search) = &filters.search {
            let pattern = format!("%{search}%");
            qb.push(" AND (g.title ILIKE ");
            qb.push_bind(pattern.clone());
            qb.push(" OR g.description ILIKE ");
            qb.push_bind(pattern);
            qb.push(")");
        }

        if let Some(genre) = &filters.genre {
            qb.push(" AND g.genre = ");
            qb.push_bind(genre.clone());
        }

        if let Some(min) = filters.price_min {
            qb.push(" AND g.price >= ");
            qb.push_bind(min);
        }

        if let Some(max) = filters.price_max {
            qb.push(" AND g.price <= ");
            qb.push_bind(max);
        }

        if filters.free_only {
            qb.push(" AND g.price = 0");
        }

        qb.push(" GROUP BY g.id, u.name");

        // Sort key and direction come from closed enums, never user strings.
        qb.push(" ORDER BY ");
        qb.push(filters.sort.sql_expr());
        qb.push(" ");
        qb.push(filters.order.sql_keyword());
        qb.push(" NULLS LAST, g.id DESC");

        qb.push(" OFFSET ");
        qb.push_bind(filters.skip);
        qb.push(" LIMIT ");
        qb.push_bind(filters.limit);

        let entries = qb
            .build_query_as::<CatalogEntry>()
            .fetch_all(self.pool)
            .await?;

        Ok(entries)
    }
}
