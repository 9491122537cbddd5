//! Admin console route handlers.
//!
//! Every operation here requires the admin role, checked once by the
//! [`RequireAdmin`] extractor. Destructive operations write an audit record
//! (actor, action, target, timestamp) before answering.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};

use pixelport_core::{GameId, ListingStatus, UserId};

use crate::db::admin::{AdminGameRow, AdminRepository, AdminStats, AdminUserRow};
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::routes::Pagination;
use crate::state::AppState;

// =============================================================================
// Query / Response Types
// =============================================================================

/// User listing filters.
#[derive(Debug, Deserialize)]
pub struct UserListQuery {
    pub verified: Option<bool>,
}

/// Game listing filters.
#[derive(Debug, Deserialize)]
pub struct GameListQuery {
    pub status: Option<ListingStatus>,
    pub developer_id: Option<UserId>,
}

/// Flags for user deletion.
#[derive(Debug, Deserialize)]
pub struct DeleteUserQuery {
    /// Also delete the user's listings (default true).
    #[serde(default = "default_true")]
    pub delete_games: bool,
}

const fn default_true() -> bool {
    true
}

/// Threshold for pruning unverified accounts.
#[derive(Debug, Deserialize)]
pub struct PruneQuery {
    /// Minimum account age in days (default 30).
    #[serde(default = "default_prune_days")]
    pub dias: i64,
}

const fn default_prune_days() -> i64 {
    30
}

/// Outcome of a destructive operation.
#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub message: String,
    pub records_removed: u64,
}

// =============================================================================
// Handlers
// =============================================================================

/// System-wide counters.
pub async fn stats(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<AdminStats>> {
    let stats = AdminRepository::new(state.pool()).stats().await?;

    Ok(Json(stats))
}

/// Paginated user listing.
pub async fn list_users(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(query): Query<UserListQuery>,
    Query(page): Query<Pagination>,
) -> Result<Json<Vec<AdminUserRow>>> {
    let page = page.clamped();
    let rows = AdminRepository::new(state.pool())
        .list_users(page.skip, page.limit, query.verified)
        .await?;

    Ok(Json(rows))
}

/// Paginated game listing.
pub async fn list_games(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(query): Query<GameListQuery>,
    Query(page): Query<Pagination>,
) -> Result<Json<Vec<AdminGameRow>>> {
    let page = page.clamped();
    let rows = AdminRepository::new(state.pool())
        .list_games(page.skip, page.limit, query.status, query.developer_id)
        .await?;

    Ok(Json(rows))
}

/// Delete a listing and everything that references it.
pub async fn delete_game(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<GameId>,
) -> Result<Json<DeleteResponse>> {
    let repo = AdminRepository::new(state.pool());
    let removed = repo.delete_game(id).await?;

    repo.record_audit(admin.id, "delete_game", &format!("game:{id}")).await?;
    tracing::info!(actor = %admin.email, game_id = %id, removed, "listing deleted");

    Ok(Json(DeleteResponse {
        success: true,
        message: format!("Game {id} deleted."),
        records_removed: removed,
    }))
}

/// Delete a user account (optionally keeping their listings out of it).
pub async fn delete_user(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<UserId>,
    Query(query): Query<DeleteUserQuery>,
) -> Result<Json<DeleteResponse>> {
    if id == admin.id {
        return Err(AppError::Validation(
            "you cannot delete your own account".to_owned(),
        ));
    }

    let repo = AdminRepository::new(state.pool());
    let removed = repo.delete_user(id, query.delete_games).await?;

    repo.record_audit(admin.id, "delete_user", &format!("user:{id}")).await?;
    tracing::info!(actor = %admin.email, user_id = %id, removed, "user deleted");

    Ok(Json(DeleteResponse {
        success: true,
        message: format!("User {id} deleted."),
        records_removed: removed,
    }))
}

/// Delete a user's listings while preserving the account.
pub async fn delete_user_games(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<UserId>,
) -> Result<Json<DeleteResponse>> {
    let repo = AdminRepository::new(state.pool());
    let removed = repo.delete_user_games(id).await?;

    repo.record_audit(admin.id, "delete_user_games", &format!("user:{id}"))
        .await?;
    tracing::info!(actor = %admin.email, user_id = %id, removed, "user listings deleted");

    Ok(Json(DeleteResponse {
        success: true,
        message: format!("Listings of user {id} deleted."),
        records_removed: removed,
    }))
}

/// Bulk-delete unverified accounts older than the threshold.
pub async fn prune_unverified(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Query(query): Query<PruneQuery>,
) -> Result<Json<DeleteResponse>> {
    if query.dias < 0 {
        return Err(AppError::Validation("dias must be non-negative".to_owned()));
    }

    let cutoff = Utc::now() - Duration::days(query.dias);

    let repo = AdminRepository::new(state.pool());
    let removed = repo.prune_unverified(cutoff).await?;

    repo.record_audit(
        admin.id,
        "prune_unverified",
        &format!("older_than:{}d", query.dias),
    )
    .await?;
    tracing::info!(actor = %admin.email, days = query.dias, removed, "unverified accounts pruned");

    Ok(Json(DeleteResponse {
        success: true,
        message: format!("{removed} unverified accounts removed."),
        records_removed: removed,
    }))
}
