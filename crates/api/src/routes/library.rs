//! Library and download route handlers.

use axum::{
    Json,
    extract::{Path, State},
    response::Redirect,
};

use pixelport_core::GameId;

use crate::error::Result;
use crate::middleware::CurrentUser;
use crate::models::LibraryEntry;
use crate::services::commerce::CommerceService;
use crate::state::AppState;

/// The caller's library: every owned game.
pub async fn list(
    State(state): State<AppState>,
    CurrentUser(buyer): CurrentUser,
) -> Result<Json<Vec<LibraryEntry>>> {
    let entries = CommerceService::new(state.pool()).library(&buyer).await?;

    Ok(Json(entries))
}

/// Download an owned game.
///
/// Authorizes via the entitlement, logs the download, then redirects to a
/// signed asset store URL (uploaded builds) or the external link.
pub async fn download(
    State(state): State<AppState>,
    CurrentUser(buyer): CurrentUser,
    Path(game_id): Path<GameId>,
) -> Result<Redirect> {
    let target = CommerceService::new(state.pool())
        .download(&buyer, game_id, state.assets())
        .await?;

    tracing::info!(user = %buyer.email, game_id = %game_id, title = %target.title, "download");

    Ok(Redirect::temporary(target.url.as_str()))
}
