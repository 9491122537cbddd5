//! Review route handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;

use pixelport_core::{GameId, ReviewId};

use crate::db::admin::AdminRepository;
use crate::error::Result;
use crate::middleware::CurrentUser;
use crate::models::Review;
use crate::routes::{MessageResponse, Pagination};
use crate::services::reviews::ReviewService;
use crate::state::AppState;

/// Review submission payload.
#[derive(Debug, Deserialize)]
pub struct ReviewPayload {
    pub rating: i32,
    pub body: String,
}

/// Reviews for a game, newest first.
pub async fn list_for_game(
    State(state): State<AppState>,
    Path(game_id): Path<GameId>,
    Query(page): Query<Pagination>,
) -> Result<Json<Vec<Review>>> {
    let page = page.clamped();
    let reviews = ReviewService::new(state.pool())
        .list(game_id, page.skip, page.limit)
        .await?;

    Ok(Json(reviews))
}

/// Post a review for an owned game.
pub async fn post_review(
    State(state): State<AppState>,
    CurrentUser(author): CurrentUser,
    Path(game_id): Path<GameId>,
    Json(payload): Json<ReviewPayload>,
) -> Result<(StatusCode, Json<Review>)> {
    let review = ReviewService::new(state.pool())
        .post(&author, game_id, payload.rating, &payload.body)
        .await?;

    Ok((StatusCode::CREATED, Json(review)))
}

/// Delete a review (author or admin).
pub async fn delete_review(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(review_id): Path<ReviewId>,
) -> Result<Json<MessageResponse>> {
    let review = ReviewService::new(state.pool())
        .delete(&actor, review_id)
        .await?;

    // Moderation deletions (not the author cleaning up after themselves)
    // land in the audit trail.
    if review.author_id != actor.id {
        AdminRepository::new(state.pool())
            .record_audit(actor.id, "delete_review", &format!("review:{review_id}"))
            .await?;
        tracing::info!(actor = %actor.email, review = %review_id, "review removed by admin");
    }

    Ok(Json(MessageResponse::ok("Review deleted.")))
}
