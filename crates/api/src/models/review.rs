//! Buyer review model.

use chrono::{DateTime, Utc};
use serde::Serialize;

use pixelport_core::{GameId, ReviewId, UserId};

/// A buyer review of an owned game.
///
/// At most one per (author, game); only entitlement holders may post.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Review {
    /// Unique review ID.
    pub id: ReviewId,
    /// The reviewed game.
    pub game_id: GameId,
    /// The review author.
    pub author_id: UserId,
    /// Author display name (joined for list responses).
    pub author_name: String,
    /// Star rating, 1-5.
    pub rating: i32,
    /// Free-text body.
    pub body: String,
    /// When the review was posted.
    pub created_at: DateTime<Utc>,
}

/// Inclusive rating bounds.
pub const MIN_RATING: i32 = 1;
/// Inclusive rating bounds.
pub const MAX_RATING: i32 = 5;
