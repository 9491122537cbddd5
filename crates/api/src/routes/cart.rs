//! Cart route handlers.
//!
//! The cart lives in the client; nothing here is persisted. This endpoint
//! prices a cart and flags items the caller already owns, so the frontend
//! can reconcile before checkout.

use axum::{Json, extract::State};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use pixelport_core::{GameId, Price};

use crate::error::Result;
use crate::middleware::OptionalUser;
use crate::services::commerce::CommerceService;
use crate::state::AppState;

/// A client-held cart: the list of game ids pending purchase.
#[derive(Debug, Deserialize)]
pub struct CartPayload {
    pub game_ids: Vec<GameId>,
}

/// One priced cart line.
#[derive(Debug, Serialize)]
pub struct CartLine {
    pub game_id: GameId,
    pub title: String,
    pub price: Price,
    /// Set when the (authenticated) caller already owns the game.
    pub already_owned: bool,
}

/// A stateless price quote for a client-held cart.
#[derive(Debug, Serialize)]
pub struct CartQuote {
    pub items: Vec<CartLine>,
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
}

/// Price a client-held cart.
///
/// Fails with the same availability errors checkout would, so a passing
/// validation means checkout will only be rejected by ownership races.
pub async fn validate(
    State(state): State<AppState>,
    OptionalUser(user): OptionalUser,
    Json(payload): Json<CartPayload>,
) -> Result<Json<CartQuote>> {
    let commerce = CommerceService::new(state.pool());
    let (games, totals) = commerce.quote(&payload.game_ids).await?;

    let owned = match &user {
        Some(user) => {
            let ids: Vec<GameId> = games.iter().map(|g| g.id).collect();
            commerce.owned(user, &ids).await?
        }
        None => Vec::new(),
    };

    let items = games
        .into_iter()
        .map(|g| CartLine {
            already_owned: owned.contains(&g.id),
            game_id: g.id,
            title: g.title,
            price: g.price,
        })
        .collect();

    Ok(Json(CartQuote {
        items,
        subtotal: totals.subtotal,
        tax: totals.tax,
        total: totals.total,
    }))
}
