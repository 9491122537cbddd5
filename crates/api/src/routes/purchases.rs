//! Checkout and purchase history route handlers.

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};

use pixelport_core::GameId;

use crate::error::Result;
use crate::middleware::CurrentUser;
use crate::models::{Purchase, PurchaseItem};
use crate::services::commerce::CommerceService;
use crate::services::email::ReceiptLine;
use crate::state::AppState;

/// Checkout payload: the client-held cart plus a payment method label.
#[derive(Debug, Deserialize)]
pub struct CheckoutPayload {
    pub game_ids: Vec<GameId>,
    pub payment_method: String,
}

/// A receipt with its line items.
#[derive(Debug, Serialize)]
pub struct ReceiptResponse {
    #[serde(flatten)]
    pub purchase: Purchase,
    pub items: Vec<PurchaseItem>,
}

/// Process a checkout.
///
/// On success the receipt and entitlements are already committed; the
/// confirmation email is best-effort on top.
pub async fn checkout(
    State(state): State<AppState>,
    CurrentUser(buyer): CurrentUser,
    Json(payload): Json<CheckoutPayload>,
) -> Result<(StatusCode, Json<ReceiptResponse>)> {
    let (purchase, items) = CommerceService::new(state.pool())
        .checkout(&buyer, &payload.game_ids, &payload.payment_method)
        .await?;

    if let Some(email) = state.email() {
        let lines: Vec<ReceiptLine> = items
            .iter()
            .map(|item| ReceiptLine {
                title: item.title.clone(),
                price: item.price_paid.to_string(),
            })
            .collect();

        if let Err(e) = email
            .send_purchase_receipt(
                buyer.email.as_str(),
                &buyer.name,
                &purchase.order_number,
                &lines,
                &format!("{:.2}", purchase.total),
            )
            .await
        {
            tracing::warn!(error = %e, order = %purchase.order_number, "failed to send receipt");
        }
    }

    Ok((
        StatusCode::CREATED,
        Json(ReceiptResponse { purchase, items }),
    ))
}

/// The caller's purchase history, receipts with line items.
pub async fn history(
    State(state): State<AppState>,
    CurrentUser(buyer): CurrentUser,
) -> Result<Json<Vec<ReceiptResponse>>> {
    let (purchases, mut items) = CommerceService::new(state.pool()).history(&buyer).await?;

    let receipts = purchases
        .into_iter()
        .map(|purchase| {
            let (mine, rest): (Vec<PurchaseItem>, Vec<PurchaseItem>) = items
                .drain(..)
                .partition(|item| item.purchase_id == purchase.id);
            items = rest;
            ReceiptResponse {
                purchase,
                items: mine,
            }
        })
        .collect();

    Ok(Json(receipts))
}
