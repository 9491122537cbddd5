//! Purchase receipts, entitlements, and library entries.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use pixelport_core::{DownloadKind, EntitlementId, GameId, Price, PurchaseId, UserId};

/// A checkout receipt.
///
/// Immutable once written; the totals recorded here never change when the
/// underlying listings are repriced.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Purchase {
    /// Unique receipt ID.
    pub id: PurchaseId,
    /// The buyer.
    pub buyer_id: UserId,
    /// Human-facing order number (`PX-...`).
    pub order_number: String,
    /// Payment method label (simulated; no settlement).
    pub payment_method: String,
    /// Sum of listing prices at purchase time.
    pub subtotal: Decimal,
    /// Flat 16% tax on the subtotal.
    pub tax: Decimal,
    /// `subtotal + tax`.
    pub total: Decimal,
    /// When the purchase was made.
    pub created_at: DateTime<Utc>,
}

/// A single line of a receipt, with the price frozen at purchase time.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct PurchaseItem {
    pub purchase_id: PurchaseId,
    pub game_id: GameId,
    pub title: String,
    pub price_paid: Price,
}

/// Durable proof that a buyer may download a game.
///
/// Created at checkout or free-claim time; at most one per (buyer, game).
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Entitlement {
    /// Unique entitlement ID.
    pub id: EntitlementId,
    /// The owning buyer.
    pub buyer_id: UserId,
    /// The owned game.
    pub game_id: GameId,
    /// The receipt this entitlement came from; `None` for free claims.
    pub purchase_id: Option<PurchaseId>,
    /// Listing price frozen at purchase time; zero for free claims.
    pub price_paid: Price,
    /// When the entitlement was granted.
    pub created_at: DateTime<Utc>,
}

/// An entitlement joined with the listing it grants access to.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct LibraryEntry {
    pub entitlement_id: EntitlementId,
    pub game_id: GameId,
    pub title: String,
    pub genre: String,
    pub cover_ref: String,
    pub developer_name: String,
    pub download_kind: DownloadKind,
    pub price_paid: Price,
    pub acquired_at: DateTime<Utc>,
}
