//! Game listing model and catalog query types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use pixelport_core::{DownloadKind, GameId, ListingStatus, Price, UserId};

/// A game listing with its approval lifecycle.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Game {
    /// Unique listing ID.
    pub id: GameId,
    /// The developer who submitted the listing.
    pub developer_id: UserId,
    /// Title.
    pub title: String,
    /// Long description.
    pub description: String,
    /// Genre label used for catalog filtering.
    pub genre: String,
    /// Listing price; zero means free.
    pub price: Price,
    /// Optional system requirements text.
    pub requirements: Option<String>,
    /// Cover image reference in the asset store.
    pub cover_ref: String,
    /// Screenshot references in the asset store.
    pub screenshot_refs: Vec<String>,
    /// Optional trailer reference.
    pub trailer_ref: Option<String>,
    /// How the build is delivered.
    pub download_kind: DownloadKind,
    /// Build reference: asset store reference or external URL.
    pub build_ref: String,
    /// Approximate build size in megabytes.
    pub size_mb: Option<Decimal>,
    /// Lifecycle state.
    pub status: ListingStatus,
    /// Admin who reviewed the listing, once decided.
    pub reviewed_by: Option<UserId>,
    /// When the review decision was made.
    pub reviewed_at: Option<DateTime<Utc>>,
    /// Reason for rejection; present only when rejected.
    pub rejection_reason: Option<String>,
    /// When the listing was submitted.
    pub created_at: DateTime<Utc>,
    /// When the listing was last updated.
    pub updated_at: Option<DateTime<Utc>>,
}

impl Game {
    /// Whether `viewer` may see this listing.
    ///
    /// Approved listings are public; pending and rejected listings are
    /// visible only to their owning developer and to admins.
    #[must_use]
    pub fn visible_to(&self, viewer: Option<&crate::models::User>) -> bool {
        if self.status == ListingStatus::Approved {
            return true;
        }
        viewer.is_some_and(|u| u.role.is_admin() || u.id == self.developer_id)
    }
}

/// Fields required to submit a new listing.
#[derive(Debug, Clone)]
pub struct NewGame {
    pub developer_id: UserId,
    pub title: String,
    pub description: String,
    pub genre: String,
    pub price: Price,
    pub requirements: Option<String>,
    pub cover_ref: String,
    pub screenshot_refs: Vec<String>,
    pub trailer_ref: Option<String>,
    pub download_kind: DownloadKind,
    pub build_ref: String,
    pub size_mb: Option<Decimal>,
}

/// A catalog row: public listing fields plus the on-read aggregate rating.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CatalogEntry {
    pub id: GameId,
    pub title: String,
    pub genre: String,
    pub price: Price,
    pub cover_ref: String,
    pub developer_name: String,
    pub created_at: DateTime<Utc>,
    /// Mean review rating rounded to one decimal; `None` when unreviewed.
    pub rating: Option<Decimal>,
    /// Number of reviews backing the rating.
    pub review_count: i64,
}

/// Sort key for the catalog query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogSort {
    #[default]
    CreatedAt,
    Price,
    Rating,
}

impl CatalogSort {
    /// The SQL expression this sort key orders by.
    ///
    /// Closed set; never interpolate user input into ORDER BY.
    #[must_use]
    pub const fn sql_expr(self) -> &'static str {
        match self {
            Self::CreatedAt => "g.created_at",
            Self::Price => "g.price",
            Self::Rating => "rating",
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    #[must_use]
    pub const fn sql_keyword(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Filters for the public catalog query.
#[derive(Debug, Clone, Default)]
pub struct CatalogFilters {
    /// Case-insensitive match against title and description.
    pub search: Option<String>,
    /// Exact genre match.
    pub genre: Option<String>,
    /// Minimum price, inclusive.
    pub price_min: Option<Decimal>,
    /// Maximum price, inclusive.
    pub price_max: Option<Decimal>,
    /// Only free games.
    pub free_only: bool,
    /// Sort key.
    pub sort: CatalogSort,
    /// Sort direction.
    pub order: SortOrder,
    /// Rows to skip.
    pub skip: i64,
    /// Page size.
    pub limit: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_keys_are_closed() {
        assert_eq!(CatalogSort::CreatedAt.sql_expr(), "g.created_at");
        assert_eq!(CatalogSort::Price.sql_expr(), "g.price");
        assert_eq!(CatalogSort::Rating.sql_expr(), "rating");
        assert_eq!(SortOrder::Asc.sql_keyword(), "ASC");
        assert_eq!(SortOrder::Desc.sql_keyword(), "DESC");
    }
}
