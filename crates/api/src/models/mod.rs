//! Domain models for the marketplace.

pub mod game;
pub mod purchase;
pub mod review;
pub mod user;

pub use game::{CatalogEntry, CatalogFilters, CatalogSort, Game, NewGame, SortOrder};
pub use purchase::{Entitlement, LibraryEntry, Purchase, PurchaseItem};
pub use review::Review;
pub use user::User;
