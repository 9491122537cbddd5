//! Core types for Pixelport.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod price;
pub mod role;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use price::{CheckoutTotals, Price, PriceError, tax_rate};
pub use role::AccountRole;
pub use status::{DownloadKind, ListingStatus, ReviewDecision, TransitionError};
