//! Request middleware and extractors.

pub mod auth;
pub mod request_id;

pub use auth::{CurrentUser, OptionalUser, RequireAdmin, RequireDeveloper, bearer_token};
pub use request_id::request_id_middleware;
