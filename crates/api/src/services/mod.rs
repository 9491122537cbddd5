//! Business workflows and external collaborators.
//!
//! - [`auth`] - registration, login, bearer tokens, verification, resets
//! - [`moderation`] - listing submission and the approve/reject workflow
//! - [`commerce`] - checkout, free claims, library, download authorization
//! - [`reviews`] - buyer reviews over owned games
//! - [`email`] - SMTP notifications (best-effort)
//! - [`assets`] - external blob store client and signed download URLs

pub mod assets;
pub mod auth;
pub mod commerce;
pub mod email;
pub mod moderation;
pub mod reviews;
