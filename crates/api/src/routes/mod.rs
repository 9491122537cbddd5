//! HTTP route handlers for the marketplace API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                         - Liveness check
//! GET  /health/ready                   - Readiness check (database ping)
//!
//! # Auth
//! POST /api/auth/registro              - Register (buyer or developer)
//! POST /api/auth/login                 - Login, mints a bearer token
//! POST /api/auth/logout                - Revoke the presented token
//! GET  /api/auth/perfil                - Current user profile
//! GET  /api/auth/verificar/{token}     - Verify email address
//! POST /api/auth/cambiar-password      - Change password
//! POST /api/auth/recuperar-password    - Request a password reset
//! POST /api/auth/resetear-password/{token} - Finish a password reset
//!
//! # Games
//! GET  /api/juegos/catalogo            - Public catalog (search/filter/sort)
//! GET  /api/juegos/mis-juegos          - Developer's own listings
//! GET  /api/juegos/admin/pendientes    - Review queue (admin)
//! POST /api/juegos/publicar            - Submit a listing (developer)
//! POST /api/juegos/archivos            - Upload an asset, returns reference (developer)
//! GET  /api/juegos/{id}                - Listing detail (visibility rules)
//! POST /api/juegos/{id}/aprobar        - Approve/reject a pending listing (admin)
//! POST /api/juegos/{id}/descargar-gratis - Claim a free game (idempotent)
//! GET  /api/juegos/{id}/resenas        - Reviews for a game
//! POST /api/juegos/{id}/resenas        - Post a review (entitlement required)
//! DELETE /api/resenas/{id}             - Delete a review (author or admin)
//!
//! # Cart & Commerce
//! POST /api/carrito/validar            - Price a client-held cart
//! POST /api/compras/procesar           - Checkout
//! GET  /api/compras/historial          - Receipts with line items
//!
//! # Library
//! GET  /api/biblioteca                 - Owned games
//! GET  /api/biblioteca/descargar/{juego_id} - Authorized download redirect
//!
//! # Admin console
//! GET    /api/admin/stats                       - System counters
//! GET    /api/admin/usuarios                    - Paginated users
//! GET    /api/admin/juegos                      - Paginated games
//! DELETE /api/admin/juego/{id}                  - Delete a listing
//! DELETE /api/admin/usuario/{id}                - Delete a user
//! DELETE /api/admin/usuario/{id}/juegos         - Delete a user's listings
//! DELETE /api/admin/usuarios/no-verificados     - Prune stale unverified accounts
//! ```

pub mod admin;
pub mod auth;
pub mod cart;
pub mod games;
pub mod library;
pub mod purchases;
pub mod reviews;

use axum::{
    Router,
    routing::{delete, get, post},
};
use serde::Deserialize;

use crate::state::AppState;

/// Generic success/message response.
#[derive(Debug, serde::Serialize)]
pub struct MessageResponse {
    pub message: String,
    pub success: bool,
}

impl MessageResponse {
    /// A successful message response.
    #[must_use]
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            success: true,
        }
    }
}

const fn default_limit() -> i64 {
    20
}

/// Common `skip`/`limit` pagination query parameters.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub skip: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

impl Pagination {
    /// Clamp to sane bounds: non-negative offset, 1..=100 page size.
    #[must_use]
    pub fn clamped(self) -> Self {
        Self {
            skip: self.skip.max(0),
            limit: self.limit.clamp(1, 100),
        }
    }
}

/// Assemble the full API router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/api/auth", auth_routes())
        .nest("/api/juegos", game_routes())
        .nest("/api/carrito", cart_routes())
        .nest("/api/compras", purchase_routes())
        .nest("/api/biblioteca", library_routes())
        .nest("/api/admin", admin_routes())
        .route("/api/resenas/{id}", delete(reviews::delete_review))
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/registro", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/perfil", get(auth::profile))
        .route("/verificar/{token}", get(auth::verify_email))
        .route("/cambiar-password", post(auth::change_password))
        .route("/recuperar-password", post(auth::request_password_reset))
        .route("/resetear-password/{token}", post(auth::reset_password))
}

/// Create the game routes router.
pub fn game_routes() -> Router<AppState> {
    Router::new()
        .route("/catalogo", get(games::catalog))
        .route("/mis-juegos", get(games::my_listings))
        .route("/admin/pendientes", get(games::pending))
        .route("/publicar", post(games::submit))
        .route("/archivos", post(games::upload_asset))
        .route("/{id}", get(games::detail))
        .route("/{id}/aprobar", post(games::review))
        .route("/{id}/descargar-gratis", post(games::claim_free))
        .route(
            "/{id}/resenas",
            get(reviews::list_for_game).post(reviews::post_review),
        )
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new().route("/validar", post(cart::validate))
}

/// Create the purchase routes router.
pub fn purchase_routes() -> Router<AppState> {
    Router::new()
        .route("/procesar", post(purchases::checkout))
        .route("/historial", get(purchases::history))
}

/// Create the library routes router.
pub fn library_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(library::list))
        .route("/descargar/{juego_id}", get(library::download))
}

/// Create the admin console router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/stats", get(admin::stats))
        .route("/usuarios", get(admin::list_users))
        .route("/juegos", get(admin::list_games))
        .route("/juego/{id}", delete(admin::delete_game))
        .route("/usuario/{id}", delete(admin::delete_user))
        .route("/usuario/{id}/juegos", delete(admin::delete_user_games))
        .route("/usuarios/no-verificados", delete(admin::prune_unverified))
}
