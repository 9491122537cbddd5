//! Game listing route handlers: catalog, submission, review decisions, and
//! free claims.

use axum::{
    Json,
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
};
use rust_decimal::Decimal;
use serde::Deserialize;

use pixelport_core::{GameId, ReviewDecision};

use crate::db::users::UserRepository;
use crate::error::{AppError, Result};
use crate::middleware::{CurrentUser, OptionalUser, RequireAdmin, RequireDeveloper};
use crate::models::{CatalogEntry, CatalogFilters, CatalogSort, Game, SortOrder};
use crate::models::Entitlement;
use crate::routes::Pagination;
use crate::services::assets::AssetKind;
use crate::services::commerce::CommerceService;
use crate::services::moderation::{ListingSubmission, ModerationService};
use crate::state::AppState;

// =============================================================================
// Query / Payload Types
// =============================================================================

/// Catalog query parameters.
#[derive(Debug, Deserialize)]
pub struct CatalogQuery {
    /// Case-insensitive match on title and description.
    pub search: Option<String>,
    pub genre: Option<String>,
    pub price_min: Option<Decimal>,
    pub price_max: Option<Decimal>,
    #[serde(default)]
    pub free_only: bool,
    #[serde(default)]
    pub sort: CatalogSort,
    #[serde(default)]
    pub order: SortOrder,
}

/// Review decision payload.
#[derive(Debug, Deserialize)]
pub struct DecisionPayload {
    pub decision: ReviewDecision,
    /// Required when rejecting; surfaced to the developer.
    pub reason: Option<String>,
}

/// Response for an asset upload.
#[derive(Debug, serde::Serialize)]
pub struct UploadResponse {
    pub reference: String,
    pub kind: &'static str,
}

// =============================================================================
// Handlers
// =============================================================================

/// The public catalog: approved listings only.
pub async fn catalog(
    State(state): State<AppState>,
    Query(query): Query<CatalogQuery>,
    Query(page): Query<Pagination>,
) -> Result<Json<Vec<CatalogEntry>>> {
    let page = page.clamped();
    let filters = CatalogFilters {
        search: query.search.filter(|s| !s.trim().is_empty()),
        genre: query.genre.filter(|g| !g.trim().is_empty()),
        price_min: query.price_min,
        price_max: query.price_max,
        free_only: query.free_only,
        sort: query.sort,
        order: query.order,
        skip: page.skip,
        limit: page.limit,
    };

    let entries = ModerationService::new(state.pool()).catalog(&filters).await?;

    Ok(Json(entries))
}

/// Listing detail; pending/rejected listings resolve only for their owner
/// and admins.
pub async fn detail(
    State(state): State<AppState>,
    OptionalUser(viewer): OptionalUser,
    Path(id): Path<GameId>,
) -> Result<Json<Game>> {
    let game = ModerationService::new(state.pool())
        .detail(id, viewer.as_ref())
        .await?;

    Ok(Json(game))
}

/// Submit a new listing (developer role). Starts pending.
pub async fn submit(
    State(state): State<AppState>,
    RequireDeveloper(developer): RequireDeveloper,
    Json(submission): Json<ListingSubmission>,
) -> Result<(StatusCode, Json<Game>)> {
    let game = ModerationService::new(state.pool())
        .submit(&developer, submission)
        .await?;

    Ok((StatusCode::CREATED, Json(game)))
}

/// Upload a media or build asset to the external store, returning the
/// opaque reference to embed in a submission.
pub async fn upload_asset(
    State(state): State<AppState>,
    RequireDeveloper(_developer): RequireDeveloper,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>> {
    let mut kind: Option<AssetKind> = None;
    let mut file: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(e.to_string()))?
    {
        let name = field.name().map(ToOwned::to_owned);
        match name.as_deref() {
            Some("kind") => {
                let label = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(e.to_string()))?;
                kind = Some(AssetKind::parse(&label).ok_or_else(|| {
                    AppError::Validation(format!("unknown asset kind: {label}"))
                })?);
            }
            Some("file") => {
                let filename = field
                    .file_name()
                    .unwrap_or("upload.bin")
                    .to_owned();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(e.to_string()))?;
                file = Some((filename, bytes.to_vec()));
            }
            _ => {}
        }
    }

    let kind = kind.ok_or_else(|| AppError::Validation("an asset kind is required".to_owned()))?;
    let (filename, bytes) =
        file.ok_or_else(|| AppError::Validation("a file is required".to_owned()))?;

    let reference = state.assets().store(bytes, kind, &filename).await?;

    Ok(Json(UploadResponse {
        reference,
        kind: kind.as_str(),
    }))
}

/// The developer's own listings, any status.
pub async fn my_listings(
    State(state): State<AppState>,
    RequireDeveloper(developer): RequireDeveloper,
) -> Result<Json<Vec<Game>>> {
    let games = ModerationService::new(state.pool())
        .listings_of(developer.id)
        .await?;

    Ok(Json(games))
}

/// The admin review queue: all pending listings.
pub async fn pending(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<Vec<Game>>> {
    let games = ModerationService::new(state.pool()).pending().await?;

    Ok(Json(games))
}

/// Apply a review decision to a pending listing (admin role), then notify
/// the developer by email, best-effort.
pub async fn review(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<GameId>,
    Json(payload): Json<DecisionPayload>,
) -> Result<Json<Game>> {
    let game = ModerationService::new(state.pool())
        .review(&admin, id, payload.decision, payload.reason.as_deref())
        .await?;

    if let Some(email) = state.email() {
        let developer = UserRepository::new(state.pool())
            .get_by_id(game.developer_id)
            .await?;

        if let Some(developer) = developer {
            let sent = match payload.decision {
                ReviewDecision::Approve => {
                    email
                        .send_listing_approved(
                            developer.email.as_str(),
                            &developer.name,
                            &game.title,
                        )
                        .await
                }
                ReviewDecision::Reject => {
                    email
                        .send_listing_rejected(
                            developer.email.as_str(),
                            &developer.name,
                            &game.title,
                            game.rejection_reason.as_deref().unwrap_or_default(),
                        )
                        .await
                }
            };

            if let Err(e) = sent {
                tracing::warn!(error = %e, game_id = %game.id, "failed to send decision email");
            }
        }
    }

    Ok(Json(game))
}

/// Claim a free game into the caller's library. Idempotent.
pub async fn claim_free(
    State(state): State<AppState>,
    CurrentUser(buyer): CurrentUser,
    Path(id): Path<GameId>,
) -> Result<Json<Entitlement>> {
    let entitlement = CommerceService::new(state.pool())
        .claim_free(&buyer, id)
        .await?;

    Ok(Json(entitlement))
}
