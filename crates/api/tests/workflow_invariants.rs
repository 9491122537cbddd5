//! Workflow invariant tests against a real `PostgreSQL` database.
//!
//! These tests require a database:
//!
//! ```bash
//! export TEST_DATABASE_URL=postgres://localhost/pixelport_test
//! cargo test -p pixelport-api -- --ignored
//! ```
//!
//! Each test creates its own users (unique emails) so the suite can run
//! repeatedly against the same database.

#![allow(clippy::unwrap_used)]

use rust_decimal::Decimal;
use secrecy::SecretString;
use sqlx::PgPool;
use uuid::Uuid;

use pixelport_api::db::users::UserRepository;
use pixelport_api::error::AppError;
use pixelport_api::models::User;
use pixelport_api::services::auth::AuthService;
use pixelport_api::services::commerce::CommerceService;
use pixelport_api::services::moderation::{ListingSubmission, ModerationService};
use pixelport_api::services::reviews::ReviewService;
use pixelport_core::{AccountRole, DownloadKind, GameId, ReviewDecision};

async fn test_pool() -> PgPool {
    let url = std::env::var("TEST_DATABASE_URL")
        .expect("TEST_DATABASE_URL must be set for ignored tests");
    let pool = pixelport_api::db::create_pool(&SecretString::from(url))
        .await
        .expect("failed to connect to test database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("failed to run migrations");

    pool
}

async fn make_user(pool: &PgPool, role: AccountRole) -> User {
    let suffix = Uuid::new_v4().simple().to_string();
    let email = format!("user-{suffix}@test.local");

    let (user, _token) = AuthService::new(pool)
        .register("Test User", &email, "hunter2hunter2", role)
        .await
        .expect("registration failed");

    UserRepository::new(pool)
        .set_verified(user.id)
        .await
        .expect("failed to verify");

    UserRepository::new(pool)
        .get_by_id(user.id)
        .await
        .unwrap()
        .unwrap()
}

fn submission(title: &str, price: &str) -> ListingSubmission {
    ListingSubmission {
        title: title.to_owned(),
        description: "A small game about light.".to_owned(),
        genre: "adventure".to_owned(),
        price: price.parse().unwrap(),
        requirements: None,
        cover_ref: "covers/test.png".to_owned(),
        screenshot_refs: vec!["shots/1.png".to_owned()],
        trailer_ref: None,
        download_kind: DownloadKind::File,
        build_ref: "builds/test.zip".to_owned(),
        size_mb: None,
    }
}

async fn approved_game(pool: &PgPool, developer: &User, admin: &User, price: &str) -> GameId {
    let moderation = ModerationService::new(pool);
    let game = moderation
        .submit(developer, submission(&format!("Game {}", Uuid::new_v4()), price))
        .await
        .unwrap();
    moderation
        .review(admin, game.id, ReviewDecision::Approve, None)
        .await
        .unwrap();
    game.id
}

#[tokio::test]
#[ignore = "requires PostgreSQL (TEST_DATABASE_URL)"]
async fn submit_approve_then_second_review_conflicts() {
    let pool = test_pool().await;
    let developer = make_user(&pool, AccountRole::Developer).await;
    let admin = make_user(&pool, AccountRole::Admin).await;
    let moderation = ModerationService::new(&pool);

    let game = moderation
        .submit(&developer, submission("Aurora", "99.00"))
        .await
        .unwrap();
    assert_eq!(game.status, pixelport_core::ListingStatus::Pending);

    let approved = moderation
        .review(&admin, game.id, ReviewDecision::Approve, None)
        .await
        .unwrap();
    assert_eq!(approved.status, pixelport_core::ListingStatus::Approved);

    // Second decision on the same listing must conflict.
    let err = moderation
        .review(&admin, game.id, ReviewDecision::Reject, Some("too late"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidState(_)));
}

#[tokio::test]
#[ignore = "requires PostgreSQL (TEST_DATABASE_URL)"]
async fn rejection_requires_reason_and_surfaces_it() {
    let pool = test_pool().await;
    let developer = make_user(&pool, AccountRole::Developer).await;
    let admin = make_user(&pool, AccountRole::Admin).await;
    let moderation = ModerationService::new(&pool);

    let game = moderation
        .submit(&developer, submission("Aurora", "99.00"))
        .await
        .unwrap();

    let err = moderation
        .review(&admin, game.id, ReviewDecision::Reject, None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let rejected = moderation
        .review(&admin, game.id, ReviewDecision::Reject, Some("Incomplete metadata"))
        .await
        .unwrap();
    assert_eq!(rejected.status, pixelport_core::ListingStatus::Rejected);
    assert_eq!(rejected.rejection_reason.as_deref(), Some("Incomplete metadata"));

    // Invisible to the public, visible to its owner.
    let detail_err = moderation.detail(game.id, None).await.unwrap_err();
    assert!(matches!(detail_err, AppError::NotAvailable(_)));
    let owner_view = moderation.detail(game.id, Some(&developer)).await.unwrap();
    assert_eq!(owner_view.id, game.id);
}

#[tokio::test]
#[ignore = "requires PostgreSQL (TEST_DATABASE_URL)"]
async fn checkout_records_exact_totals_and_frozen_price() {
    let pool = test_pool().await;
    let developer = make_user(&pool, AccountRole::Developer).await;
    let admin = make_user(&pool, AccountRole::Admin).await;
    let buyer = make_user(&pool, AccountRole::Buyer).await;

    let game_id = approved_game(&pool, &developer, &admin, "99.00").await;

    let commerce = CommerceService::new(&pool);
    let (purchase, items) = commerce
        .checkout(&buyer, &[game_id], "card")
        .await
        .unwrap();

    assert_eq!(purchase.subtotal, Decimal::new(9900, 2));
    assert_eq!(purchase.tax, Decimal::new(1584, 2));
    assert_eq!(purchase.total, Decimal::new(11484, 2));
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].price_paid.amount(), Decimal::new(9900, 2));

    // Repricing the listing must not touch the entitlement.
    sqlx::query("UPDATE games SET price = 1.00 WHERE id = $1")
        .bind(game_id)
        .execute(&pool)
        .await
        .unwrap();
    let (_, items_after) = commerce.history(&buyer).await.unwrap();
    assert_eq!(items_after[0].price_paid.amount(), Decimal::new(9900, 2));

    // A second checkout of the same game is rejected outright.
    let err = commerce.checkout(&buyer, &[game_id], "card").await.unwrap_err();
    assert!(matches!(err, AppError::AlreadyOwned(_)));
}

#[tokio::test]
#[ignore = "requires PostgreSQL (TEST_DATABASE_URL)"]
async fn checkout_aborts_whole_cart_when_one_game_is_owned() {
    let pool = test_pool().await;
    let developer = make_user(&pool, AccountRole::Developer).await;
    let admin = make_user(&pool, AccountRole::Admin).await;
    let buyer = make_user(&pool, AccountRole::Buyer).await;

    let owned = approved_game(&pool, &developer, &admin, "10.00").await;
    let fresh = approved_game(&pool, &developer, &admin, "20.00").await;

    let commerce = CommerceService::new(&pool);
    commerce.checkout(&buyer, &[owned], "card").await.unwrap();

    let err = commerce
        .checkout(&buyer, &[fresh, owned], "card")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::AlreadyOwned(_)));

    // No partial commit: the fresh game must still be unowned.
    let library = commerce.library(&buyer).await.unwrap();
    assert!(library.iter().all(|entry| entry.game_id != fresh));
}

#[tokio::test]
#[ignore = "requires PostgreSQL (TEST_DATABASE_URL)"]
async fn free_claim_is_idempotent() {
    let pool = test_pool().await;
    let developer = make_user(&pool, AccountRole::Developer).await;
    let admin = make_user(&pool, AccountRole::Admin).await;
    let buyer = make_user(&pool, AccountRole::Buyer).await;

    let game_id = approved_game(&pool, &developer, &admin, "0.00").await;

    let commerce = CommerceService::new(&pool);
    let first = commerce.claim_free(&buyer, game_id).await.unwrap();
    let second = commerce.claim_free(&buyer, game_id).await.unwrap();

    assert_eq!(first.id, second.id);
    assert!(first.price_paid.is_free());

    let library = commerce.library(&buyer).await.unwrap();
    assert_eq!(
        library.iter().filter(|e| e.game_id == game_id).count(),
        1
    );
}

#[tokio::test]
#[ignore = "requires PostgreSQL (TEST_DATABASE_URL)"]
async fn claiming_a_priced_game_is_rejected() {
    let pool = test_pool().await;
    let developer = make_user(&pool, AccountRole::Developer).await;
    let admin = make_user(&pool, AccountRole::Admin).await;
    let buyer = make_user(&pool, AccountRole::Buyer).await;

    let game_id = approved_game(&pool, &developer, &admin, "5.00").await;

    let err = CommerceService::new(&pool)
        .claim_free(&buyer, game_id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotAvailable(_)));
}

#[tokio::test]
#[ignore = "requires PostgreSQL (TEST_DATABASE_URL)"]
async fn reviews_require_entitlement_and_reject_duplicates() {
    let pool = test_pool().await;
    let developer = make_user(&pool, AccountRole::Developer).await;
    let admin = make_user(&pool, AccountRole::Admin).await;
    let owner = make_user(&pool, AccountRole::Buyer).await;
    let stranger = make_user(&pool, AccountRole::Buyer).await;

    let game_id = approved_game(&pool, &developer, &admin, "0.00").await;
    CommerceService::new(&pool)
        .claim_free(&owner, game_id)
        .await
        .unwrap();

    let reviews = ReviewService::new(&pool);

    // No entitlement, no review.
    let err = reviews
        .post(&stranger, game_id, 4, "looks nice")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    let review = reviews.post(&owner, game_id, 5, "lovely").await.unwrap();
    assert_eq!(review.rating, 5);

    // One review per (author, game).
    let err = reviews.post(&owner, game_id, 3, "again").await.unwrap_err();
    assert!(matches!(err, AppError::DuplicateReview));

    // Author can delete; a stranger cannot have (no review), admin path is
    // exercised by deleting the author's review as the admin.
    let err = reviews.delete(&stranger, review.id).await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));
    reviews.delete(&admin, review.id).await.unwrap();
}

#[tokio::test]
#[ignore = "requires PostgreSQL (TEST_DATABASE_URL)"]
async fn concurrent_free_claims_create_one_entitlement() {
    let pool = test_pool().await;
    let developer = make_user(&pool, AccountRole::Developer).await;
    let admin = make_user(&pool, AccountRole::Admin).await;
    let buyer = make_user(&pool, AccountRole::Buyer).await;

    let game_id = approved_game(&pool, &developer, &admin, "0.00").await;

    let mut handles = Vec::new();
    for _ in 0..8 {
        let pool = pool.clone();
        let buyer = buyer.clone();
        handles.push(tokio::spawn(async move {
            CommerceService::new(&pool).claim_free(&buyer, game_id).await
        }));
    }

    let mut ids = Vec::new();
    for handle in handles {
        let entitlement = handle.await.unwrap().unwrap();
        ids.push(entitlement.id);
    }

    ids.sort_by_key(|id| id.as_i32());
    ids.dedup();
    assert_eq!(ids.len(), 1, "all claims must resolve to one entitlement");
}
