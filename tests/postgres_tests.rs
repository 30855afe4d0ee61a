//! Integration tests for the PostgreSQL storage backend.
//!
//! # Requirements
//!
//! - Docker must be running (testcontainers launches a PostgreSQL container)
//! - Feature flag `postgres` must be enabled
//!
//! # Running
//!
//! ```sh
//! cargo test --features postgres --test postgres_tests -- --test-threads=1
//! ```
//!
//! # Test isolation
//!
//! All tests share a single PostgreSQL container (via `OnceLock`). Each test
//! creates a fresh `PgPool` and truncates tables before running.

#![cfg(feature = "postgres")]

use chrono::{Duration, Utc};
use donation::core::donation::NewDonationRequest;
use donation::core::query::{DonationFilter, PageRequest};
use donation::prelude::*;
use donation::storage::ensure_schema;
use serde_json::json;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::sync::{Arc, OnceLock};
use testcontainers::runners::AsyncRunner;
use testcontainers_modules::postgres::Postgres;

// ---------------------------------------------------------------------------
// Shared test environment (single container, fresh pool per test)
// ---------------------------------------------------------------------------

/// Holds the testcontainer handle (keeps it alive) and the connection URL.
struct PgTestEnv {
    _container: testcontainers::ContainerAsync<Postgres>,
    connection_url: String,
}

/// Global test environment, initialized once per test binary.
static TEST_ENV: OnceLock<PgTestEnv> = OnceLock::new();

async fn init_pg_env() -> &'static PgTestEnv {
    if let Some(env) = TEST_ENV.get() {
        return env;
    }

    let container = Postgres::default()
        .start()
        .await
        .expect("Failed to start PostgreSQL container — is Docker running?");

    let host = container.get_host().await.unwrap();
    let port = container.get_host_port_ipv4(5432).await.unwrap();
    let url = format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

    let pool = PgPool::connect(&url)
        .await
        .expect("Failed to connect to PostgreSQL");
    ensure_schema(&pool).await.expect("Failed to apply schema");
    pool.close().await;

    let _ = TEST_ENV.set(PgTestEnv {
        _container: container,
        connection_url: url,
    });
    TEST_ENV.get().unwrap()
}

/// Create a fresh pool with empty tables
async fn clean_pool() -> PgPool {
    let env = init_pg_env().await;
    let pool = PgPoolOptions::new()
        .max_connections(4)
        .acquire_timeout(std::time::Duration::from_secs(30))
        .connect(&env.connection_url)
        .await
        .expect("Failed to connect to PostgreSQL");

    sqlx::query("TRUNCATE donation_requests, products, categories")
        .execute(&pool)
        .await
        .expect("Failed to truncate tables");
    pool
}

fn request(owner: Uuid, organ: &str) -> DonationRequest {
    DonationRequest::pending(
        NewDonationRequest {
            organ_name: organ.to_string(),
            category: Uuid::new_v4(),
            images: vec!["img1.png".to_string()],
            pin_code: 560001,
            description: "Healthy kidney donor, tested".to_string(),
            quantity: 1,
        },
        owner,
    )
}

// ---------------------------------------------------------------------------
// Store contract
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_insert_and_get_roundtrip() {
    let store = PostgresDonationStore::new(clean_pool().await);
    let created = store.insert(request(Uuid::new_v4(), "Kidney")).await.unwrap();

    let fetched = store.get(&created.id).await.unwrap().unwrap();
    assert_eq!(fetched.id, created.id);
    assert_eq!(fetched.organ_name, "Kidney");
    assert_eq!(fetched.status, DonationStatus::Pending);
    assert_eq!(fetched.images, created.images);
    assert!(store.get(&Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn test_unique_index_rejects_second_pending() {
    let store = PostgresDonationStore::new(clean_pool().await);
    let owner = Uuid::new_v4();
    let first = store.insert(request(owner, "Kidney")).await.unwrap();

    let err = store.insert(request(owner, "Kidney")).await.unwrap_err();
    assert!(matches!(err, DonationError::DuplicateRequest { .. }));

    // A decided request no longer blocks a new submission
    store
        .transition(
            &first.id,
            &Transition::reject(Uuid::new_v4(), "Records incomplete".to_string(), None),
        )
        .await
        .unwrap();
    store.insert(request(owner, "Kidney")).await.unwrap();
}

#[tokio::test]
async fn test_conditional_transition() {
    let store = PostgresDonationStore::new(clean_pool().await);
    let created = store.insert(request(Uuid::new_v4(), "Kidney")).await.unwrap();
    let admin = Uuid::new_v4();

    let approved = store
        .transition(&created.id, &Transition::approve(admin, Some("verified".to_string())))
        .await
        .unwrap();
    assert_eq!(approved.status, DonationStatus::Approved);
    assert_eq!(approved.approved_by, Some(admin));
    assert_eq!(approved.admin_notes.as_deref(), Some("verified"));

    let err = store
        .transition(&created.id, &Transition::approve(admin, None))
        .await
        .unwrap_err();
    assert!(matches!(err, DonationError::InvalidState { status: DonationStatus::Approved, .. }));

    let err = store
        .transition(&Uuid::new_v4(), &Transition::approve(admin, None))
        .await
        .unwrap_err();
    assert!(matches!(err, DonationError::NotFound { .. }));
}

#[tokio::test]
async fn test_list_filters_and_pages() {
    let store = PostgresDonationStore::new(clean_pool().await);
    let owner = Uuid::new_v4();
    let base = Utc::now();
    for i in 0..25 {
        let mut r = request(owner, &format!("Organ {:02}", i));
        r.created_at = base + Duration::seconds(i);
        store.insert(r).await.unwrap();
    }
    let mut liver = request(Uuid::new_v4(), "Liver_100%");
    liver.created_at = base - Duration::hours(1);
    store.insert(liver).await.unwrap();

    let (page, total) = store
        .list(&DonationFilter::default(), PageRequest::new(2, 10))
        .await
        .unwrap();
    assert_eq!(total, 26);
    assert_eq!(page.len(), 10);
    assert_eq!(page[0].organ_name, "Organ 14");

    let mine = DonationFilter {
        requested_by: Some(owner),
        ..DonationFilter::default()
    };
    let (_, total) = store.list(&mine, PageRequest::new(1, 10)).await.unwrap();
    assert_eq!(total, 25);

    // LIKE metacharacters in the search term match literally
    let search = DonationFilter {
        search: Some("r_100%".to_string()),
        ..DonationFilter::default()
    };
    let (found, total) = store.list(&search, PageRequest::new(1, 10)).await.unwrap();
    assert_eq!(total, 1);
    assert_eq!(found[0].organ_name, "Liver_100%");
}

// ---------------------------------------------------------------------------
// Catalog + workflow
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_workflow_on_postgres() {
    let pool = clean_pool().await;
    let catalog = PostgresCatalog::new(pool.clone());
    let category = Category {
        id: Uuid::new_v4(),
        name: "Kidney".to_string(),
        description: None,
    };
    catalog.upsert_category(&category).await.unwrap();

    let workflow = DonationWorkflow::new(
        Arc::new(PostgresDonationStore::new(pool.clone())),
        Arc::new(catalog.clone()),
    );
    let user = Identity::user(Uuid::new_v4());
    let admin = Identity::admin(Uuid::new_v4());

    let draft: DonationDraft = serde_json::from_value(json!({
        "organName": "Kidney",
        "category": category.id,
        "images": ["img1.png"],
        "pinCode": 560001,
        "description": "Healthy kidney donor, tested"
    }))
    .unwrap();
    let created = workflow.create(&user, draft).await.unwrap();

    let outcome = workflow
        .approve(&admin, &created.id, Some("verified".to_string()))
        .await
        .unwrap();
    assert_eq!(outcome.request.status, DonationStatus::Approved);
    assert_eq!(outcome.product.price, 0);
    assert!(outcome.product.is_donated);

    // Listing the same donation again hands back the existing product
    let again = catalog
        .create_product(NewProduct::from_donation(&created))
        .await
        .unwrap();
    assert_eq!(again.id, outcome.product.id);

    let listed = catalog
        .find_product_by_donation(&created.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(listed.id, outcome.product.id);
}
