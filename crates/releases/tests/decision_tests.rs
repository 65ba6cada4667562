use common::Principal;
use common::settings::{ObjectStorage, Releases};
use data::bundle::{Bundle, CreateBundleRequest};
use releases::{BundleSequencer, UpdateDecisionEngine};
use repos::{Repo, bundle::BundleRepo};
use sqlx::{Pool, Postgres};
use testware::{TEST_PUBLIC_BASE_URL, setup_test_dependencies};
use uuid::Uuid;

async fn push(pool: &Pool<Postgres>, app_version: &str, hash: &str) -> Bundle {
    BundleSequencer::new(Repo::new(pool.clone()), &Releases::default())
        .create_new_bundle(
            &CreateBundleRequest {
                app_name: "demo".to_string(),
                environment: "dev".to_string(),
                download_file: format!("bundles/{hash}.zip"),
                description: format!("release {hash}"),
                app_version: app_version.to_string(),
                size: 2048,
                hash: hash.to_string(),
            },
            &Principal::new(Uuid::new_v4(), "ci".to_string(), None),
        )
        .await
        .expect("push")
}

fn engine(pool: &Pool<Postgres>) -> UpdateDecisionEngine {
    UpdateDecisionEngine::new(
        Repo::new(pool.clone()),
        &ObjectStorage {
            public_base_url: TEST_PUBLIC_BASE_URL.to_string(),
            ..Default::default()
        },
    )
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_bundle_update_for_stale_hash(pool: Pool<Postgres>) {
    let (_, env) = setup_test_dependencies(&pool).await;
    push(&pool, "1.0.0", "h1").await;
    let current = push(&pool, "1.0.0", "h2").await;

    let info = engine(&pool)
        .check_update(&env.key, "1.0.0", "h1")
        .await
        .expect("update");

    assert_eq!(info.download_url, "https://cdn.example.com/ota/bundles/h2.zip");
    assert_eq!(info.label, current.label);
    assert_eq!(info.package_hash, "h2");
    assert_eq!(info.package_size, 2048);
    assert_eq!(info.description, "release h2");
    assert!(info.is_available);
    assert!(!info.update_app_version);
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_matching_hash_gets_nothing(pool: Pool<Postgres>) {
    let (_, env) = setup_test_dependencies(&pool).await;
    push(&pool, "1.0.0", "h1").await;

    let info = engine(&pool).check_update(&env.key, "1.0.0", "h1").await;
    assert!(info.is_none());
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_older_client_gets_native_upgrade_signal(pool: Pool<Postgres>) {
    let (_, env) = setup_test_dependencies(&pool).await;
    push(&pool, "1.2.0", "h1").await;
    push(&pool, "1.10.0", "h2").await;

    let info = engine(&pool)
        .check_update(&env.key, "1.2.0", "h1")
        .await
        .expect("native upgrade");
    assert!(info.update_app_version);
    assert_eq!(info.target_binary_range, "1.10.0");
    assert!(info.download_url.is_empty());

    let info = engine(&pool).check_update(&env.key, "1.10.0", "h2").await;
    assert!(info.is_none());
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_invalidated_bundle_is_offered_disabled(pool: Pool<Postgres>) {
    let (_, env) = setup_test_dependencies(&pool).await;
    push(&pool, "1.0.0", "h1").await;
    let current = push(&pool, "1.0.0", "h2").await;
    BundleRepo::toggle_valid(&pool, current.id)
        .await
        .expect("toggle");

    let info = engine(&pool)
        .check_update(&env.key, "1.0.0", "h1")
        .await
        .expect("update");
    assert!(info.is_disabled);
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_unknown_inputs_get_nothing(pool: Pool<Postgres>) {
    let (_, env) = setup_test_dependencies(&pool).await;
    push(&pool, "1.0.0", "h1").await;
    let engine = engine(&pool);

    assert!(engine.check_update("unknown", "1.0.0", "h0").await.is_none());
    assert!(engine.check_update(&env.key, "3.0.0", "h0").await.is_none());
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_release_line_without_current_gets_nothing(pool: Pool<Postgres>) {
    let (_, env) = setup_test_dependencies(&pool).await;
    let bundle = push(&pool, "1.0.0", "h1").await;
    repos::version::VersionRepo::update_current_bundle(&pool, bundle.version_id, None)
        .await
        .expect("clear");

    assert!(engine(&pool).check_update(&env.key, "1.0.0", "h0").await.is_none());
}
