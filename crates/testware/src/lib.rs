pub mod mockall_object_store;
pub mod setup;

use std::sync::Arc;

use common::settings::Settings;
use common::token::generate_api_token;
use sqlx::PgPool;
use uuid::Uuid;

use data::api_token::NewApiToken;
use data::app::{App, NewApp, Platform};
use data::environment::{Environment, NewEnvironment};
use repos::api_token::ApiTokenRepo;
use repos::app::AppRepo;
use repos::environment::EnvironmentRepo;

pub const TEST_PUBLIC_BASE_URL: &str = "https://cdn.example.com/ota/";

/// Create a test app with a specific name
pub async fn create_test_app(pool: &PgPool, name: &str, platform: Platform) -> App {
    AppRepo::create(
        pool,
        NewApp {
            name: name.to_string(),
            platform,
        },
    )
    .await
    .expect("Failed to insert test app")
}

/// Create an environment with a fresh deployment key
pub async fn create_test_environment(pool: &PgPool, app_id: Uuid, name: &str) -> Environment {
    EnvironmentRepo::create(
        pool,
        NewEnvironment {
            app_id,
            name: name.to_string(),
            key: Uuid::new_v4().to_string(),
        },
    )
    .await
    .expect("Failed to insert test environment")
}

/// Set up common test dependencies - an app named `demo` with a `dev` environment
pub async fn setup_test_dependencies(pool: &PgPool) -> (App, Environment) {
    let app = create_test_app(pool, "demo", Platform::Ios).await;
    let environment = create_test_environment(pool, app.id, "dev").await;
    (app, environment)
}

/// Create an API token and return the raw bearer value
pub async fn create_test_token(
    pool: &PgPool,
    app_id: Option<Uuid>,
    entitlements: &[&str],
) -> String {
    let generated = generate_api_token().expect("Failed to generate token");

    let new_token = NewApiToken {
        description: "Test API token".to_string(),
        token_id: generated.token_id,
        token_hash: generated.token_hash,
        app_id,
        entitlements: entitlements.iter().map(|e| e.to_string()).collect(),
        expires_at: None,
    };

    ApiTokenRepo::create(pool, new_token)
        .await
        .expect("Failed to insert test API token");

    generated.token
}

pub fn create_settings() -> Arc<Settings> {
    let mut settings = Settings::default();
    settings.object_storage.public_base_url = TEST_PUBLIC_BASE_URL.to_string();
    settings.server.max_bundle_size = 1024;
    Arc::new(settings)
}
