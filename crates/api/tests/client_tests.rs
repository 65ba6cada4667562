#![cfg(test)]

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    extract::DefaultBodyLimit,
    http::{Request, StatusCode},
};
use data::api_token::{ENTITLEMENT_ADMIN, ENTITLEMENT_BUNDLE_PUSH};
use data::environment::Environment;
use repos::bundle::BundleRepo;
use serde_json::{Value, json};
use sqlx::PgPool;
use testware::{create_settings, create_test_token, setup_test_dependencies};
use tower::ServiceExt;

use api::routes::routes;
use api::state::AppState;
use repos::Repo;
use tower_http::trace::TraceLayer;

async fn setup(pool: &PgPool) -> Router {
    let settings = create_settings();
    let repo = Repo::new(pool.clone());
    let store = Arc::new(object_store::memory::InMemory::new());
    let state = AppState::new(repo, settings, store);

    Router::new()
        .nest("/api", routes(state.clone()).await)
        .layer(DefaultBodyLimit::max(100 * 1024 * 1024))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, axum::body::Bytes) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    (status, body)
}

async fn push(app: &Router, token: &str, app_version: &str, hash: &str) -> Value {
    let body = json!({
        "appName": "demo",
        "environment": "dev",
        "downloadFile": format!("bundles/{hash}.zip"),
        "appVersion": app_version,
        "size": 64,
        "hash": hash
    });
    let request = Request::builder()
        .method("POST")
        .uri("/api/bundles")
        .header("Authorization", format!("Bearer {token}"))
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();

    let (status, body) = send(app, request).await;
    assert_eq!(status, StatusCode::OK);
    serde_json::from_slice(&body).unwrap()
}

async fn update_check(app: &Router, query: &str) -> Value {
    let request = Request::builder()
        .method("GET")
        .uri(format!("/api/client/update_check?{query}"))
        .body(Body::empty())
        .unwrap();

    let (status, body) = send(app, request).await;
    assert_eq!(status, StatusCode::OK);
    serde_json::from_slice::<Value>(&body).unwrap()["update_info"].clone()
}

async fn report(app: &Router, uri: &str, body: String) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("Content-Type", "application/json")
        .body(Body::from(body))
        .unwrap();

    let (status, body) = send(app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_ref(), b"OK");
}

async fn pushed_release(pool: &PgPool, app: &Router) -> Environment {
    let (_, environment) = setup_test_dependencies(pool).await;
    let token = create_test_token(pool, None, &[ENTITLEMENT_BUNDLE_PUSH, ENTITLEMENT_ADMIN]).await;
    push(app, &token, "1.0.0", "h1").await;
    push(app, &token, "1.0.0", "h2").await;
    environment
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_update_check_offers_current_bundle(pool: PgPool) {
    let app = setup(&pool).await;
    let environment = pushed_release(&pool, &app).await;

    let info = update_check(
        &app,
        &format!(
            "deployment_key={}&app_version=1.0.0&package_hash=h1",
            environment.key
        ),
    )
    .await;

    assert_eq!(info["is_available"], true);
    assert_eq!(info["package_hash"], "h2");
    assert_eq!(info["label"], "v1000000000000:2");
    assert_eq!(info["download_url"], "https://cdn.example.com/ota/bundles/h2.zip");
    assert_eq!(info["target_binary_range"], "1.0.0");
    assert_eq!(info["update_app_version"], false);
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_update_check_up_to_date(pool: PgPool) {
    let app = setup(&pool).await;
    let environment = pushed_release(&pool, &app).await;

    let info = update_check(
        &app,
        &format!(
            "deployment_key={}&app_version=1.0.0&package_hash=h2",
            environment.key
        ),
    )
    .await;
    assert!(info.is_null());
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_update_check_signals_native_upgrade(pool: PgPool) {
    let app = setup(&pool).await;
    let environment = pushed_release(&pool, &app).await;
    let token = create_test_token(&pool, None, &[ENTITLEMENT_BUNDLE_PUSH]).await;
    push(&app, &token, "2.0.0", "h3").await;

    let info = update_check(
        &app,
        &format!(
            "deployment_key={}&app_version=1.0.0&package_hash=h2",
            environment.key
        ),
    )
    .await;
    assert_eq!(info["update_app_version"], true);
    assert_eq!(info["target_binary_range"], "2.0.0");
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_update_check_unknown_or_missing_parameters(pool: PgPool) {
    let app = setup(&pool).await;
    pushed_release(&pool, &app).await;

    let info = update_check(
        &app,
        "deployment_key=unknown&app_version=1.0.0&package_hash=h1",
    )
    .await;
    assert!(info.is_null());

    let info = update_check(&app, "").await;
    assert!(info.is_null());
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_deploy_reports_move_counters(pool: PgPool) {
    let app = setup(&pool).await;
    let environment = pushed_release(&pool, &app).await;

    report(
        &app,
        "/api/client/report_status/deploy",
        json!({
            "app_version": "1.0.0",
            "deployment_key": environment.key,
            "label": "v1000000000000:2",
            "status": "DeploymentSucceeded",
            "previous_label_or_app_version": "v1000000000000:1",
            "previous_deployment_key": environment.key,
        })
        .to_string(),
    )
    .await;

    report(
        &app,
        "/api/client/report_status/deploy",
        json!({
            "app_version": "1.0.0",
            "deployment_key": environment.key,
            "label": "v1000000000000:2",
            "status": "DeploymentFailed",
        })
        .to_string(),
    )
    .await;

    let current = BundleRepo::get_by_label(&pool, environment.id, "v1000000000000:2")
        .await
        .unwrap()
        .unwrap();
    let previous = BundleRepo::get_by_label(&pool, environment.id, "v1000000000000:1")
        .await
        .unwrap()
        .unwrap();

    assert_eq!(current.active, 1);
    assert_eq!(current.failed, 1);
    assert_eq!(previous.active, -1);
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_download_report_counts_install(pool: PgPool) {
    let app = setup(&pool).await;
    let environment = pushed_release(&pool, &app).await;

    report(
        &app,
        "/api/client/report_status/download",
        json!({
            "deployment_key": environment.key,
            "label": "v1000000000000:2",
        })
        .to_string(),
    )
    .await;

    let bundle = BundleRepo::get_by_label(&pool, environment.id, "v1000000000000:2")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(bundle.installed, 1);
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_bad_reports_still_answer_ok(pool: PgPool) {
    let app = setup(&pool).await;
    pushed_release(&pool, &app).await;

    report(
        &app,
        "/api/client/report_status/deploy",
        "{not json".to_string(),
    )
    .await;

    report(
        &app,
        "/api/client/report_status/download",
        json!({ "deployment_key": "unknown", "label": "v1:1" }).to_string(),
    )
    .await;
}
