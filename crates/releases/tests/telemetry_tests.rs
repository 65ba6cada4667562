use common::Principal;
use common::settings::Releases;
use data::bundle::{Bundle, CreateBundleRequest};
use data::client::{ReportDeployRequest, ReportDownloadRequest};
use futures::future::join_all;
use releases::{BundleSequencer, ReleaseError, RolloutTelemetry};
use repos::{Repo, bundle::BundleRepo};
use sqlx::{Pool, Postgres};
use testware::setup_test_dependencies;
use uuid::Uuid;

async fn push(pool: &Pool<Postgres>, hash: &str) -> Bundle {
    BundleSequencer::new(Repo::new(pool.clone()), &Releases::default())
        .create_new_bundle(
            &CreateBundleRequest {
                app_name: "demo".to_string(),
                environment: "dev".to_string(),
                download_file: format!("bundles/{hash}.zip"),
                description: String::new(),
                app_version: "1.0.0".to_string(),
                size: 10,
                hash: hash.to_string(),
            },
            &Principal::new(Uuid::new_v4(), "ci".to_string(), None),
        )
        .await
        .expect("push")
}

async fn reload(pool: &Pool<Postgres>, bundle: &Bundle) -> Bundle {
    BundleRepo::get_by_id(pool, bundle.id)
        .await
        .expect("query")
        .expect("bundle")
}

fn deploy(key: &str, label: &str, status: &str) -> ReportDeployRequest {
    ReportDeployRequest {
        app_version: "1.0.0".to_string(),
        deployment_key: key.to_string(),
        label: label.to_string(),
        status: status.to_string(),
        ..Default::default()
    }
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_deploy_outcomes_update_counters(pool: Pool<Postgres>) {
    let (_, env) = setup_test_dependencies(&pool).await;
    let bundle = push(&pool, "h1").await;
    let telemetry = RolloutTelemetry::new(Repo::new(pool.clone()));

    telemetry
        .report_deploy(&deploy(&env.key, &bundle.label, "DeploymentSucceeded"))
        .await
        .expect("report");
    telemetry
        .report_deploy(&deploy(&env.key, &bundle.label, "DeploymentFailed"))
        .await
        .expect("report");
    telemetry
        .report_deploy(&deploy(&env.key, &bundle.label, "SomethingElse"))
        .await
        .expect("report");

    let bundle = reload(&pool, &bundle).await;
    assert_eq!(bundle.active, 1);
    assert_eq!(bundle.failed, 1);
    assert_eq!(bundle.installed, 0);
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_unknown_bundle_is_not_found(pool: Pool<Postgres>) {
    let (_, env) = setup_test_dependencies(&pool).await;
    push(&pool, "h1").await;
    let telemetry = RolloutTelemetry::new(Repo::new(pool.clone()));

    for status in ["DeploymentSucceeded", "DeploymentFailed", "SomethingElse"] {
        let result = telemetry
            .report_deploy(&deploy(&env.key, "v9:9", status))
            .await;
        assert_eq!(result.unwrap_err(), ReleaseError::NotFound("bundle"));
    }

    let result = telemetry
        .report_download(&ReportDownloadRequest {
            client_unique_id: String::new(),
            deployment_key: "unknown".to_string(),
            label: "v9:9".to_string(),
        })
        .await;
    assert_eq!(result.unwrap_err(), ReleaseError::NotFound("bundle"));
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_download_counts_installs(pool: Pool<Postgres>) {
    let (_, env) = setup_test_dependencies(&pool).await;
    let bundle = push(&pool, "h1").await;
    let telemetry = RolloutTelemetry::new(Repo::new(pool.clone()));

    for _ in 0..3 {
        telemetry
            .report_download(&ReportDownloadRequest {
                client_unique_id: "device".to_string(),
                deployment_key: env.key.clone(),
                label: bundle.label.clone(),
            })
            .await
            .expect("report");
    }

    assert_eq!(reload(&pool, &bundle).await.installed, 3);
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_previous_bundle_failure_is_swallowed(pool: Pool<Postgres>) {
    let (_, env) = setup_test_dependencies(&pool).await;
    let bundle = push(&pool, "h1").await;
    let telemetry = RolloutTelemetry::new(Repo::new(pool.clone()));

    let mut report = deploy(&env.key, &bundle.label, "DeploymentSucceeded");
    report.previous_label_or_app_version = Some("1.0.0".to_string());
    report.previous_deployment_key = Some(env.key.clone());

    telemetry.report_deploy(&report).await.expect("report");
    assert_eq!(reload(&pool, &bundle).await.active, 1);
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_concurrent_switches_move_exactly_one_each(pool: Pool<Postgres>) {
    let (_, env) = setup_test_dependencies(&pool).await;
    let old = push(&pool, "h1").await;
    let new = push(&pool, "h2").await;
    let telemetry = RolloutTelemetry::new(Repo::new(pool.clone()));

    let mut report = deploy(&env.key, &new.label, "DeploymentSucceeded");
    report.previous_label_or_app_version = Some(old.label.clone());
    report.previous_deployment_key = Some(env.key.clone());

    let results = join_all((0..20).map(|_| telemetry.report_deploy(&report))).await;
    for result in results {
        result.expect("report");
    }

    assert_eq!(reload(&pool, &new).await.active, 20);
    // no clamping at zero
    assert_eq!(reload(&pool, &old).await.active, -20);
}
