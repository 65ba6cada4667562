use axum::{
    Router,
    routing::{get, post},
};

use super::{
    api_token::{ApiTokenLayer, RequiredEntitlement},
    bundles::BundlesApi,
    catalog::CatalogApi,
    client::ClientApi,
};
use crate::state::AppState;

pub async fn routes(app_state: AppState) -> Router<AppState> {
    let push = || ApiTokenLayer::new(app_state.clone(), RequiredEntitlement::BundlePush);
    let rollback = || ApiTokenLayer::new(app_state.clone(), RequiredEntitlement::BundleRollback);
    let admin = || ApiTokenLayer::new(app_state.clone(), RequiredEntitlement::Admin);

    Router::new()
        // Release pipeline
        .route("/bundles/upload", post(BundlesApi::upload).layer(push()))
        .route(
            "/bundles",
            post(BundlesApi::create)
                .layer(push())
                .merge(get(BundlesApi::list).layer(admin())),
        )
        .route("/bundles/rollback", post(BundlesApi::rollback).layer(rollback()))
        .route(
            "/bundles/{id}/mandatory",
            post(BundlesApi::toggle_mandatory).layer(admin()),
        )
        .route("/bundles/{id}/valid", post(BundlesApi::toggle_valid).layer(admin()))
        // Catalog
        .route(
            "/apps",
            post(CatalogApi::create_app)
                .layer(admin())
                .merge(get(CatalogApi::list_apps).layer(admin())),
        )
        .route(
            "/apps/{id}/environments",
            get(CatalogApi::list_environments).layer(admin()),
        )
        .route(
            "/environments",
            post(CatalogApi::create_environment).layer(admin()),
        )
        .route(
            "/environments/{id}/versions",
            get(CatalogApi::list_versions).layer(admin()),
        )
        .route(
            "/environments/{id}/bundles/{label}",
            get(BundlesApi::get_by_label).layer(admin()),
        )
        // Devices
        .route("/client/update_check", get(ClientApi::update_check))
        .route(
            "/client/report_status/deploy",
            post(ClientApi::report_deploy),
        )
        .route(
            "/client/report_status/download",
            post(ClientApi::report_download),
        )
        .route("/live", get(super::health::live))
        .route("/ready", get(super::health::ready))
}
