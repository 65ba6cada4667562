use std::sync::Arc;

use axum::extract::FromRef;
use common::settings::Settings;
use object_store::ObjectStore;
use releases::{
    BundleAdmin, BundleSequencer, Catalog, RollbackEngine, RolloutTelemetry, UpdateDecisionEngine,
};
use repos::Repo;

#[derive(FromRef, Clone)]
pub struct AppState {
    pub repo: Repo,
    pub settings: Arc<Settings>,
    pub storage: Arc<dyn ObjectStore>,
    pub sequencer: BundleSequencer,
    pub rollback: RollbackEngine,
    pub decision: UpdateDecisionEngine,
    pub telemetry: RolloutTelemetry,
    pub catalog: Catalog,
    pub bundles: BundleAdmin,
}

impl AppState {
    pub fn new(repo: Repo, settings: Arc<Settings>, storage: Arc<dyn ObjectStore>) -> Self {
        Self {
            sequencer: BundleSequencer::new(repo.clone(), &settings.releases),
            rollback: RollbackEngine::new(repo.clone()),
            decision: UpdateDecisionEngine::new(repo.clone(), &settings.object_storage),
            telemetry: RolloutTelemetry::new(repo.clone()),
            catalog: Catalog::new(repo.clone()),
            bundles: BundleAdmin::new(
                repo.clone(),
                storage.clone(),
                &settings.object_storage,
                &settings.server,
            ),
            repo,
            settings,
            storage,
        }
    }
}
