use std::str::FromStr;

use tracing::{debug, warn};
use uuid::Uuid;

use data::client::{DeployStatus, ReportDeployRequest, ReportDownloadRequest};
use repos::{
    Repo,
    bundle::{BundleRepo, Counter},
    environment::EnvironmentRepo,
};

use crate::error::ReleaseError;

/// Per-bundle rollout counters fed by client status callbacks.
#[derive(Clone)]
pub struct RolloutTelemetry {
    repo: Repo,
}

impl RolloutTelemetry {
    pub fn new(repo: Repo) -> Self {
        Self { repo }
    }

    pub async fn report_deploy(&self, report: &ReportDeployRequest) -> Result<(), ReleaseError> {
        let status = DeployStatus::from_str(&report.status)
            .unwrap_or_else(|_| DeployStatus::Other(report.status.clone()));

        match status {
            DeployStatus::Succeeded => {
                self.bump(&report.deployment_key, &report.label, Counter::Active, 1)
                    .await?;

                if let Some((previous_label, previous_key)) = previous_bundle(report) {
                    if let Err(err) = self
                        .bump(previous_key, previous_label, Counter::Active, -1)
                        .await
                    {
                        warn!("Failed to release previous bundle {previous_label}: {err}");
                    }
                }
            }
            DeployStatus::Failed => {
                self.bump(&report.deployment_key, &report.label, Counter::Failed, 1)
                    .await?;
            }
            DeployStatus::Other(status) => {
                debug!("Ignoring deploy status {status} for {}", report.label);
                self.ensure_exists(&report.deployment_key, &report.label)
                    .await?;
            }
        }

        Ok(())
    }

    pub async fn report_download(&self, report: &ReportDownloadRequest) -> Result<(), ReleaseError> {
        self.bump(&report.deployment_key, &report.label, Counter::Installed, 1)
            .await?;
        Ok(())
    }

    async fn bump(
        &self,
        environment_key: &str,
        label: &str,
        counter: Counter,
        delta: i64,
    ) -> Result<Uuid, ReleaseError> {
        BundleRepo::increment_counter(&self.repo.pool, environment_key, label, counter, delta)
            .await?
            .ok_or(ReleaseError::NotFound("bundle"))
    }

    async fn ensure_exists(&self, environment_key: &str, label: &str) -> Result<(), ReleaseError> {
        let environment = EnvironmentRepo::get_by_key(&self.repo.pool, environment_key)
            .await?
            .ok_or(ReleaseError::NotFound("bundle"))?;

        BundleRepo::get_by_label(&self.repo.pool, environment.id, label)
            .await?
            .map(|_| ())
            .ok_or(ReleaseError::NotFound("bundle"))
    }
}

/// The bundle the client switched away from, when it told us both halves of
/// its identity.
fn previous_bundle(report: &ReportDeployRequest) -> Option<(&str, &str)> {
    let label = report.previous_label_or_app_version.as_deref()?;
    let key = report.previous_deployment_key.as_deref()?;

    if label.is_empty() || key.is_empty() {
        return None;
    }

    Some((label, key))
}
