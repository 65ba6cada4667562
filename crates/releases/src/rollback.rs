use common::Principal;
use tracing::info;
use uuid::Uuid;

use data::bundle::{Bundle, RollbackRequest};
use repos::{Repo, app::AppRepo, bundle::BundleRepo, environment::EnvironmentRepo};

use crate::{error::ReleaseError, registry::VersionRegistry};

/// Moves a release line's current bundle one step back in its sequence.
#[derive(Clone)]
pub struct RollbackEngine {
    repo: Repo,
}

impl RollbackEngine {
    pub fn new(repo: Repo) -> Self {
        Self { repo }
    }

    /// Returns the bundle that became current, or `None` when the previous
    /// sequence entry is missing and the release line was left without a
    /// current bundle.
    pub async fn rollback(
        &self,
        request: &RollbackRequest,
        principal: &Principal,
    ) -> Result<Option<Bundle>, ReleaseError> {
        let app_id = parse_id(&request.app_id)?;
        let environment_id = parse_id(&request.environment_id)?;
        let version_id = parse_id(&request.version_id)?;

        let mut tx = self.repo.begin().await?;

        let app = AppRepo::get_by_id(&mut *tx, app_id)
            .await?
            .filter(|app| principal.can_access_app(app.id))
            .ok_or(ReleaseError::NotFound("app"))?;

        let environment = EnvironmentRepo::get_by_app_and_id(&mut *tx, app.id, environment_id)
            .await?
            .ok_or(ReleaseError::NotFound("environment"))?;

        let version = VersionRegistry::lock(&mut *tx, environment.id, version_id)
            .await?
            .ok_or(ReleaseError::NotFound("version"))?;

        let current_id = version
            .current_bundle_id
            .ok_or_else(|| ReleaseError::InvalidState("no bundle".to_string()))?;

        let current = BundleRepo::get_by_id(&mut *tx, current_id)
            .await?
            .ok_or(ReleaseError::NotFound("bundle"))?;

        let target = previous_sequence(&current)?;
        let previous = BundleRepo::get_by_sequence(&mut *tx, version.id, target).await?;

        VersionRegistry::update_current_bundle(
            &mut *tx,
            version.id,
            previous.as_ref().map(|bundle| bundle.id),
        )
        .await?;

        self.repo.end(tx).await?;

        info!(
            app = %app.name,
            environment = %environment.name,
            app_version = %version.app_version,
            from = %current.label,
            to = previous.as_ref().map(|b| b.label.as_str()).unwrap_or("none"),
            rolled_back_by = %principal.name,
            "Bundle rolled back"
        );

        Ok(previous)
    }
}

fn parse_id(id: &str) -> Result<Uuid, ReleaseError> {
    Uuid::parse_str(id).map_err(|_| ReleaseError::InvalidState("malformed id".to_string()))
}

fn previous_sequence(current: &Bundle) -> Result<i64, ReleaseError> {
    if current.is_genesis() {
        return Err(ReleaseError::InvalidState(
            "base bundle cannot be rolled back".to_string(),
        ));
    }
    Ok(current.sequence_id - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_genesis_cannot_be_rolled_back() {
        let genesis = Bundle {
            sequence_id: 1,
            ..Default::default()
        };
        assert_eq!(
            previous_sequence(&genesis),
            Err(ReleaseError::InvalidState(
                "base bundle cannot be rolled back".to_string()
            ))
        );
    }

    #[test]
    fn test_previous_sequence() {
        let bundle = Bundle {
            sequence_id: 5,
            ..Default::default()
        };
        assert_eq!(previous_sequence(&bundle), Ok(4));
    }

    #[test]
    fn test_malformed_id() {
        assert_eq!(
            parse_id("not-a-uuid"),
            Err(ReleaseError::InvalidState("malformed id".to_string()))
        );
        assert!(parse_id(&Uuid::new_v4().to_string()).is_ok());
    }
}
