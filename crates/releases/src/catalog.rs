use std::str::FromStr;

use common::{Principal, QueryParams};
use tracing::info;
use uuid::Uuid;

use data::app::{App, CreateAppRequest, NewApp, Platform};
use data::environment::{CreateEnvironmentRequest, Environment, NewEnvironment};
use data::version::Version;
use repos::{Repo, app::AppRepo, environment::EnvironmentRepo};

use crate::{error::ReleaseError, registry::VersionRegistry};

/// Apps and their deployment environments.
#[derive(Clone)]
pub struct Catalog {
    repo: Repo,
}

impl Catalog {
    pub fn new(repo: Repo) -> Self {
        Self { repo }
    }

    /// Only unscoped principals may add apps.
    pub async fn create_app(
        &self,
        request: &CreateAppRequest,
        principal: &Principal,
    ) -> Result<App, ReleaseError> {
        if principal.app_id.is_some() {
            return Err(ReleaseError::InvalidState(
                "app-scoped token cannot create apps".to_string(),
            ));
        }

        if request.name.trim().is_empty() {
            return Err(ReleaseError::InvalidFormat("name is required".to_string()));
        }

        let platform = Platform::from_str(&request.platform).map_err(|_| {
            ReleaseError::InvalidFormat(format!("unsupported platform '{}'", request.platform))
        })?;

        let app = AppRepo::create(
            &self.repo.pool,
            NewApp {
                name: request.name.clone(),
                platform,
            },
        )
        .await?;

        info!(app = %app.name, platform = %app.platform, by = %principal.name, "App created");
        Ok(app)
    }

    /// Apps visible to `principal`.
    pub async fn list_apps(
        &self,
        params: QueryParams,
        principal: &Principal,
    ) -> Result<Vec<App>, ReleaseError> {
        let apps = AppRepo::get_all(&self.repo.pool, params).await?;
        Ok(apps
            .into_iter()
            .filter(|app| principal.can_access_app(app.id))
            .collect())
    }

    pub async fn get_app_by_name(
        &self,
        name: &str,
        principal: &Principal,
    ) -> Result<App, ReleaseError> {
        AppRepo::get_by_name(&self.repo.pool, name)
            .await?
            .filter(|app| principal.can_access_app(app.id))
            .ok_or(ReleaseError::NotFound("app"))
    }

    pub async fn create_environment(
        &self,
        request: &CreateEnvironmentRequest,
        principal: &Principal,
    ) -> Result<Environment, ReleaseError> {
        if request.name.trim().is_empty() {
            return Err(ReleaseError::InvalidFormat("name is required".to_string()));
        }

        let app = self.get_app_by_name(&request.app_name, principal).await?;

        let environment = EnvironmentRepo::create(
            &self.repo.pool,
            NewEnvironment {
                app_id: app.id,
                name: request.name.clone(),
                key: Uuid::new_v4().to_string(),
            },
        )
        .await?;

        info!(app = %app.name, environment = %environment.name, "Environment created");
        Ok(environment)
    }

    pub async fn list_environments(
        &self,
        app_id: Uuid,
        principal: &Principal,
    ) -> Result<Vec<Environment>, ReleaseError> {
        let app = AppRepo::get_by_id(&self.repo.pool, app_id)
            .await?
            .filter(|app| principal.can_access_app(app.id))
            .ok_or(ReleaseError::NotFound("app"))?;

        Ok(EnvironmentRepo::get_all_by_app(&self.repo.pool, app.id).await?)
    }

    /// Release lines of an environment, newest first.
    pub async fn list_versions(
        &self,
        environment_id: Uuid,
        principal: &Principal,
    ) -> Result<Vec<Version>, ReleaseError> {
        let environment = EnvironmentRepo::get_by_id(&self.repo.pool, environment_id)
            .await?
            .filter(|environment| principal.can_access_app(environment.app_id))
            .ok_or(ReleaseError::NotFound("environment"))?;

        Ok(VersionRegistry::list_all(&self.repo.pool, environment.id).await?)
    }
}
