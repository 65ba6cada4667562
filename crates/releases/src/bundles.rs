use std::sync::Arc;

use common::Principal;
use common::settings::{ObjectStorage, Server};
use object_store::{ObjectStore, PutMode, PutPayload, path::Path};
use tracing::{error, info, warn};
use uuid::Uuid;

use data::bundle::Bundle;
use repos::{Repo, bundle::BundleRepo, environment::EnvironmentRepo, version::VersionRepo};

use crate::{decision::download_url, error::ReleaseError};

const BUNDLE_PREFIX: &str = "bundles";

/// Operator views on bundles and artifact upload.
#[derive(Clone)]
pub struct BundleAdmin {
    repo: Repo,
    storage: Arc<dyn ObjectStore>,
    public_base_url: String,
    max_bundle_size: u64,
}

impl BundleAdmin {
    pub fn new(
        repo: Repo,
        storage: Arc<dyn ObjectStore>,
        object_storage: &ObjectStorage,
        server: &Server,
    ) -> Self {
        Self {
            repo,
            storage,
            public_base_url: object_storage.public_base_url.clone(),
            max_bundle_size: server.max_bundle_size,
        }
    }

    /// Bundles of a release line, newest first, with `download_file`
    /// expanded to a full URL.
    pub async fn list_bundles(
        &self,
        version_id: Uuid,
        principal: &Principal,
    ) -> Result<Vec<Bundle>, ReleaseError> {
        let version = VersionRepo::get_by_id(&self.repo.pool, version_id)
            .await?
            .ok_or(ReleaseError::NotFound("version"))?;

        EnvironmentRepo::get_by_id(&self.repo.pool, version.environment_id)
            .await?
            .filter(|environment| principal.can_access_app(environment.app_id))
            .ok_or(ReleaseError::NotFound("version"))?;

        let bundles = BundleRepo::get_all_by_version(&self.repo.pool, version.id).await?;
        Ok(bundles
            .into_iter()
            .map(|mut bundle| {
                bundle.download_file = download_url(&self.public_base_url, &bundle.download_file);
                bundle
            })
            .collect())
    }

    pub async fn get_bundle_by_label(
        &self,
        environment_id: Uuid,
        label: &str,
        principal: &Principal,
    ) -> Result<Bundle, ReleaseError> {
        BundleRepo::get_by_label(&self.repo.pool, environment_id, label)
            .await?
            .filter(|bundle| principal.can_access_app(bundle.app_id))
            .ok_or(ReleaseError::NotFound("bundle"))
    }

    pub async fn toggle_mandatory(
        &self,
        bundle_id: Uuid,
        principal: &Principal,
    ) -> Result<Bundle, ReleaseError> {
        self.authorize(bundle_id, principal).await?;

        let bundle = BundleRepo::toggle_mandatory(&self.repo.pool, bundle_id)
            .await?
            .ok_or(ReleaseError::NotFound("bundle"))?;

        info!(label = %bundle.label, is_mandatory = bundle.is_mandatory, by = %principal.name, "Bundle mandatory flag changed");
        Ok(bundle)
    }

    pub async fn toggle_valid(
        &self,
        bundle_id: Uuid,
        principal: &Principal,
    ) -> Result<Bundle, ReleaseError> {
        self.authorize(bundle_id, principal).await?;

        let bundle = BundleRepo::toggle_valid(&self.repo.pool, bundle_id)
            .await?
            .ok_or(ReleaseError::NotFound("bundle"))?;

        info!(label = %bundle.label, is_valid = bundle.is_valid, by = %principal.name, "Bundle validity changed");
        Ok(bundle)
    }

    /// Stores an uploaded zip and returns the path to reference as the
    /// bundle's download file.
    pub async fn upload_bundle(
        &self,
        file_name: &str,
        payload: PutPayload,
    ) -> Result<String, ReleaseError> {
        validate_file_name(file_name)?;

        let size = payload.content_length() as u64;
        if size == 0 {
            return Err(ReleaseError::InvalidFormat("empty bundle".to_string()));
        }
        if size > self.max_bundle_size {
            return Err(ReleaseError::InvalidFormat(format!(
                "bundle exceeds {} bytes",
                self.max_bundle_size
            )));
        }

        // released artifacts are never replaced in place
        let location = format!("{BUNDLE_PREFIX}/{file_name}");
        self.storage
            .put_opts(
                &Path::from(location.as_str()),
                payload,
                PutMode::Create.into(),
            )
            .await
            .map_err(|err| match err {
                object_store::Error::AlreadyExists { .. } => {
                    warn!("Refusing to overwrite bundle {location}");
                    ReleaseError::Conflict("bundle file already exists".to_string())
                }
                err => {
                    error!("Failed to store bundle {location}: {err}");
                    ReleaseError::Internal("failed to store bundle".to_string())
                }
            })?;

        info!(location = %location, size, "Bundle uploaded");
        Ok(location)
    }

    async fn authorize(&self, bundle_id: Uuid, principal: &Principal) -> Result<(), ReleaseError> {
        BundleRepo::get_by_id(&self.repo.pool, bundle_id)
            .await?
            .filter(|bundle| principal.can_access_app(bundle.app_id))
            .map(|_| ())
            .ok_or(ReleaseError::NotFound("bundle"))
    }
}

fn validate_file_name(file_name: &str) -> Result<(), ReleaseError> {
    let invalid = file_name.is_empty()
        || file_name.contains('/')
        || file_name.contains('\\')
        || file_name.contains("..");

    if invalid {
        return Err(ReleaseError::InvalidFormat(format!(
            "invalid file name '{file_name}'"
        )));
    }
    Ok(())
}
