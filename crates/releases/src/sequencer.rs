use common::Principal;
use common::settings::Releases;
use tracing::{debug, info, warn};

use data::app::App;
use data::bundle::{Bundle, CreateBundleRequest, GENESIS_SEQUENCE_ID, NewBundle, make_label};
use data::environment::Environment;
use repos::{
    Repo, app::AppRepo, bundle::BundleRepo, environment::EnvironmentRepo, error::RepoError,
};

use crate::{error::ReleaseError, registry::VersionRegistry, version_number};

const HASH_CONSTRAINT: &str = "bundles_version_hash_key";

/// Constraints that fail when another push for the same release line
/// committed first. The whole push is retried.
const CONTENDED_CONSTRAINTS: &[&str] = &[
    "bundles_sequence_key",
    "bundles_environment_label_key",
    "versions_environment_app_version_key",
    "versions_environment_version_number_key",
];

enum AttemptError {
    Contended(String),
    Failed(ReleaseError),
}

impl From<ReleaseError> for AttemptError {
    fn from(err: ReleaseError) -> Self {
        AttemptError::Failed(err)
    }
}

impl From<RepoError> for AttemptError {
    fn from(err: RepoError) -> Self {
        if err.is_unique_violation_of(HASH_CONSTRAINT) {
            return AttemptError::Failed(ReleaseError::Conflict("duplicate hash".to_string()));
        }

        match err {
            RepoError::UniqueViolation(_, constraint)
                if CONTENDED_CONSTRAINTS.contains(&constraint.as_str()) =>
            {
                AttemptError::Contended(constraint)
            }
            other => AttemptError::Failed(other.into()),
        }
    }
}

/// Appends bundles to release lines in strict sequence order.
#[derive(Clone)]
pub struct BundleSequencer {
    repo: Repo,
    max_attempts: u32,
}

impl BundleSequencer {
    pub fn new(repo: Repo, settings: &Releases) -> Self {
        Self {
            repo,
            max_attempts: settings.max_sequence_attempts.max(1),
        }
    }

    /// Registers an uploaded artifact as the newest bundle of its release
    /// line and makes it current. Creates the release line on first push.
    pub async fn create_new_bundle(
        &self,
        request: &CreateBundleRequest,
        principal: &Principal,
    ) -> Result<Bundle, ReleaseError> {
        validate(request)?;

        for attempt in 1..=self.max_attempts {
            match self.try_create(request, principal).await {
                Ok(bundle) => {
                    info!(
                        app = %request.app_name,
                        environment = %request.environment,
                        app_version = %request.app_version,
                        label = %bundle.label,
                        created_by = %principal.name,
                        "Bundle created"
                    );
                    return Ok(bundle);
                }
                Err(AttemptError::Contended(constraint)) => {
                    debug!(attempt, %constraint, "Concurrent push on release line, retrying");
                }
                Err(AttemptError::Failed(err)) => return Err(err),
            }
        }

        warn!(
            app = %request.app_name,
            environment = %request.environment,
            app_version = %request.app_version,
            "Giving up on bundle push after {} attempts",
            self.max_attempts
        );
        Err(ReleaseError::Conflict(
            "release line is being updated concurrently".to_string(),
        ))
    }

    async fn try_create(
        &self,
        request: &CreateBundleRequest,
        principal: &Principal,
    ) -> Result<Bundle, AttemptError> {
        let mut tx = self.repo.begin().await?;

        let app = AppRepo::get_by_name(&mut *tx, &request.app_name)
            .await?
            .filter(|app| principal.can_access_app(app.id))
            .ok_or(ReleaseError::NotFound("app"))?;

        let environment = EnvironmentRepo::get_by_app_and_name(&mut *tx, app.id, &request.environment)
            .await?
            .ok_or(ReleaseError::NotFound("environment"))?;

        let existing = VersionRegistry::get_by_environment_and_app_version(
            &mut *tx,
            environment.id,
            &request.app_version,
        )
        .await?;

        let bundle = match existing {
            None => {
                let version_number = version_number::encode(&request.app_version)?;

                // same number, different spelling: retrying cannot help
                if let Some(clash) = VersionRegistry::get_by_environment_and_version_number(
                    &mut *tx,
                    environment.id,
                    version_number,
                )
                .await?
                {
                    return Err(ReleaseError::Conflict(format!(
                        "app version {} collides with existing {}",
                        request.app_version, clash.app_version
                    ))
                    .into());
                }

                let genesis = new_bundle(
                    &app,
                    &environment,
                    request,
                    principal,
                    version_number,
                    GENESIS_SEQUENCE_ID,
                );

                let (_, bundle) = VersionRegistry::create(
                    &mut *tx,
                    environment.id,
                    &request.app_version,
                    version_number,
                    genesis,
                )
                .await?;
                bundle
            }
            Some(version) => {
                if BundleRepo::get_by_version_and_hash(&mut *tx, version.id, &request.hash)
                    .await?
                    .is_some()
                {
                    return Err(ReleaseError::Conflict("duplicate hash".to_string()).into());
                }

                let sequence_id = BundleRepo::get_max_sequence(&mut *tx, version.id).await? + 1;
                let mut bundle = new_bundle(
                    &app,
                    &environment,
                    request,
                    principal,
                    version.version_number,
                    sequence_id,
                );
                bundle.version_id = version.id;

                let bundle = BundleRepo::create(&mut *tx, bundle).await?;
                VersionRegistry::update_current_bundle(&mut *tx, version.id, Some(bundle.id))
                    .await?;
                bundle
            }
        };

        self.repo.end(tx).await?;
        Ok(bundle)
    }
}

fn new_bundle(
    app: &App,
    environment: &Environment,
    request: &CreateBundleRequest,
    principal: &Principal,
    version_number: i64,
    sequence_id: i64,
) -> NewBundle {
    NewBundle {
        app_id: app.id,
        environment_id: environment.id,
        version_id: uuid::Uuid::nil(),
        sequence_id,
        hash: request.hash.clone(),
        label: make_label(version_number, sequence_id),
        download_file: request.download_file.clone(),
        size: request.size,
        description: request.description.clone(),
        created_by: principal.name.clone(),
    }
}

fn validate(request: &CreateBundleRequest) -> Result<(), ReleaseError> {
    let required = [
        ("appName", &request.app_name),
        ("environment", &request.environment),
        ("downloadFile", &request.download_file),
        ("appVersion", &request.app_version),
        ("hash", &request.hash),
    ];

    if let Some((field, _)) = required.iter().find(|(_, value)| value.trim().is_empty()) {
        return Err(ReleaseError::InvalidFormat(format!("{field} is required")));
    }

    if request.size < 0 {
        return Err(ReleaseError::InvalidFormat(
            "size must not be negative".to_string(),
        ));
    }

    Ok(())
}
