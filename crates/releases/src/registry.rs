use sqlx::{PgConnection, Postgres};
use uuid::Uuid;

use data::bundle::{Bundle, NewBundle};
use data::version::{NewVersion, Version};
use repos::{bundle::BundleRepo, error::RepoError, version::VersionRepo};

/// Maps (environment, native app version) to its release line.
///
/// Errors are returned at the repository level so callers can tell a lost
/// unique-constraint race from a hard failure.
pub struct VersionRegistry {}

impl VersionRegistry {
    pub async fn get_by_environment_and_app_version(
        executor: impl sqlx::Executor<'_, Database = Postgres>,
        environment_id: Uuid,
        app_version: &str,
    ) -> Result<Option<Version>, RepoError> {
        VersionRepo::get_by_environment_and_app_version(executor, environment_id, app_version)
            .await
    }

    pub async fn get_by_environment_and_id(
        executor: impl sqlx::Executor<'_, Database = Postgres>,
        environment_id: Uuid,
        version_id: Uuid,
    ) -> Result<Option<Version>, RepoError> {
        VersionRepo::get_by_environment_and_id(executor, environment_id, version_id).await
    }

    /// Same as [`Self::get_by_environment_and_id`] but holds a row lock until
    /// the transaction ends.
    pub async fn lock(
        executor: impl sqlx::Executor<'_, Database = Postgres>,
        environment_id: Uuid,
        version_id: Uuid,
    ) -> Result<Option<Version>, RepoError> {
        VersionRepo::get_by_environment_and_id_for_update(executor, environment_id, version_id)
            .await
    }

    /// The release line whose app version encodes to `version_number`,
    /// e.g. "1.2" for "1.2.0".
    pub async fn get_by_environment_and_version_number(
        executor: impl sqlx::Executor<'_, Database = Postgres>,
        environment_id: Uuid,
        version_number: i64,
    ) -> Result<Option<Version>, RepoError> {
        VersionRepo::get_by_environment_and_version_number(executor, environment_id, version_number)
            .await
    }

    pub async fn get_latest(
        executor: impl sqlx::Executor<'_, Database = Postgres>,
        environment_id: Uuid,
    ) -> Result<Option<Version>, RepoError> {
        VersionRepo::get_latest(executor, environment_id).await
    }

    pub async fn list_all(
        executor: impl sqlx::Executor<'_, Database = Postgres>,
        environment_id: Uuid,
    ) -> Result<Vec<Version>, RepoError> {
        VersionRepo::get_all_by_environment(executor, environment_id).await
    }

    /// Creates a release line together with its genesis bundle.
    ///
    /// The version id is reserved first so the bundle can reference it; both
    /// foreign keys are deferred until `conn`'s transaction commits.
    pub async fn create(
        conn: &mut PgConnection,
        environment_id: Uuid,
        app_version: &str,
        version_number: i64,
        mut genesis: NewBundle,
    ) -> Result<(Version, Bundle), RepoError> {
        let version_id = Uuid::new_v4();
        genesis.version_id = version_id;

        let bundle = BundleRepo::create(&mut *conn, genesis).await?;
        let version = VersionRepo::create(
            &mut *conn,
            NewVersion {
                id: version_id,
                environment_id,
                app_version: app_version.to_string(),
                version_number,
                current_bundle_id: Some(bundle.id),
            },
        )
        .await?;

        Ok((version, bundle))
    }

    pub async fn update_current_bundle(
        executor: impl sqlx::Executor<'_, Database = Postgres>,
        version_id: Uuid,
        bundle_id: Option<Uuid>,
    ) -> Result<Version, RepoError> {
        VersionRepo::update_current_bundle(executor, version_id, bundle_id).await
    }
}
