use sqlx::Postgres;
use tracing::error;

use crate::error::{RepoError, handle_sql_error};
use data::version::{NewVersion, Version};

pub struct VersionRepo {}

impl VersionRepo {
    pub async fn get_by_id(
        executor: impl sqlx::Executor<'_, Database = Postgres>,
        id: uuid::Uuid,
    ) -> Result<Option<Version>, RepoError> {
        sqlx::query_as::<_, Version>(
            r#"
                SELECT *
                FROM ota.versions
                WHERE ota.versions.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await
        .map_err(handle_sql_error)
    }

    pub async fn get_by_environment_and_id(
        executor: impl sqlx::Executor<'_, Database = Postgres>,
        environment_id: uuid::Uuid,
        id: uuid::Uuid,
    ) -> Result<Option<Version>, RepoError> {
        sqlx::query_as::<_, Version>(
            r#"
                SELECT *
                FROM ota.versions
                WHERE ota.versions.id = $1 AND ota.versions.environment_id = $2
            "#,
        )
        .bind(id)
        .bind(environment_id)
        .fetch_optional(executor)
        .await
        .map_err(handle_sql_error)
    }

    /// Row-locks the version until the surrounding transaction ends.
    pub async fn get_by_environment_and_id_for_update(
        executor: impl sqlx::Executor<'_, Database = Postgres>,
        environment_id: uuid::Uuid,
        id: uuid::Uuid,
    ) -> Result<Option<Version>, RepoError> {
        sqlx::query_as::<_, Version>(
            r#"
                SELECT *
                FROM ota.versions
                WHERE ota.versions.id = $1 AND ota.versions.environment_id = $2
                FOR UPDATE
            "#,
        )
        .bind(id)
        .bind(environment_id)
        .fetch_optional(executor)
        .await
        .map_err(handle_sql_error)
    }

    pub async fn get_by_environment_and_app_version(
        executor: impl sqlx::Executor<'_, Database = Postgres>,
        environment_id: uuid::Uuid,
        app_version: &str,
    ) -> Result<Option<Version>, RepoError> {
        sqlx::query_as::<_, Version>(
            r#"
                SELECT *
                FROM ota.versions
                WHERE ota.versions.environment_id = $1 AND ota.versions.app_version = $2
            "#,
        )
        .bind(environment_id)
        .bind(app_version)
        .fetch_optional(executor)
        .await
        .map_err(handle_sql_error)
    }

    pub async fn get_by_environment_and_version_number(
        executor: impl sqlx::Executor<'_, Database = Postgres>,
        environment_id: uuid::Uuid,
        version_number: i64,
    ) -> Result<Option<Version>, RepoError> {
        sqlx::query_as::<_, Version>(
            r#"
                SELECT *
                FROM ota.versions
                WHERE ota.versions.environment_id = $1 AND ota.versions.version_number = $2
            "#,
        )
        .bind(environment_id)
        .bind(version_number)
        .fetch_optional(executor)
        .await
        .map_err(handle_sql_error)
    }

    /// The version with the highest encoded version number.
    pub async fn get_latest(
        executor: impl sqlx::Executor<'_, Database = Postgres>,
        environment_id: uuid::Uuid,
    ) -> Result<Option<Version>, RepoError> {
        sqlx::query_as::<_, Version>(
            r#"
                SELECT *
                FROM ota.versions
                WHERE ota.versions.environment_id = $1
                ORDER BY version_number DESC
                LIMIT 1
            "#,
        )
        .bind(environment_id)
        .fetch_optional(executor)
        .await
        .map_err(handle_sql_error)
    }

    pub async fn get_all_by_environment(
        executor: impl sqlx::Executor<'_, Database = Postgres>,
        environment_id: uuid::Uuid,
    ) -> Result<Vec<Version>, RepoError> {
        sqlx::query_as::<_, Version>(
            r#"
                SELECT *
                FROM ota.versions
                WHERE ota.versions.environment_id = $1
                ORDER BY created_at DESC
            "#,
        )
        .bind(environment_id)
        .fetch_all(executor)
        .await
        .map_err(|err| {
            error!("Failed to retrieve versions of environment {environment_id}: {err}");
            handle_sql_error(err)
        })
    }

    pub async fn create(
        executor: impl sqlx::Executor<'_, Database = Postgres>,
        version: NewVersion,
    ) -> Result<Version, RepoError> {
        sqlx::query_as::<_, Version>(
            r#"
                INSERT INTO ota.versions
                  (
                    id,
                    environment_id,
                    app_version,
                    version_number,
                    current_bundle_id
                  )
                VALUES ($1, $2, $3, $4, $5)
                RETURNING *
            "#,
        )
        .bind(version.id)
        .bind(version.environment_id)
        .bind(version.app_version)
        .bind(version.version_number)
        .bind(version.current_bundle_id)
        .fetch_one(executor)
        .await
        .map_err(handle_sql_error)
    }

    pub async fn update_current_bundle(
        executor: impl sqlx::Executor<'_, Database = Postgres>,
        id: uuid::Uuid,
        current_bundle_id: Option<uuid::Uuid>,
    ) -> Result<Version, RepoError> {
        sqlx::query_as::<_, Version>(
            r#"
                UPDATE ota.versions
                SET current_bundle_id = $2
                WHERE id = $1
                RETURNING *
            "#,
        )
        .bind(id)
        .bind(current_bundle_id)
        .fetch_one(executor)
        .await
        .map_err(handle_sql_error)
    }
}
