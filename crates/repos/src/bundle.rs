use sqlx::Postgres;
use tracing::error;

use crate::error::{RepoError, handle_sql_error};
use data::bundle::{Bundle, NewBundle};

/// Rollout counters kept on each bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Counter {
    Active,
    Failed,
    Installed,
}

impl Counter {
    fn column(self) -> &'static str {
        match self {
            Counter::Active => "active",
            Counter::Failed => "failed",
            Counter::Installed => "installed",
        }
    }
}

pub struct BundleRepo {}

impl BundleRepo {
    pub async fn get_by_id(
        executor: impl sqlx::Executor<'_, Database = Postgres>,
        id: uuid::Uuid,
    ) -> Result<Option<Bundle>, RepoError> {
        sqlx::query_as::<_, Bundle>(
            r#"
                SELECT *
                FROM ota.bundles
                WHERE ota.bundles.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await
        .map_err(handle_sql_error)
    }

    pub async fn get_by_version_and_hash(
        executor: impl sqlx::Executor<'_, Database = Postgres>,
        version_id: uuid::Uuid,
        hash: &str,
    ) -> Result<Option<Bundle>, RepoError> {
        sqlx::query_as::<_, Bundle>(
            r#"
                SELECT *
                FROM ota.bundles
                WHERE ota.bundles.version_id = $1 AND ota.bundles.hash = $2
            "#,
        )
        .bind(version_id)
        .bind(hash)
        .fetch_optional(executor)
        .await
        .map_err(handle_sql_error)
    }

    pub async fn get_by_sequence(
        executor: impl sqlx::Executor<'_, Database = Postgres>,
        version_id: uuid::Uuid,
        sequence_id: i64,
    ) -> Result<Option<Bundle>, RepoError> {
        sqlx::query_as::<_, Bundle>(
            r#"
                SELECT *
                FROM ota.bundles
                WHERE ota.bundles.version_id = $1 AND ota.bundles.sequence_id = $2
            "#,
        )
        .bind(version_id)
        .bind(sequence_id)
        .fetch_optional(executor)
        .await
        .map_err(handle_sql_error)
    }

    pub async fn get_by_label(
        executor: impl sqlx::Executor<'_, Database = Postgres>,
        environment_id: uuid::Uuid,
        label: &str,
    ) -> Result<Option<Bundle>, RepoError> {
        sqlx::query_as::<_, Bundle>(
            r#"
                SELECT *
                FROM ota.bundles
                WHERE ota.bundles.environment_id = $1 AND ota.bundles.label = $2
            "#,
        )
        .bind(environment_id)
        .bind(label)
        .fetch_optional(executor)
        .await
        .map_err(handle_sql_error)
    }

    /// Highest sequence id of the version, 0 when it has no bundles.
    pub async fn get_max_sequence(
        executor: impl sqlx::Executor<'_, Database = Postgres>,
        version_id: uuid::Uuid,
    ) -> Result<i64, RepoError> {
        sqlx::query_scalar::<_, i64>(
            r#"
                SELECT COALESCE(MAX(sequence_id), 0)::bigint
                FROM ota.bundles
                WHERE ota.bundles.version_id = $1
            "#,
        )
        .bind(version_id)
        .fetch_one(executor)
        .await
        .map_err(handle_sql_error)
    }

    /// Newest first.
    pub async fn get_all_by_version(
        executor: impl sqlx::Executor<'_, Database = Postgres>,
        version_id: uuid::Uuid,
    ) -> Result<Vec<Bundle>, RepoError> {
        sqlx::query_as::<_, Bundle>(
            r#"
                SELECT *
                FROM ota.bundles
                WHERE ota.bundles.version_id = $1
                ORDER BY sequence_id DESC
            "#,
        )
        .bind(version_id)
        .fetch_all(executor)
        .await
        .map_err(|err| {
            error!("Failed to retrieve bundles of version {version_id}: {err}");
            handle_sql_error(err)
        })
    }

    pub async fn create(
        executor: impl sqlx::Executor<'_, Database = Postgres>,
        bundle: NewBundle,
    ) -> Result<Bundle, RepoError> {
        sqlx::query_as::<_, Bundle>(
            r#"
                INSERT INTO ota.bundles
                  (
                    app_id,
                    environment_id,
                    version_id,
                    sequence_id,
                    hash,
                    label,
                    download_file,
                    size,
                    description,
                    created_by
                  )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
                RETURNING *
            "#,
        )
        .bind(bundle.app_id)
        .bind(bundle.environment_id)
        .bind(bundle.version_id)
        .bind(bundle.sequence_id)
        .bind(bundle.hash)
        .bind(bundle.label)
        .bind(bundle.download_file)
        .bind(bundle.size)
        .bind(bundle.description)
        .bind(bundle.created_by)
        .fetch_one(executor)
        .await
        .map_err(handle_sql_error)
    }

    pub async fn toggle_mandatory(
        executor: impl sqlx::Executor<'_, Database = Postgres>,
        id: uuid::Uuid,
    ) -> Result<Option<Bundle>, RepoError> {
        sqlx::query_as::<_, Bundle>(
            r#"
                UPDATE ota.bundles
                SET is_mandatory = NOT is_mandatory
                WHERE id = $1
                RETURNING *
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await
        .map_err(handle_sql_error)
    }

    pub async fn toggle_valid(
        executor: impl sqlx::Executor<'_, Database = Postgres>,
        id: uuid::Uuid,
    ) -> Result<Option<Bundle>, RepoError> {
        sqlx::query_as::<_, Bundle>(
            r#"
                UPDATE ota.bundles
                SET is_valid = NOT is_valid
                WHERE id = $1
                RETURNING *
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await
        .map_err(handle_sql_error)
    }

    /// Adds `delta` to one counter of the bundle identified by deployment key
    /// and label in a single statement. Returns `None` when no bundle matches.
    pub async fn increment_counter(
        executor: impl sqlx::Executor<'_, Database = Postgres>,
        environment_key: &str,
        label: &str,
        counter: Counter,
        delta: i64,
    ) -> Result<Option<uuid::Uuid>, RepoError> {
        let column = counter.column();
        let sql = format!(
            r#"
                UPDATE ota.bundles b
                SET {column} = b.{column} + $3
                FROM ota.environments e
                WHERE e.id = b.environment_id AND e.key = $1 AND b.label = $2
                RETURNING b.id
            "#
        );

        sqlx::query_scalar::<_, uuid::Uuid>(&sql)
            .bind(environment_key)
            .bind(label)
            .bind(delta)
            .fetch_optional(executor)
            .await
            .map_err(handle_sql_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_columns() {
        assert_eq!(Counter::Active.column(), "active");
        assert_eq!(Counter::Failed.column(), "failed");
        assert_eq!(Counter::Installed.column(), "installed");
    }
}
