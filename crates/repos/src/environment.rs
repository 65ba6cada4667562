use sqlx::Postgres;

use crate::error::{RepoError, handle_sql_error};
use data::environment::{Environment, NewEnvironment};

pub struct EnvironmentRepo {}

impl EnvironmentRepo {
    pub async fn get_by_id(
        executor: impl sqlx::Executor<'_, Database = Postgres>,
        id: uuid::Uuid,
    ) -> Result<Option<Environment>, RepoError> {
        sqlx::query_as::<_, Environment>(
            r#"
                SELECT *
                FROM ota.environments
                WHERE ota.environments.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await
        .map_err(handle_sql_error)
    }

    pub async fn get_by_app_and_id(
        executor: impl sqlx::Executor<'_, Database = Postgres>,
        app_id: uuid::Uuid,
        id: uuid::Uuid,
    ) -> Result<Option<Environment>, RepoError> {
        sqlx::query_as::<_, Environment>(
            r#"
                SELECT *
                FROM ota.environments
                WHERE ota.environments.id = $1 AND ota.environments.app_id = $2
            "#,
        )
        .bind(id)
        .bind(app_id)
        .fetch_optional(executor)
        .await
        .map_err(handle_sql_error)
    }

    pub async fn get_by_app_and_name(
        executor: impl sqlx::Executor<'_, Database = Postgres>,
        app_id: uuid::Uuid,
        name: &str,
    ) -> Result<Option<Environment>, RepoError> {
        sqlx::query_as::<_, Environment>(
            r#"
                SELECT *
                FROM ota.environments
                WHERE ota.environments.app_id = $1 AND ota.environments.name = $2
            "#,
        )
        .bind(app_id)
        .bind(name)
        .fetch_optional(executor)
        .await
        .map_err(handle_sql_error)
    }

    pub async fn get_by_key(
        executor: impl sqlx::Executor<'_, Database = Postgres>,
        key: &str,
    ) -> Result<Option<Environment>, RepoError> {
        sqlx::query_as::<_, Environment>(
            r#"
                SELECT *
                FROM ota.environments
                WHERE ota.environments.key = $1
            "#,
        )
        .bind(key)
        .fetch_optional(executor)
        .await
        .map_err(handle_sql_error)
    }

    pub async fn get_all_by_app(
        executor: impl sqlx::Executor<'_, Database = Postgres>,
        app_id: uuid::Uuid,
    ) -> Result<Vec<Environment>, RepoError> {
        sqlx::query_as::<_, Environment>(
            r#"
                SELECT *
                FROM ota.environments
                WHERE ota.environments.app_id = $1
                ORDER BY name
            "#,
        )
        .bind(app_id)
        .fetch_all(executor)
        .await
        .map_err(handle_sql_error)
    }

    pub async fn create(
        executor: impl sqlx::Executor<'_, Database = Postgres>,
        environment: NewEnvironment,
    ) -> Result<Environment, RepoError> {
        sqlx::query_as::<_, Environment>(
            r#"
                INSERT INTO ota.environments
                  (
                    app_id,
                    name,
                    key
                  )
                VALUES ($1, $2, $3)
                RETURNING *
            "#,
        )
        .bind(environment.app_id)
        .bind(environment.name)
        .bind(environment.key)
        .fetch_one(executor)
        .await
        .map_err(handle_sql_error)
    }
}
