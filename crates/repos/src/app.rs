use sqlx::{Postgres, QueryBuilder};
use tracing::error;

use crate::{
    QueryParams, Repo,
    error::{RepoError, handle_sql_error},
};
use data::app::{App, NewApp};

pub struct AppRepo {}

impl AppRepo {
    pub async fn get_by_id(
        executor: impl sqlx::Executor<'_, Database = Postgres>,
        id: uuid::Uuid,
    ) -> Result<Option<App>, RepoError> {
        sqlx::query_as::<_, App>(
            r#"
                SELECT *
                FROM ota.apps
                WHERE ota.apps.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await
        .map_err(handle_sql_error)
    }

    pub async fn get_by_name(
        executor: impl sqlx::Executor<'_, Database = Postgres>,
        name: &str,
    ) -> Result<Option<App>, RepoError> {
        sqlx::query_as::<_, App>(
            r#"
                SELECT *
                FROM ota.apps
                WHERE ota.apps.name = $1
            "#,
        )
        .bind(name)
        .fetch_optional(executor)
        .await
        .map_err(handle_sql_error)
    }

    pub async fn get_all(
        executor: impl sqlx::Executor<'_, Database = Postgres>,
        params: QueryParams,
    ) -> Result<Vec<App>, RepoError> {
        let mut builder = QueryBuilder::new("SELECT * FROM ota.apps");
        Repo::build_query(
            &mut builder,
            &params,
            &["id", "name", "platform", "created_at", "updated_at"],
            &["name"],
        )?;

        let query = builder.build_query_as();

        query.fetch_all(executor).await.map_err(|err| {
            error!("Failed to retrieve all apps: {err}");
            handle_sql_error(err)
        })
    }

    pub async fn create(
        executor: impl sqlx::Executor<'_, Database = Postgres>,
        app: NewApp,
    ) -> Result<App, RepoError> {
        sqlx::query_as::<_, App>(
            r#"
                INSERT INTO ota.apps
                  (
                    name,
                    platform
                  )
                VALUES ($1, $2)
                RETURNING *
            "#,
        )
        .bind(app.name)
        .bind(app.platform)
        .fetch_one(executor)
        .await
        .map_err(handle_sql_error)
    }
}
