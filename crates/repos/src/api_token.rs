use sqlx::Postgres;
use tracing::error;
use uuid::Uuid;

use crate::error::{RepoError, handle_sql_error};
use data::api_token::{ApiToken, NewApiToken};

pub struct ApiTokenRepo {}

impl ApiTokenRepo {
    pub async fn get_by_token_id(
        executor: impl sqlx::Executor<'_, Database = Postgres>,
        token_id: Uuid,
    ) -> Result<Option<ApiToken>, RepoError> {
        sqlx::query_as::<_, ApiToken>(
            r#"
                SELECT *
                FROM ota.api_tokens
                WHERE ota.api_tokens.token_id = $1
            "#,
        )
        .bind(token_id)
        .fetch_optional(executor)
        .await
        .map_err(|err| {
            error!("Failed to retrieve API token by token id: {err}");
            handle_sql_error(err)
        })
    }

    pub async fn update_last_used(
        executor: impl sqlx::Executor<'_, Database = Postgres>,
        id: Uuid,
    ) -> Result<(), RepoError> {
        sqlx::query(
            r#"
                UPDATE ota.api_tokens
                SET last_used_at = now()
                WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(executor)
        .await
        .map_err(|err| {
            error!("Failed to update last_used_at for token {id}: {err}");
            handle_sql_error(err)
        })?;

        Ok(())
    }

    pub async fn count(
        executor: impl sqlx::Executor<'_, Database = Postgres>,
    ) -> Result<i64, RepoError> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM ota.api_tokens")
            .fetch_one(executor)
            .await
            .map_err(handle_sql_error)
    }

    pub async fn create(
        executor: impl sqlx::Executor<'_, Database = Postgres>,
        new_token: NewApiToken,
    ) -> Result<Uuid, RepoError> {
        sqlx::query_scalar::<_, Uuid>(
            r#"
                INSERT INTO ota.api_tokens
                  (
                    description,
                    token_id,
                    token_hash,
                    app_id,
                    entitlements,
                    expires_at
                  )
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING
                  id
            "#,
        )
        .bind(new_token.description)
        .bind(new_token.token_id)
        .bind(new_token.token_hash)
        .bind(new_token.app_id)
        .bind(new_token.entitlements)
        .bind(new_token.expires_at)
        .fetch_one(executor)
        .await
        .map_err(|err| {
            error!("Failed to create API token: {err}");
            handle_sql_error(err)
        })
    }

    pub async fn revoke(
        executor: impl sqlx::Executor<'_, Database = Postgres>,
        id: Uuid,
    ) -> Result<(), RepoError> {
        sqlx::query(
            r#"
                UPDATE ota.api_tokens
                SET is_active = false
                WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(executor)
        .await
        .map_err(handle_sql_error)?;

        Ok(())
    }
}
