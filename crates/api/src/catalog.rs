use std::collections::VecDeque;

use axum::extract::{Path, Query, State};
use axum::{Extension, Json};
use axum_extra::extract::WithRejection;
use common::{Principal, QueryParams, SortOrder};
use data::app::{App, CreateAppRequest};
use data::environment::{CreateEnvironmentRequest, Environment};
use data::version::Version;
use serde::Deserialize;
use uuid::Uuid;

use crate::{error::ApiError, state::AppState};

const DEFAULT_PAGE_SIZE: usize = 100;

#[derive(Debug, Deserialize, Default)]
pub struct ListAppsParams {
    pub filter: Option<String>,
    pub sort: Option<String>,
    #[serde(default)]
    pub descending: bool,
    #[serde(default)]
    pub offset: usize,
    pub limit: Option<usize>,
}

impl From<ListAppsParams> for QueryParams {
    fn from(params: ListAppsParams) -> Self {
        let order = if params.descending {
            SortOrder::Descending
        } else {
            SortOrder::Ascending
        };
        let sort = params.sort.unwrap_or_else(|| "name".to_string());
        let limit = params.limit.unwrap_or(DEFAULT_PAGE_SIZE);

        QueryParams {
            sorting: VecDeque::from([(sort, order)]),
            range: Some(params.offset..params.offset + limit),
            filter: params.filter.filter(|f| !f.is_empty()),
        }
    }
}

pub struct CatalogApi;

impl CatalogApi {
    pub async fn create_app(
        State(state): State<AppState>,
        Extension(principal): Extension<Principal>,
        WithRejection(Json(request), _): WithRejection<Json<CreateAppRequest>, ApiError>,
    ) -> Result<Json<App>, ApiError> {
        Ok(Json(state.catalog.create_app(&request, &principal).await?))
    }

    pub async fn list_apps(
        State(state): State<AppState>,
        Extension(principal): Extension<Principal>,
        WithRejection(Query(params), _): WithRejection<Query<ListAppsParams>, ApiError>,
    ) -> Result<Json<Vec<App>>, ApiError> {
        Ok(Json(
            state.catalog.list_apps(params.into(), &principal).await?,
        ))
    }

    pub async fn create_environment(
        State(state): State<AppState>,
        Extension(principal): Extension<Principal>,
        WithRejection(Json(request), _): WithRejection<Json<CreateEnvironmentRequest>, ApiError>,
    ) -> Result<Json<Environment>, ApiError> {
        Ok(Json(
            state
                .catalog
                .create_environment(&request, &principal)
                .await?,
        ))
    }

    pub async fn list_environments(
        State(state): State<AppState>,
        Extension(principal): Extension<Principal>,
        Path(app_id): Path<Uuid>,
    ) -> Result<Json<Vec<Environment>>, ApiError> {
        Ok(Json(
            state.catalog.list_environments(app_id, &principal).await?,
        ))
    }

    pub async fn list_versions(
        State(state): State<AppState>,
        Extension(principal): Extension<Principal>,
        Path(environment_id): Path<Uuid>,
    ) -> Result<Json<Vec<Version>>, ApiError> {
        Ok(Json(
            state
                .catalog
                .list_versions(environment_id, &principal)
                .await?,
        ))
    }
}
