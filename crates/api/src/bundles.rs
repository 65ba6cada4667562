use axum::extract::{Multipart, Path, Query, State};
use axum::{Extension, Json};
use axum_extra::extract::WithRejection;
use common::Principal;
use data::bundle::{Bundle, CreateBundleRequest, RollbackRequest};
use object_store::PutPayload;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{error, info};
use uuid::Uuid;

use crate::{error::ApiError, state::AppState};

#[derive(Debug, Deserialize)]
pub struct ListBundlesParams {
    pub version_id: Uuid,
}

pub struct BundlesApi;

impl BundlesApi {
    /// Multipart upload with a `file` part and an optional `filename` part;
    /// without the latter the file part's own name is used.
    pub async fn upload(
        State(state): State<AppState>,
        Extension(principal): Extension<Principal>,
        mut multipart: Multipart,
    ) -> Result<Json<Value>, ApiError> {
        let mut file_name = None;
        let mut content = None;

        while let Some(field) = multipart.next_field().await.map_err(|err| {
            error!("Failed to read multipart field: {}", err);
            ApiError::Failure("invalid multipart body".to_string())
        })? {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "file" => {
                    if file_name.is_none() {
                        file_name = field.file_name().map(str::to_string);
                    }
                    let bytes = field.bytes().await.map_err(|err| {
                        error!("Failed to read uploaded bundle: {}", err);
                        ApiError::Failure("failed to read file".to_string())
                    })?;
                    content = Some(bytes);
                }
                "filename" => {
                    let name = field.text().await.map_err(|err| {
                        error!("Failed to read file name: {}", err);
                        ApiError::Failure("failed to read filename".to_string())
                    })?;
                    file_name = Some(name);
                }
                _ => {}
            }
        }

        let content = content.ok_or_else(|| ApiError::Failure("missing file".to_string()))?;
        let file_name =
            file_name.ok_or_else(|| ApiError::Failure("missing filename".to_string()))?;

        let download_file = state
            .bundles
            .upload_bundle(&file_name, PutPayload::from(content))
            .await?;

        info!(
            event = "bundle-upload",
            by = %principal.name,
            download_file = %download_file,
            "AUDIT: bundle uploaded"
        );

        Ok(Json(json!({ "result": "ok", "download_file": download_file })))
    }

    pub async fn create(
        State(state): State<AppState>,
        Extension(principal): Extension<Principal>,
        WithRejection(Json(request), _): WithRejection<Json<CreateBundleRequest>, ApiError>,
    ) -> Result<Json<Bundle>, ApiError> {
        let bundle = state
            .sequencer
            .create_new_bundle(&request, &principal)
            .await?;
        Ok(Json(bundle))
    }

    pub async fn rollback(
        State(state): State<AppState>,
        Extension(principal): Extension<Principal>,
        WithRejection(Json(request), _): WithRejection<Json<RollbackRequest>, ApiError>,
    ) -> Result<Json<Value>, ApiError> {
        let bundle = state.rollback.rollback(&request, &principal).await?;
        Ok(Json(json!({ "result": "ok", "bundle": bundle })))
    }

    pub async fn list(
        State(state): State<AppState>,
        Extension(principal): Extension<Principal>,
        WithRejection(Query(params), _): WithRejection<Query<ListBundlesParams>, ApiError>,
    ) -> Result<Json<Vec<Bundle>>, ApiError> {
        let bundles = state
            .bundles
            .list_bundles(params.version_id, &principal)
            .await?;
        Ok(Json(bundles))
    }

    pub async fn get_by_label(
        State(state): State<AppState>,
        Extension(principal): Extension<Principal>,
        Path((environment_id, label)): Path<(Uuid, String)>,
    ) -> Result<Json<Bundle>, ApiError> {
        let bundle = state
            .bundles
            .get_bundle_by_label(environment_id, &label, &principal)
            .await?;
        Ok(Json(bundle))
    }

    pub async fn toggle_mandatory(
        State(state): State<AppState>,
        Extension(principal): Extension<Principal>,
        Path(bundle_id): Path<Uuid>,
    ) -> Result<Json<Bundle>, ApiError> {
        let bundle = state
            .bundles
            .toggle_mandatory(bundle_id, &principal)
            .await?;
        Ok(Json(bundle))
    }

    pub async fn toggle_valid(
        State(state): State<AppState>,
        Extension(principal): Extension<Principal>,
        Path(bundle_id): Path<Uuid>,
    ) -> Result<Json<Bundle>, ApiError> {
        let bundle = state.bundles.toggle_valid(bundle_id, &principal).await?;
        Ok(Json(bundle))
    }
}
