use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use data::client::{ReportDeployRequest, ReportDownloadRequest, UpdateInfo};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::state::AppState;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct UpdateCheckParams {
    pub deployment_key: String,
    pub app_version: String,
    pub package_hash: String,
}

#[derive(Debug, Serialize)]
pub struct UpdateCheckResponse {
    pub update_info: Option<UpdateInfo>,
}

/// Endpoints called by devices. They always answer 200 so a misbehaving
/// server never blocks an app from starting.
pub struct ClientApi;

impl ClientApi {
    pub async fn update_check(
        State(state): State<AppState>,
        Query(params): Query<UpdateCheckParams>,
    ) -> Json<UpdateCheckResponse> {
        let update_info = state
            .decision
            .check_update(
                &params.deployment_key,
                &params.app_version,
                &params.package_hash,
            )
            .await;

        Json(UpdateCheckResponse { update_info })
    }

    pub async fn report_deploy(
        State(state): State<AppState>,
        report: Result<Json<ReportDeployRequest>, JsonRejection>,
    ) -> &'static str {
        match report {
            Ok(Json(report)) => {
                if let Err(err) = state.telemetry.report_deploy(&report).await {
                    warn!(label = %report.label, status = %report.status, "Deploy report dropped: {err}");
                }
            }
            Err(err) => warn!("Malformed deploy report: {err}"),
        }
        "OK"
    }

    pub async fn report_download(
        State(state): State<AppState>,
        report: Result<Json<ReportDownloadRequest>, JsonRejection>,
    ) -> &'static str {
        match report {
            Ok(Json(report)) => {
                if let Err(err) = state.telemetry.report_download(&report).await {
                    warn!(label = %report.label, "Download report dropped: {err}");
                }
            }
            Err(err) => warn!("Malformed download report: {err}"),
        }
        "OK"
    }
}
