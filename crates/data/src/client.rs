use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Answer to a client's update check. Field names are the wire names the
/// client SDK expects.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct UpdateInfo {
    pub download_url: String,
    pub description: String,
    pub is_available: bool,
    pub is_disabled: bool,
    pub target_binary_range: String,
    pub package_hash: String,
    pub label: String,
    pub package_size: i64,
    pub update_app_version: bool,
    pub should_run_binary_version: bool,
    pub is_mandatory: bool,
    pub rollout: i32,
}

#[derive(Debug, Serialize, Deserialize, Clone, EnumString, Display, PartialEq, Eq)]
pub enum DeployStatus {
    #[strum(serialize = "DeploymentSucceeded")]
    Succeeded,
    #[strum(serialize = "DeploymentFailed")]
    Failed,
    #[strum(default)]
    Other(String),
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct ReportDeployRequest {
    pub app_version: String,
    pub deployment_key: String,
    #[serde(default)]
    pub client_unique_id: String,
    pub label: String,
    pub status: String,
    pub previous_label_or_app_version: Option<String>,
    pub previous_deployment_key: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct ReportDownloadRequest {
    #[serde(default)]
    pub client_unique_id: String,
    pub deployment_key: String,
    pub label: String,
}
