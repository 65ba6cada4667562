use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// An uploaded artifact in a release line. Immutable after creation except
/// for the two flags and the rollout counters.
#[derive(Debug, Serialize, Deserialize, Clone, Default, sqlx::FromRow)]
pub struct Bundle {
    pub id: uuid::Uuid,
    pub app_id: uuid::Uuid,
    pub environment_id: uuid::Uuid,
    pub version_id: uuid::Uuid,
    pub sequence_id: i64,
    pub hash: String,
    pub label: String,
    pub download_file: String,
    pub size: i64,
    pub description: String,
    pub is_mandatory: bool,
    pub is_valid: bool,
    pub active: i64,
    pub failed: i64,
    pub installed: i64,
    pub created_by: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct NewBundle {
    pub app_id: uuid::Uuid,
    pub environment_id: uuid::Uuid,
    pub version_id: uuid::Uuid,
    pub sequence_id: i64,
    pub hash: String,
    pub label: String,
    pub download_file: String,
    pub size: i64,
    pub description: String,
    pub created_by: String,
}

impl Bundle {
    pub fn is_genesis(&self) -> bool {
        self.sequence_id == GENESIS_SEQUENCE_ID
    }
}

pub const GENESIS_SEQUENCE_ID: i64 = 1;

/// Client-facing bundle id, `v<version number>:<sequence id>`.
pub fn make_label(version_number: i64, sequence_id: i64) -> String {
    format!("v{version_number}:{sequence_id}")
}

/// Operator request to register an uploaded artifact.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct CreateBundleRequest {
    pub app_name: String,
    pub environment: String,
    pub download_file: String,
    #[serde(default)]
    pub description: String,
    pub app_version: String,
    pub size: i64,
    pub hash: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct RollbackRequest {
    pub app_id: String,
    pub environment_id: String,
    pub version_id: String,
}
