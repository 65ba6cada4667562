use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A release line: the bundles pushed for one native app version of one
/// environment.
#[derive(Debug, Serialize, Deserialize, Clone, Default, sqlx::FromRow)]
pub struct Version {
    pub id: uuid::Uuid,
    pub environment_id: uuid::Uuid,
    pub app_version: String,
    pub version_number: i64,
    pub current_bundle_id: Option<uuid::Uuid>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct NewVersion {
    /// Reserved up front so the genesis bundle can reference the version
    /// before it is inserted.
    pub id: uuid::Uuid,
    pub environment_id: uuid::Uuid,
    pub app_version: String,
    pub version_number: i64,
    pub current_bundle_id: Option<uuid::Uuid>,
}
