use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A deployment channel of an app ("dev", "staging", "prod").
///
/// Clients only ever see `key`; ids stay server side.
#[derive(Debug, Serialize, Deserialize, Clone, Default, sqlx::FromRow)]
pub struct Environment {
    pub id: uuid::Uuid,
    pub app_id: uuid::Uuid,
    pub name: String,
    pub key: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct NewEnvironment {
    pub app_id: uuid::Uuid,
    pub name: String,
    pub key: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct CreateEnvironmentRequest {
    pub app_name: String,
    pub name: String,
}
