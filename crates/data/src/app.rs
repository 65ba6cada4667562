use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

#[derive(Debug, Serialize, Deserialize, Clone, Default, sqlx::FromRow)]
pub struct App {
    pub id: uuid::Uuid,
    pub name: String,
    pub platform: Platform,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct NewApp {
    pub name: String,
    pub platform: Platform,
}

/// Operator request; `platform` is validated by the catalog.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct CreateAppRequest {
    pub name: String,
    pub platform: String,
}

#[derive(
    Debug, Serialize, Deserialize, Clone, Copy, EnumString, Display, Default, PartialEq, Eq, sqlx::Type,
)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "text", rename_all = "lowercase")]
pub enum Platform {
    #[default]
    #[strum(serialize = "ios")]
    Ios,
    #[strum(serialize = "android")]
    Android,
}
