use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const ENTITLEMENT_BUNDLE_PUSH: &str = "bundle-push";
pub const ENTITLEMENT_BUNDLE_ROLLBACK: &str = "bundle-rollback";
pub const ENTITLEMENT_ADMIN: &str = "admin";

/// An auth key allowed to call operator endpoints.
#[derive(Debug, Serialize, Deserialize, Clone, sqlx::FromRow)]
pub struct ApiToken {
    pub id: Uuid,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub description: String,
    pub token_id: Uuid,
    pub token_hash: String,
    pub app_id: Option<Uuid>,
    pub entitlements: Vec<String>,
    pub last_used_at: Option<NaiveDateTime>,
    pub expires_at: Option<NaiveDateTime>,
    pub is_active: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct NewApiToken {
    pub description: String,
    pub token_id: Uuid,
    pub token_hash: String,
    pub app_id: Option<Uuid>,
    pub entitlements: Vec<String>,
    pub expires_at: Option<NaiveDateTime>,
}

impl ApiToken {
    pub fn has_entitlement(&self, required_entitlement: &str) -> bool {
        self.entitlements
            .iter()
            .any(|entitlement| entitlement == required_entitlement)
    }

    pub fn is_valid(&self) -> bool {
        if !self.is_active {
            return false;
        }

        match self.expires_at {
            Some(expires_at) => expires_at >= Utc::now().naive_utc(),
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn token(entitlements: &[&str]) -> ApiToken {
        let now = Utc::now().naive_utc();
        ApiToken {
            id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            description: "ci".to_string(),
            token_id: Uuid::new_v4(),
            token_hash: String::new(),
            app_id: None,
            entitlements: entitlements.iter().map(|e| e.to_string()).collect(),
            last_used_at: None,
            expires_at: None,
            is_active: true,
        }
    }

    #[test]
    fn test_entitlements() {
        let token = token(&[ENTITLEMENT_BUNDLE_PUSH]);
        assert!(token.has_entitlement(ENTITLEMENT_BUNDLE_PUSH));
        assert!(!token.has_entitlement(ENTITLEMENT_BUNDLE_ROLLBACK));
    }

    #[test]
    fn test_expired_or_inactive_token_is_invalid() {
        let mut token = token(&[]);
        assert!(token.is_valid());

        token.expires_at = Some(Utc::now().naive_utc() - Duration::minutes(1));
        assert!(!token.is_valid());

        token.expires_at = None;
        token.is_active = false;
        assert!(!token.is_valid());
    }
}
