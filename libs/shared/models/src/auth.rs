use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const ADMIN_ROLE: &str = "admin";
pub const JWT_ALGORITHM: &str = "HS256";

#[derive(Debug, Serialize, Deserialize)]
pub struct JwtHeader {
    pub alg: String,
    pub typ: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: String,
    pub exp: Option<u64>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub app_metadata: Option<serde_json::Value>,
    pub user_metadata: Option<serde_json::Value>,
    pub aud: Option<String>,
    pub iat: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: Option<String>,
    pub role: Option<String>,
    pub metadata: Option<serde_json::Value>,
    pub created_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role.as_deref() == Some(ADMIN_ROLE)
    }

    /// Owners and admins may act on a user-scoped record.
    pub fn can_access(&self, owner_id: &str) -> bool {
        self.is_admin() || self.id == owner_id
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub valid: bool,
    pub user_id: String,
    pub email: Option<String>,
    pub role: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: &str, role: &str) -> User {
        User {
            id: id.to_string(),
            email: None,
            role: Some(role.to_string()),
            metadata: None,
            created_at: None,
        }
    }

    #[test]
    fn owner_and_admin_have_access() {
        assert!(user("u1", "authenticated").can_access("u1"));
        assert!(user("admin-1", "admin").can_access("u1"));
        assert!(!user("u2", "authenticated").can_access("u1"));
    }
}
