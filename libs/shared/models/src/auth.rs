use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Roles allowed to create, edit or delete doctor schedules.
pub const STAFF_ROLES: &[&str] = &["admin", "staff"];

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
    pub fn is_staff(&self) -> bool {
        self.role
            .as_deref()
            .map(|role| STAFF_ROLES.iter().any(|staff| staff.eq_ignore_ascii_case(role)))
            .unwrap_or(false)
    }
}
