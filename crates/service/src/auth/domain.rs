use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use common::validation::DEFAULT_ROLE;

/// Login input. Missing fields deserialize as empty strings so the HTTP
/// boundary can reject them with a readable message.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginInput {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Registration input
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterInput {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirm_password: Option<String>,
}

/// Public view of an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub role: String,
}

/// Stored password hash for a user.
#[derive(Debug, Clone)]
pub struct StoredCredentials {
    pub user_id: Uuid,
    pub password_hash: String,
    pub password_algorithm: String,
}

/// Result of a successful login or registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    pub user: UserProfile,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

/// JWT claims issued on login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    pub sub: String,
    pub uid: Uuid,
    pub role: String,
    pub iat: usize,
    pub exp: usize,
}

/// Emails are compared case-insensitively and without surrounding whitespace.
pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}
