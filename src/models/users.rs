use serde::Serialize;
use uuid::Uuid;

/// Public projection of a user row, used for connection lists, pending
/// request senders, and suggestions.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub headline: Option<String>,
    pub location: Option<String>,
    pub avatar_url: Option<String>,
}

/// Credential row fetched during login. Never serialized.
#[derive(Debug, sqlx::FromRow)]
pub struct AuthUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
}
