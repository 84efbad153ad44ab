use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct Registration {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub full_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Login {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct Refresh {
    pub refresh_token: String,
}

#[derive(Debug, Deserialize)]
pub struct Logout {
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
pub struct AuthSession {
    pub user_id: Uuid,
    pub token: String,
    pub refresh_token: String,
    pub expires_at: i64,
}

impl From<crate::domain::auth_session::AuthSession> for AuthSession {
    fn from(session: crate::domain::auth_session::AuthSession) -> Self {
        Self {
            user_id: session.user_id,
            token: session.token,
            refresh_token: session.refresh_token,
            expires_at: session.expires_at,
        }
    }
}
