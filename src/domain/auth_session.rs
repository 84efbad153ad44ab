use uuid::Uuid;

/// Tokens handed to a client after register, login or refresh.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub user_id: Uuid,
    pub token: String,
    pub refresh_token: String,
    pub expires_at: i64,
}
