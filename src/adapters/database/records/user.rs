use crate::domain::user::{User, WhoCanMessage};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, sqlx::FromRow)]
pub struct UserRecord {
    pub(crate) id: Uuid,
    pub(crate) username: String,
    pub(crate) password_hash: String,
    pub(crate) full_name: String,
    pub(crate) avatar_url: Option<String>,
    pub(crate) who_can_message: String,
    pub(crate) created_at: OffsetDateTime,
}

impl From<UserRecord> for User {
    fn from(record: UserRecord) -> Self {
        let who_can_message = record.who_can_message.parse().unwrap_or_else(|e| {
            tracing::warn!(user_id = %record.id, error = %e, "Unrecognized messaging privacy setting, treating as everyone");
            WhoCanMessage::Everyone
        });

        Self {
            id: record.id,
            username: record.username,
            password_hash: record.password_hash,
            full_name: record.full_name,
            avatar_url: record.avatar_url,
            who_can_message,
            created_at: record.created_at,
        }
    }
}
