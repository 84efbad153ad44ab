use crate::domain::block::BlockedUser;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, sqlx::FromRow)]
pub struct BlockedUserRecord {
    pub(crate) id: Uuid,
    pub(crate) blocker_id: Uuid,
    pub(crate) blocked_id: Uuid,
    pub(crate) reason: Option<String>,
    pub(crate) created_at: OffsetDateTime,
}

impl From<BlockedUserRecord> for BlockedUser {
    fn from(record: BlockedUserRecord) -> Self {
        Self {
            id: record.id,
            blocker_id: record.blocker_id,
            blocked_id: record.blocked_id,
            reason: record.reason,
            created_at: record.created_at,
        }
    }
}
