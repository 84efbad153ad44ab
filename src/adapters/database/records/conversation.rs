use crate::domain::conversation::{Conversation, LastMessage};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, sqlx::FromRow)]
pub struct ConversationRecord {
    pub(crate) id: Uuid,
    pub(crate) user1_id: Uuid,
    pub(crate) user2_id: Uuid,
    pub(crate) last_message_id: Option<Uuid>,
    pub(crate) last_message_text: Option<String>,
    pub(crate) last_message_sender_id: Option<Uuid>,
    pub(crate) last_message_at: Option<OffsetDateTime>,
    pub(crate) user1_cleared_at: Option<OffsetDateTime>,
    pub(crate) user2_cleared_at: Option<OffsetDateTime>,
    pub(crate) created_at: OffsetDateTime,
    pub(crate) updated_at: OffsetDateTime,
}

impl From<ConversationRecord> for Conversation {
    fn from(record: ConversationRecord) -> Self {
        let last_message = match (record.last_message_id, record.last_message_sender_id, record.last_message_at) {
            (Some(id), Some(sender_id), Some(sent_at)) => {
                Some(LastMessage { id, text: record.last_message_text.unwrap_or_default(), sender_id, sent_at })
            }
            _ => None,
        };

        Self {
            id: record.id,
            user1_id: record.user1_id,
            user2_id: record.user2_id,
            last_message,
            user1_cleared_at: record.user1_cleared_at,
            user2_cleared_at: record.user2_cleared_at,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}
