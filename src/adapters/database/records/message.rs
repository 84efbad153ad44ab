use crate::domain::message::{AttachmentMetadata, Message, MessageType};
use sqlx::types::Json;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, sqlx::FromRow)]
pub struct MessageRecord {
    pub(crate) id: Uuid,
    pub(crate) conversation_id: Uuid,
    pub(crate) sender_id: Uuid,
    pub(crate) message_type: String,
    pub(crate) content: Option<String>,
    pub(crate) attachments: Option<Json<Vec<AttachmentMetadata>>>,
    pub(crate) is_read: bool,
    pub(crate) read_at: Option<OffsetDateTime>,
    pub(crate) created_at: OffsetDateTime,
}

impl TryFrom<MessageRecord> for Message {
    type Error = String;

    fn try_from(record: MessageRecord) -> Result<Self, Self::Error> {
        let message_type = record.message_type.parse::<MessageType>()?;
        Ok(Self {
            id: record.id,
            conversation_id: record.conversation_id,
            sender_id: record.sender_id,
            message_type,
            content: record.content,
            attachments: record.attachments.map(|Json(a)| a).unwrap_or_default(),
            is_read: record.is_read,
            read_at: record.read_at,
            created_at: record.created_at,
        })
    }
}
