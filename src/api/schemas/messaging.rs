use crate::api::schemas::pagination::Pagination;
use crate::api::schemas::users::UserSummary;
use crate::domain::conversation::LastMessage as DomainLastMessage;
use crate::domain::message::{AttachmentMetadata, MessageType};
use crate::domain::privacy::Verdict;
use crate::services::messaging_service::{
    BlockedUserView, ConversationListItem as ListItemView, ConversationPage, ConversationView, MessagePage,
    MessageView, SendMessageRequest, UnreadSummary,
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct CreateConversation {
    pub recipient_id: Uuid,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListConversationsQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    #[serde(default)]
    pub unread_only: bool,
}

#[derive(Debug, Serialize)]
pub struct LastMessage {
    pub id: Uuid,
    pub content: String,
    pub sender_id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<DomainLastMessage> for LastMessage {
    fn from(last: DomainLastMessage) -> Self {
        Self { id: last.id, content: last.text, sender_id: last.sender_id, created_at: last.sent_at }
    }
}

#[derive(Debug, Serialize)]
pub struct Conversation {
    pub id: Uuid,
    pub participant: UserSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_message: Option<LastMessage>,
    pub unread_count: i64,
    pub is_blocked: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<ConversationView> for Conversation {
    fn from(view: ConversationView) -> Self {
        Self {
            id: view.conversation.id,
            participant: view.participant.into(),
            last_message: view.conversation.last_message.map(Into::into),
            unread_count: view.unread_count,
            is_blocked: view.is_blocked,
            created_at: view.conversation.created_at,
            updated_at: view.conversation.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ConversationListItem {
    pub id: Uuid,
    pub participant: UserSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_message: Option<LastMessage>,
    pub unread_count: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<ListItemView> for ConversationListItem {
    fn from(item: ListItemView) -> Self {
        Self {
            id: item.conversation.id,
            participant: item.participant.into(),
            last_message: item.conversation.last_message.map(Into::into),
            unread_count: item.unread_count,
            updated_at: item.conversation.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ConversationList {
    pub conversations: Vec<ConversationListItem>,
    pub pagination: Pagination,
}

impl From<ConversationPage> for ConversationList {
    fn from(page: ConversationPage) -> Self {
        let mut pagination = Pagination::from(page.pagination);
        pagination.total_unread = Some(page.total_unread);
        Self { conversations: page.conversations.into_iter().map(Into::into).collect(), pagination }
    }
}

#[derive(Debug, Deserialize)]
pub struct SendMessage {
    pub message_type: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub attachments: Vec<AttachmentMetadata>,
}

impl From<SendMessage> for SendMessageRequest {
    fn from(body: SendMessage) -> Self {
        Self { message_type: body.message_type, content: body.content, attachments: body.attachments }
    }
}

#[derive(Debug, Serialize)]
pub struct Message {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub sender: UserSummary,
    pub message_type: MessageType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<AttachmentMetadata>,
    pub status: &'static str,
    pub is_read: bool,
    #[serde(with = "time::serde::rfc3339::option", skip_serializing_if = "Option::is_none")]
    pub read_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<MessageView> for Message {
    fn from(view: MessageView) -> Self {
        let status = view.message.status();
        let message = view.message;
        Self {
            id: message.id,
            conversation_id: message.conversation_id,
            sender: view.sender.into(),
            message_type: message.message_type,
            content: message.content,
            attachments: message.attachments,
            status,
            is_read: message.is_read,
            read_at: message.read_at,
            created_at: message.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageList {
    pub messages: Vec<Message>,
    pub pagination: Pagination,
}

impl From<MessagePage> for MessageList {
    fn from(page: MessagePage) -> Self {
        Self { messages: page.messages.into_iter().map(Into::into).collect(), pagination: page.pagination.into() }
    }
}

#[derive(Debug, Serialize)]
pub struct UnreadCount {
    pub total_unread: i64,
    pub unread_conversations: i64,
}

impl From<UnreadSummary> for UnreadCount {
    fn from(summary: UnreadSummary) -> Self {
        Self { total_unread: summary.total_unread, unread_conversations: summary.unread_conversations }
    }
}

#[derive(Debug, Serialize)]
pub struct CanMessage {
    pub can_message: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<&'static str>,
}

impl From<Verdict> for CanMessage {
    fn from(verdict: Verdict) -> Self {
        Self { can_message: verdict.is_allowed(), reason: verdict.reason() }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct BlockUser {
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BlockedUser {
    pub id: Uuid,
    pub username: String,
    pub full_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub blocked_at: OffsetDateTime,
}

impl From<BlockedUserView> for BlockedUser {
    fn from(view: BlockedUserView) -> Self {
        Self {
            id: view.user.id,
            username: view.user.username,
            full_name: view.user.full_name,
            avatar_url: view.user.avatar_url,
            reason: view.reason,
            blocked_at: view.blocked_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BlockedUserList {
    pub blocked_users: Vec<BlockedUser>,
}
