use crate::adapters::database::DbPool;
use crate::adapters::database::block_repo::BlockRepository;
use crate::adapters::database::conversation_repo::ConversationRepository;
use crate::adapters::database::message_repo::MessageRepository;
use crate::adapters::database::user_repo::UserRepository;
use crate::config::MessagingConfig;
use crate::domain::conversation::Conversation;
use crate::domain::message::{AttachmentMetadata, Message, MessageLimits, MessageType, OutgoingMessage};
use crate::domain::pagination::{PageRequest, Pagination};
use crate::domain::privacy::Verdict;
use crate::domain::user::{User, UserSummary};
use crate::error::{AppError, Result};
use crate::services::privacy_gate::PrivacyGate;
use opentelemetry::{KeyValue, global, metrics::Counter};
use sqlx::PgConnection;
use std::collections::HashMap;
use time::OffsetDateTime;
use uuid::Uuid;

const MAX_BLOCK_REASON_LENGTH: usize = 500;
const NOT_A_PARTICIPANT: &str = "You are not a participant in this conversation";

#[derive(Clone, Debug)]
struct Metrics {
    messages_sent_total: Counter<u64>,
    conversations_opened_total: Counter<u64>,
    privacy_denials_total: Counter<u64>,
    blocks_total: Counter<u64>,
}

impl Metrics {
    fn new() -> Self {
        let meter = global::meter("rapport-server");
        Self {
            messages_sent_total: meter
                .u64_counter("messages_sent_total")
                .with_description("Total messages stored, by message type")
                .build(),
            conversations_opened_total: meter
                .u64_counter("conversations_opened_total")
                .with_description("Conversations created on first contact")
                .build(),
            privacy_denials_total: meter
                .u64_counter("privacy_denials_total")
                .with_description("Send or open attempts rejected by the privacy gate")
                .build(),
            blocks_total: meter
                .u64_counter("blocks_total")
                .with_description("Block and unblock operations")
                .build(),
        }
    }
}

/// A conversation as seen by one participant.
#[derive(Debug, Clone)]
pub struct ConversationView {
    pub conversation: Conversation,
    pub participant: UserSummary,
    pub unread_count: i64,
    pub is_blocked: bool,
}

#[derive(Debug, Clone)]
pub struct ConversationListItem {
    pub conversation: Conversation,
    pub participant: UserSummary,
    pub unread_count: i64,
}

#[derive(Debug, Clone)]
pub struct ConversationPage {
    pub conversations: Vec<ConversationListItem>,
    pub pagination: Pagination,
    pub total_unread: i64,
}

#[derive(Debug, Clone)]
pub struct MessageView {
    pub message: Message,
    pub sender: UserSummary,
}

#[derive(Debug, Clone)]
pub struct MessagePage {
    pub messages: Vec<MessageView>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnreadSummary {
    pub total_unread: i64,
    pub unread_conversations: i64,
}

#[derive(Debug, Clone)]
pub struct BlockedUserView {
    pub user: UserSummary,
    pub reason: Option<String>,
    pub blocked_at: OffsetDateTime,
}

/// A send request before type-specific validation.
#[derive(Debug, Clone, Default)]
pub struct SendMessageRequest {
    pub message_type: String,
    pub content: Option<String>,
    pub attachments: Vec<AttachmentMetadata>,
}

#[derive(Clone, Debug)]
pub struct MessagingService {
    pool: DbPool,
    config: MessagingConfig,
    user_repo: UserRepository,
    conversation_repo: ConversationRepository,
    message_repo: MessageRepository,
    block_repo: BlockRepository,
    privacy_gate: PrivacyGate,
    metrics: Metrics,
}

impl MessagingService {
    #[must_use]
    pub fn new(
        pool: DbPool,
        config: MessagingConfig,
        user_repo: UserRepository,
        conversation_repo: ConversationRepository,
        message_repo: MessageRepository,
        block_repo: BlockRepository,
        privacy_gate: PrivacyGate,
    ) -> Self {
        Self {
            pool,
            config,
            user_repo,
            conversation_repo,
            message_repo,
            block_repo,
            privacy_gate,
            metrics: Metrics::new(),
        }
    }

    const fn limits(&self) -> MessageLimits {
        MessageLimits {
            max_text_length: self.config.max_text_length,
            max_attachments: self.config.max_attachments,
            preview_length: self.config.preview_length,
        }
    }

    /// Opens the conversation with `recipient_id`, creating it on first permitted contact.
    ///
    /// # Errors
    /// Returns `AppError::BadRequest` for a conversation with oneself.
    /// Returns `AppError::NotFound` if the recipient does not exist.
    /// Returns `AppError::Forbidden` with the gate's reason when contact is not allowed.
    #[tracing::instrument(err(level = "warn"), skip(self))]
    pub async fn create_or_get_conversation(&self, user_id: Uuid, recipient_id: Uuid) -> Result<ConversationView> {
        if user_id == recipient_id {
            return Err(AppError::BadRequest("Cannot create conversation with yourself".into()));
        }

        let mut conn = self.pool.acquire().await?;
        let recipient = self
            .user_repo
            .find_by_id(&mut conn, recipient_id)
            .await?
            .ok_or(AppError::NotFound("Recipient not found"))?;

        let existing = self.conversation_repo.get_by_participants(&mut conn, user_id, recipient_id).await?;

        let verdict = self.privacy_gate.can_message(&mut conn, user_id, recipient_id, existing.is_some()).await?;
        self.enforce(verdict)?;

        let conversation = match existing {
            Some(conversation) => conversation,
            None => {
                let conversation = self.conversation_repo.create_or_get(&mut conn, user_id, recipient_id).await?;
                tracing::info!(conversation_id = %conversation.id, "Conversation opened");
                self.metrics.conversations_opened_total.add(1, &[]);
                conversation
            }
        };

        self.view_for(&mut conn, conversation, user_id, recipient).await
    }

    /// Lists the user's conversations. `unread_only` filters the fetched page, so the
    /// pagination metadata still describes the unfiltered list.
    #[tracing::instrument(err(level = "warn"), skip(self))]
    pub async fn get_conversations(
        &self,
        user_id: Uuid,
        page: Option<i64>,
        limit: Option<i64>,
        unread_only: bool,
    ) -> Result<ConversationPage> {
        let request = PageRequest::normalize(
            page,
            limit,
            self.config.conversations_page_size,
            self.config.conversations_max_page_size,
        );

        let mut conn = self.pool.acquire().await?;
        let (rows, total) =
            self.conversation_repo.list_for_user(&mut conn, user_id, request.limit, request.offset()).await?;
        let total_unread = self.message_repo.unread_count(&mut conn, user_id).await?;

        let participant_ids: Vec<Uuid> = rows.iter().map(|(c, _)| c.recipient_id(user_id)).collect();
        let participants = self.summaries(&mut conn, &participant_ids).await?;

        let conversations = rows
            .into_iter()
            .filter(|(_, unread_count)| !unread_only || *unread_count > 0)
            .filter_map(|(conversation, unread_count)| {
                let participant_id = conversation.recipient_id(user_id);
                let Some(participant) = participants.get(&participant_id).cloned() else {
                    tracing::warn!(conversation_id = %conversation.id, "Skipping conversation with missing participant");
                    return None;
                };
                Some(ConversationListItem { conversation: conversation.visible_to(user_id), participant, unread_count })
            })
            .collect();

        Ok(ConversationPage { conversations, pagination: request.paginate(total), total_unread })
    }

    #[tracing::instrument(err(level = "warn"), skip(self))]
    pub async fn get_conversation(&self, conversation_id: Uuid, user_id: Uuid) -> Result<ConversationView> {
        let mut conn = self.pool.acquire().await?;
        let conversation = self.participant_conversation(&mut conn, conversation_id, user_id).await?;

        let recipient = self
            .user_repo
            .find_by_id(&mut conn, conversation.recipient_id(user_id))
            .await?
            .ok_or(AppError::NotFound("Recipient not found"))?;

        self.view_for(&mut conn, conversation, user_id, recipient).await
    }

    /// Clears the conversation for `user_id` only: their unread messages become read, the
    /// thread leaves their list until a newer message arrives, and older history stays
    /// hidden from them. The other participant sees no change.
    #[tracing::instrument(err(level = "warn"), skip(self))]
    pub async fn delete_conversation(&self, conversation_id: Uuid, user_id: Uuid) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        self.participant_conversation(&mut tx, conversation_id, user_id).await?;

        self.conversation_repo.clear_for_user(&mut tx, conversation_id, user_id).await?;
        let marked = self.message_repo.mark_conversation_read(&mut tx, conversation_id, user_id).await?;
        tx.commit().await?;

        tracing::info!(marked_read = marked, "Conversation cleared for participant");
        Ok(())
    }

    /// Validates and stores a message, refreshing the conversation preview in the same
    /// transaction.
    ///
    /// # Errors
    /// Returns `AppError::BadRequest` when the message fails type-specific validation.
    /// Returns `AppError::NotFound` if the conversation does not exist.
    /// Returns `AppError::Forbidden` for non-participants and blocked pairs.
    #[tracing::instrument(
        err(level = "warn"),
        skip(self, request),
        fields(message_type = %request.message_type, message_id = tracing::field::Empty)
    )]
    pub async fn send_message(
        &self,
        conversation_id: Uuid,
        sender_id: Uuid,
        request: SendMessageRequest,
    ) -> Result<MessageView> {
        let limits = self.limits();
        let message_type = request.message_type.parse::<MessageType>().map_err(AppError::BadRequest)?;
        let outgoing = OutgoingMessage::validate(message_type, request.content, request.attachments, &limits)
            .map_err(AppError::BadRequest)?;

        let mut tx = self.pool.begin().await?;
        let conversation = self.participant_conversation(&mut tx, conversation_id, sender_id).await?;

        let verdict = self
            .privacy_gate
            .can_message(&mut tx, sender_id, conversation.recipient_id(sender_id), true)
            .await?;
        self.enforce(verdict)?;

        let message = self.message_repo.create(&mut tx, conversation_id, sender_id, &outgoing).await?;
        self.conversation_repo
            .update_last_message(
                &mut tx,
                conversation_id,
                message.id,
                &outgoing.preview_text(limits.preview_length),
                sender_id,
                message.created_at,
            )
            .await?;

        let sender = self.user_repo.find_by_id(&mut tx, sender_id).await?.ok_or(AppError::AuthError)?;
        tx.commit().await?;

        tracing::Span::current().record("message_id", tracing::field::display(message.id));
        tracing::debug!("Message stored");
        self.metrics.messages_sent_total.add(1, &[KeyValue::new("type", message_type.as_str())]);

        Ok(MessageView { message, sender: sender.summary() })
    }

    /// Newest-first page of the messages visible to `user_id`.
    #[tracing::instrument(err(level = "warn"), skip(self))]
    pub async fn get_messages(
        &self,
        conversation_id: Uuid,
        user_id: Uuid,
        page: Option<i64>,
        limit: Option<i64>,
    ) -> Result<MessagePage> {
        let request =
            PageRequest::normalize(page, limit, self.config.messages_page_size, self.config.messages_max_page_size);

        let mut conn = self.pool.acquire().await?;
        let conversation = self.participant_conversation(&mut conn, conversation_id, user_id).await?;

        let (messages, total) = self
            .message_repo
            .list_for_conversation(
                &mut conn,
                conversation_id,
                conversation.cleared_at_for(user_id),
                request.limit,
                request.offset(),
            )
            .await?;

        let senders = self.summaries(&mut conn, &[conversation.user1_id, conversation.user2_id]).await?;
        let messages = messages
            .into_iter()
            .filter_map(|message| {
                let sender = senders.get(&message.sender_id).cloned()?;
                Some(MessageView { message, sender })
            })
            .collect();

        Ok(MessagePage { messages, pagination: request.paginate(total) })
    }

    /// Soft-deletes a message. Only its sender may do this.
    #[tracing::instrument(err(level = "warn"), skip(self))]
    pub async fn delete_message(&self, message_id: Uuid, user_id: Uuid) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        let message =
            self.message_repo.get_by_id(&mut conn, message_id).await?.ok_or(AppError::NotFound("Message not found"))?;

        if message.sender_id != user_id {
            return Err(AppError::Forbidden("You can only delete your own messages"));
        }

        if !self.message_repo.soft_delete(&mut conn, message_id, user_id).await? {
            return Err(AppError::NotFound("Message not found"));
        }
        Ok(())
    }

    #[tracing::instrument(err(level = "warn"), skip(self))]
    pub async fn mark_conversation_read(&self, conversation_id: Uuid, user_id: Uuid) -> Result<u64> {
        let mut conn = self.pool.acquire().await?;
        self.participant_conversation(&mut conn, conversation_id, user_id).await?;
        self.message_repo.mark_conversation_read(&mut conn, conversation_id, user_id).await
    }

    /// # Errors
    /// Returns `AppError::BadRequest` when the reader sent the message.
    #[tracing::instrument(err(level = "warn"), skip(self))]
    pub async fn mark_message_read(&self, message_id: Uuid, user_id: Uuid) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        let message =
            self.message_repo.get_by_id(&mut conn, message_id).await?.ok_or(AppError::NotFound("Message not found"))?;

        if message.sender_id == user_id {
            return Err(AppError::BadRequest("Cannot mark your own message as read".into()));
        }
        self.participant_conversation(&mut conn, message.conversation_id, user_id).await?;

        self.message_repo.mark_read(&mut conn, message_id, user_id).await?;
        Ok(())
    }

    #[tracing::instrument(err(level = "warn"), skip(self))]
    pub async fn unread_count(&self, user_id: Uuid) -> Result<UnreadSummary> {
        let mut conn = self.pool.acquire().await?;
        let total_unread = self.message_repo.unread_count(&mut conn, user_id).await?;
        let unread_conversations = self.message_repo.unread_conversations_count(&mut conn, user_id).await?;
        Ok(UnreadSummary { total_unread, unread_conversations })
    }

    /// Runs the privacy gate without side effects.
    ///
    /// # Errors
    /// Returns `AppError::NotFound` if the recipient does not exist.
    #[tracing::instrument(err(level = "warn"), skip(self))]
    pub async fn can_message(&self, sender_id: Uuid, recipient_id: Uuid) -> Result<Verdict> {
        let mut conn = self.pool.acquire().await?;
        if !self.user_repo.exists(&mut conn, recipient_id).await? {
            return Err(AppError::NotFound("User not found"));
        }

        let existing = self.conversation_repo.get_by_participants(&mut conn, sender_id, recipient_id).await?;
        self.privacy_gate.can_message(&mut conn, sender_id, recipient_id, existing.is_some()).await
    }

    /// Blocks future sends between the pair. Existing history is left untouched.
    #[tracing::instrument(err(level = "warn"), skip(self, reason))]
    pub async fn block_user(&self, blocker_id: Uuid, blocked_id: Uuid, reason: Option<String>) -> Result<()> {
        if blocker_id == blocked_id {
            return Err(AppError::BadRequest("Cannot block yourself".into()));
        }
        let reason = reason.map(|r| r.trim().to_string()).filter(|r| !r.is_empty());
        if reason.as_deref().is_some_and(|r| r.chars().count() > MAX_BLOCK_REASON_LENGTH) {
            return Err(AppError::BadRequest(format!(
                "Block reason must be at most {MAX_BLOCK_REASON_LENGTH} characters"
            )));
        }

        let mut conn = self.pool.acquire().await?;
        if !self.user_repo.exists(&mut conn, blocked_id).await? {
            return Err(AppError::NotFound("User not found"));
        }
        self.block_repo.block(&mut conn, blocker_id, blocked_id, reason.as_deref()).await?;

        tracing::info!("User blocked");
        self.metrics.blocks_total.add(1, &[KeyValue::new("action", "block")]);
        Ok(())
    }

    #[tracing::instrument(err(level = "warn"), skip(self))]
    pub async fn unblock_user(&self, blocker_id: Uuid, blocked_id: Uuid) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        self.block_repo.unblock(&mut conn, blocker_id, blocked_id).await?;

        tracing::info!("User unblocked");
        self.metrics.blocks_total.add(1, &[KeyValue::new("action", "unblock")]);
        Ok(())
    }

    /// Users blocked by `blocker_id`, most recent first.
    #[tracing::instrument(err(level = "warn"), skip(self))]
    pub async fn blocked_users(&self, blocker_id: Uuid) -> Result<Vec<BlockedUserView>> {
        let mut conn = self.pool.acquire().await?;
        let blocks = self.block_repo.list_blocked(&mut conn, blocker_id).await?;

        let ids: Vec<Uuid> = blocks.iter().map(|b| b.blocked_id).collect();
        let users = self.summaries(&mut conn, &ids).await?;

        Ok(blocks
            .into_iter()
            .filter_map(|block| {
                let user = users.get(&block.blocked_id).cloned()?;
                Some(BlockedUserView { user, reason: block.reason, blocked_at: block.created_at })
            })
            .collect())
    }

    fn enforce(&self, verdict: Verdict) -> Result<()> {
        match verdict {
            Verdict::Allowed => Ok(()),
            Verdict::Denied(denial) => {
                self.metrics.privacy_denials_total.add(1, &[KeyValue::new("reason", format!("{denial:?}"))]);
                Err(AppError::Forbidden(denial.reason()))
            }
        }
    }

    async fn participant_conversation(
        &self,
        conn: &mut PgConnection,
        conversation_id: Uuid,
        user_id: Uuid,
    ) -> Result<Conversation> {
        let conversation = self
            .conversation_repo
            .get_by_id(conn, conversation_id)
            .await?
            .ok_or(AppError::NotFound("Conversation not found"))?;

        if !conversation.is_participant(user_id) {
            return Err(AppError::Forbidden(NOT_A_PARTICIPANT));
        }
        Ok(conversation)
    }

    async fn view_for(
        &self,
        conn: &mut PgConnection,
        conversation: Conversation,
        user_id: Uuid,
        recipient: User,
    ) -> Result<ConversationView> {
        let unread_count = self.message_repo.conversation_unread_count(&mut *conn, conversation.id, user_id).await?;
        let is_blocked = self.privacy_gate.is_blocked(&mut *conn, user_id, recipient.id).await?;

        Ok(ConversationView {
            conversation: conversation.visible_to(user_id),
            participant: recipient.summary(),
            unread_count,
            is_blocked,
        })
    }

    async fn summaries(&self, conn: &mut PgConnection, ids: &[Uuid]) -> Result<HashMap<Uuid, UserSummary>> {
        let users = self.user_repo.find_by_ids(conn, ids).await?;
        Ok(users.into_iter().map(|u| (u.id, u.summary())).collect())
    }
}
