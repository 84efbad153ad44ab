use crate::adapters::database::records::MessageRecord;
use crate::domain::message::{Message, OutgoingMessage};
use crate::error::{AppError, Result};
use sqlx::PgConnection;
use sqlx::types::Json;
use time::OffsetDateTime;
use uuid::Uuid;

const MESSAGE_COLUMNS: &str =
    "id, conversation_id, sender_id, message_type, content, attachments, is_read, read_at, created_at";

/// Unread messages from the other participant that the reader can still see, i.e. sent after
/// their last clear. Expects `messages m` joined to `conversations c`, reader bound as `$1`.
const UNREAD_FOR_READER: &str = "(c.user1_id = $1 OR c.user2_id = $1) \
     AND m.sender_id <> $1 \
     AND m.is_read = FALSE \
     AND m.is_deleted = FALSE \
     AND m.created_at > COALESCE(CASE WHEN c.user1_id = $1 THEN c.user1_cleared_at ELSE c.user2_cleared_at END, \
     '-infinity'::timestamptz)";

fn into_message(record: MessageRecord) -> Result<Message> {
    let id = record.id;
    Message::try_from(record).map_err(|e| {
        tracing::error!(message_id = %id, error = %e, "Stored message has an invalid type");
        AppError::Internal
    })
}

#[derive(Clone, Debug, Default)]
pub struct MessageRepository {}

impl MessageRepository {
    #[must_use]
    pub const fn new() -> Self {
        Self {}
    }

    /// Records a new message in the database.
    ///
    /// # Errors
    /// Returns `AppError::NotFound` if the conversation does not exist.
    /// Returns `AppError::Database` if the insert fails.
    #[tracing::instrument(level = "debug", skip(self, conn, message))]
    pub(crate) async fn create(
        &self,
        conn: &mut PgConnection,
        conversation_id: Uuid,
        sender_id: Uuid,
        message: &OutgoingMessage,
    ) -> Result<Message> {
        let sql = format!(
            r#"
            INSERT INTO messages (conversation_id, sender_id, message_type, content, attachments)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {MESSAGE_COLUMNS}
            "#
        );
        let result = sqlx::query_as::<_, MessageRecord>(&sql)
            .bind(conversation_id)
            .bind(sender_id)
            .bind(message.message_type.as_str())
            .bind(message.content.as_deref())
            .bind(Json(&message.attachments))
            .fetch_one(conn)
            .await;

        match result {
            Ok(record) => into_message(record),
            Err(sqlx::Error::Database(e)) if e.code().as_deref() == Some("23503") => {
                Err(AppError::NotFound("Conversation not found"))
            }
            Err(e) => Err(AppError::Database(e)),
        }
    }

    /// Soft-deleted messages are reported as absent.
    ///
    /// # Errors
    /// Returns `AppError::Database` if the query fails.
    #[tracing::instrument(level = "debug", skip(self, conn))]
    pub(crate) async fn get_by_id(&self, conn: &mut PgConnection, id: Uuid) -> Result<Option<Message>> {
        let sql = format!("SELECT {MESSAGE_COLUMNS} FROM messages WHERE id = $1 AND is_deleted = FALSE");
        let record = sqlx::query_as::<_, MessageRecord>(&sql).bind(id).fetch_optional(conn).await?;
        record.map(into_message).transpose()
    }

    /// Newest-first page of a conversation. Messages at or before `visible_after` are
    /// skipped, which is how a participant's cleared history stays hidden.
    ///
    /// # Errors
    /// Returns `AppError::Database` if the query fails.
    #[tracing::instrument(level = "debug", skip(self, conn))]
    pub(crate) async fn list_for_conversation(
        &self,
        conn: &mut PgConnection,
        conversation_id: Uuid,
        visible_after: Option<OffsetDateTime>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Message>, i64)> {
        let sql = format!(
            r#"
            SELECT {MESSAGE_COLUMNS}
            FROM messages
            WHERE conversation_id = $1
              AND is_deleted = FALSE
              AND ($2::timestamptz IS NULL OR created_at > $2)
            ORDER BY created_at DESC, id DESC
            LIMIT $3 OFFSET $4
            "#
        );
        let records = sqlx::query_as::<_, MessageRecord>(&sql)
            .bind(conversation_id)
            .bind(visible_after)
            .bind(limit)
            .bind(offset)
            .fetch_all(&mut *conn)
            .await?;

        let total = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM messages
            WHERE conversation_id = $1
              AND is_deleted = FALSE
              AND ($2::timestamptz IS NULL OR created_at > $2)
            "#,
        )
        .bind(conversation_id)
        .bind(visible_after)
        .fetch_one(&mut *conn)
        .await?;

        let messages = records.into_iter().map(into_message).collect::<Result<Vec<_>>>()?;
        Ok((messages, total))
    }

    /// Soft-deletes a message on behalf of its sender. Returns false when nothing matched.
    ///
    /// # Errors
    /// Returns `AppError::Database` if the update fails.
    #[tracing::instrument(level = "debug", skip(self, conn))]
    pub(crate) async fn soft_delete(&self, conn: &mut PgConnection, id: Uuid, sender_id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE messages
            SET is_deleted = TRUE, deleted_at = NOW(), deleted_by = $2, updated_at = NOW()
            WHERE id = $1 AND sender_id = $2 AND is_deleted = FALSE
            "#,
        )
        .bind(id)
        .bind(sender_id)
        .execute(conn)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Flips a single message to read. Senders never mark their own messages and
    /// already-read messages keep their original `read_at`.
    ///
    /// # Errors
    /// Returns `AppError::Database` if the update fails.
    #[tracing::instrument(level = "debug", skip(self, conn))]
    pub(crate) async fn mark_read(&self, conn: &mut PgConnection, id: Uuid, reader_id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE messages
            SET is_read = TRUE, read_at = NOW(), updated_at = NOW()
            WHERE id = $1 AND sender_id <> $2 AND is_read = FALSE AND is_deleted = FALSE
            "#,
        )
        .bind(id)
        .bind(reader_id)
        .execute(conn)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Marks everything the other participant sent as read.
    ///
    /// # Errors
    /// Returns `AppError::Database` if the update fails.
    #[tracing::instrument(level = "debug", skip(self, conn))]
    pub(crate) async fn mark_conversation_read(
        &self,
        conn: &mut PgConnection,
        conversation_id: Uuid,
        reader_id: Uuid,
    ) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE messages
            SET is_read = TRUE, read_at = NOW(), updated_at = NOW()
            WHERE conversation_id = $1 AND sender_id <> $2 AND is_read = FALSE AND is_deleted = FALSE
            "#,
        )
        .bind(conversation_id)
        .bind(reader_id)
        .execute(conn)
        .await?;
        Ok(result.rows_affected())
    }

    /// Unread messages addressed to the user across all their conversations.
    ///
    /// # Errors
    /// Returns `AppError::Database` if the query fails.
    #[tracing::instrument(level = "debug", skip(self, conn))]
    pub(crate) async fn unread_count(&self, conn: &mut PgConnection, user_id: Uuid) -> Result<i64> {
        let sql = format!(
            "SELECT COUNT(*) FROM messages m JOIN conversations c ON c.id = m.conversation_id WHERE {UNREAD_FOR_READER}"
        );
        let count = sqlx::query_scalar::<_, i64>(&sql).bind(user_id).fetch_one(conn).await?;
        Ok(count)
    }

    /// # Errors
    /// Returns `AppError::Database` if the query fails.
    #[tracing::instrument(level = "debug", skip(self, conn))]
    pub(crate) async fn conversation_unread_count(
        &self,
        conn: &mut PgConnection,
        conversation_id: Uuid,
        user_id: Uuid,
    ) -> Result<i64> {
        let sql = format!(
            "SELECT COUNT(*) FROM messages m JOIN conversations c ON c.id = m.conversation_id \
             WHERE m.conversation_id = $2 AND {UNREAD_FOR_READER}"
        );
        let count =
            sqlx::query_scalar::<_, i64>(&sql).bind(user_id).bind(conversation_id).fetch_one(conn).await?;
        Ok(count)
    }

    /// Number of conversations holding at least one unread message for the user.
    ///
    /// # Errors
    /// Returns `AppError::Database` if the query fails.
    #[tracing::instrument(level = "debug", skip(self, conn))]
    pub(crate) async fn unread_conversations_count(&self, conn: &mut PgConnection, user_id: Uuid) -> Result<i64> {
        let sql = format!(
            "SELECT COUNT(DISTINCT m.conversation_id) FROM messages m \
             JOIN conversations c ON c.id = m.conversation_id WHERE {UNREAD_FOR_READER}"
        );
        let count = sqlx::query_scalar::<_, i64>(&sql).bind(user_id).fetch_one(conn).await?;
        Ok(count)
    }
}
