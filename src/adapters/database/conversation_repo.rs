use crate::adapters::database::records::ConversationRecord;
use crate::domain::conversation::{Conversation, canonical_pair};
use crate::error::{AppError, Result};
use sqlx::PgConnection;
use time::OffsetDateTime;
use uuid::Uuid;

const CONVERSATION_COLUMNS: &str = "id, user1_id, user2_id, last_message_id, last_message_text, \
     last_message_sender_id, last_message_at, user1_cleared_at, user2_cleared_at, created_at, updated_at";

/// Rows a participant still sees: never cleared, or a message arrived after the clear.
const VISIBLE_TO_USER: &str = "((user1_id = $1 AND (user1_cleared_at IS NULL OR last_message_at > user1_cleared_at)) \
     OR (user2_id = $1 AND (user2_cleared_at IS NULL OR last_message_at > user2_cleared_at)))";

#[derive(Debug, sqlx::FromRow)]
struct ConversationListRecord {
    #[sqlx(flatten)]
    conversation: ConversationRecord,
    unread_count: i64,
}

#[derive(Clone, Debug, Default)]
pub struct ConversationRepository {}

impl ConversationRepository {
    #[must_use]
    pub const fn new() -> Self {
        Self {}
    }

    /// Returns the conversation between `a` and `b`, creating it on first contact.
    /// Concurrent callers converge on the same row through the unique pair constraint.
    ///
    /// # Errors
    /// Returns `AppError::NotFound` if either user does not exist.
    /// Returns `AppError::Database` if the upsert fails.
    #[tracing::instrument(level = "debug", skip(self, conn))]
    pub(crate) async fn create_or_get(&self, conn: &mut PgConnection, a: Uuid, b: Uuid) -> Result<Conversation> {
        let (user1_id, user2_id) = canonical_pair(a, b);

        let sql = format!(
            r#"
            INSERT INTO conversations (user1_id, user2_id)
            VALUES ($1, $2)
            ON CONFLICT (user1_id, user2_id) DO UPDATE SET user1_id = EXCLUDED.user1_id
            RETURNING {CONVERSATION_COLUMNS}
            "#
        );
        let result = sqlx::query_as::<_, ConversationRecord>(&sql)
            .bind(user1_id)
            .bind(user2_id)
            .fetch_one(conn)
            .await;

        match result {
            Ok(record) => Ok(record.into()),
            Err(sqlx::Error::Database(e)) if e.code().as_deref() == Some("23503") => {
                Err(AppError::NotFound("Recipient not found"))
            }
            Err(e) => Err(AppError::Database(e)),
        }
    }

    /// # Errors
    /// Returns `AppError::Database` if the query fails.
    #[tracing::instrument(level = "debug", skip(self, conn))]
    pub(crate) async fn get_by_id(&self, conn: &mut PgConnection, id: Uuid) -> Result<Option<Conversation>> {
        let sql = format!("SELECT {CONVERSATION_COLUMNS} FROM conversations WHERE id = $1");
        let record = sqlx::query_as::<_, ConversationRecord>(&sql).bind(id).fetch_optional(conn).await?;
        Ok(record.map(Into::into))
    }

    /// Looks up the pair in either order. A missing conversation is `Ok(None)`.
    ///
    /// # Errors
    /// Returns `AppError::Database` if the query fails.
    #[tracing::instrument(level = "debug", skip(self, conn))]
    pub(crate) async fn get_by_participants(
        &self,
        conn: &mut PgConnection,
        a: Uuid,
        b: Uuid,
    ) -> Result<Option<Conversation>> {
        let (user1_id, user2_id) = canonical_pair(a, b);
        let sql = format!("SELECT {CONVERSATION_COLUMNS} FROM conversations WHERE user1_id = $1 AND user2_id = $2");
        let record = sqlx::query_as::<_, ConversationRecord>(&sql)
            .bind(user1_id)
            .bind(user2_id)
            .fetch_optional(conn)
            .await?;
        Ok(record.map(Into::into))
    }

    /// Lists the user's visible conversations, most recently updated first, each with the
    /// number of messages the user has not read yet. Also returns the unpaged total.
    ///
    /// # Errors
    /// Returns `AppError::Database` if the query fails.
    #[tracing::instrument(level = "debug", skip(self, conn))]
    pub(crate) async fn list_for_user(
        &self,
        conn: &mut PgConnection,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<(Conversation, i64)>, i64)> {
        let sql = format!(
            r#"
            SELECT {CONVERSATION_COLUMNS},
                   (SELECT COUNT(*)
                    FROM messages m
                    WHERE m.conversation_id = conversations.id
                      AND m.sender_id <> $1
                      AND m.is_read = FALSE
                      AND m.is_deleted = FALSE
                      AND m.created_at > COALESCE(
                          CASE WHEN conversations.user1_id = $1
                               THEN conversations.user1_cleared_at
                               ELSE conversations.user2_cleared_at END,
                          '-infinity'::timestamptz)) AS unread_count
            FROM conversations
            WHERE {VISIBLE_TO_USER}
            ORDER BY updated_at DESC, id DESC
            LIMIT $2 OFFSET $3
            "#
        );
        let records = sqlx::query_as::<_, ConversationListRecord>(&sql)
            .bind(user_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(&mut *conn)
            .await?;

        let count_sql = format!("SELECT COUNT(*) FROM conversations WHERE {VISIBLE_TO_USER}");
        let total = sqlx::query_scalar::<_, i64>(&count_sql).bind(user_id).fetch_one(&mut *conn).await?;

        let rows = records.into_iter().map(|r| (r.conversation.into(), r.unread_count)).collect();
        Ok((rows, total))
    }

    /// Refreshes the denormalized preview of the newest message.
    ///
    /// # Errors
    /// Returns `AppError::Database` if the update fails.
    #[tracing::instrument(level = "debug", skip(self, conn, text))]
    pub(crate) async fn update_last_message(
        &self,
        conn: &mut PgConnection,
        conversation_id: Uuid,
        message_id: Uuid,
        text: &str,
        sender_id: Uuid,
        sent_at: OffsetDateTime,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE conversations
            SET last_message_id = $2,
                last_message_text = $3,
                last_message_sender_id = $4,
                last_message_at = $5,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(conversation_id)
        .bind(message_id)
        .bind(text)
        .bind(sender_id)
        .bind(sent_at)
        .execute(conn)
        .await?;
        Ok(())
    }

    /// Stamps the clear marker with the database clock on the participant's side only.
    ///
    /// # Errors
    /// Returns `AppError::Database` if the update fails.
    #[tracing::instrument(level = "debug", skip(self, conn))]
    pub(crate) async fn clear_for_user(
        &self,
        conn: &mut PgConnection,
        conversation_id: Uuid,
        user_id: Uuid,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE conversations
            SET user1_cleared_at = CASE WHEN user1_id = $2 THEN NOW() ELSE user1_cleared_at END,
                user2_cleared_at = CASE WHEN user2_id = $2 THEN NOW() ELSE user2_cleared_at END
            WHERE id = $1 AND (user1_id = $2 OR user2_id = $2)
            "#,
        )
        .bind(conversation_id)
        .bind(user_id)
        .execute(conn)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
