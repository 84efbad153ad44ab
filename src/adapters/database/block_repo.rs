use crate::adapters::database::records::BlockedUserRecord;
use crate::domain::block::BlockedUser;
use crate::error::{AppError, Result};
use sqlx::PgConnection;
use uuid::Uuid;

#[derive(Clone, Debug, Default)]
pub struct BlockRepository {}

impl BlockRepository {
    #[must_use]
    pub const fn new() -> Self {
        Self {}
    }

    /// Adds a `blocker -> blocked` edge. Blocking twice keeps the first edge and its reason.
    ///
    /// # Errors
    /// Returns `AppError::NotFound` if the target user does not exist.
    /// Returns `AppError::Database` if the insert fails.
    #[tracing::instrument(level = "debug", skip(self, conn, reason))]
    pub(crate) async fn block(
        &self,
        conn: &mut PgConnection,
        blocker_id: Uuid,
        blocked_id: Uuid,
        reason: Option<&str>,
    ) -> Result<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO blocked_users (blocker_id, blocked_id, reason)
            VALUES ($1, $2, $3)
            ON CONFLICT (blocker_id, blocked_id) DO NOTHING
            "#,
        )
        .bind(blocker_id)
        .bind(blocked_id)
        .bind(reason)
        .execute(conn)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(e)) if e.code().as_deref() == Some("23503") => {
                Err(AppError::NotFound("User not found"))
            }
            Err(e) => Err(AppError::Database(e)),
        }
    }

    /// # Errors
    /// Returns `AppError::NotFound` if there was no such block.
    /// Returns `AppError::Database` if the deletion fails.
    #[tracing::instrument(level = "debug", skip(self, conn))]
    pub(crate) async fn unblock(&self, conn: &mut PgConnection, blocker_id: Uuid, blocked_id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM blocked_users WHERE blocker_id = $1 AND blocked_id = $2")
            .bind(blocker_id)
            .bind(blocked_id)
            .execute(conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Block relationship not found"));
        }
        Ok(())
    }

    /// True when either user blocked the other.
    ///
    /// # Errors
    /// Returns `AppError::Database` if the query fails.
    #[tracing::instrument(level = "debug", skip(self, conn))]
    pub(crate) async fn is_blocked(&self, conn: &mut PgConnection, a: Uuid, b: Uuid) -> Result<bool> {
        let blocked = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM blocked_users
                WHERE (blocker_id = $1 AND blocked_id = $2)
                   OR (blocker_id = $2 AND blocked_id = $1)
            )
            "#,
        )
        .bind(a)
        .bind(b)
        .fetch_one(conn)
        .await?;
        Ok(blocked)
    }

    /// True only when `blocker_id` blocked `blocked_id`.
    ///
    /// # Errors
    /// Returns `AppError::Database` if the query fails.
    #[tracing::instrument(level = "debug", skip(self, conn))]
    pub(crate) async fn is_user_blocked(
        &self,
        conn: &mut PgConnection,
        blocker_id: Uuid,
        blocked_id: Uuid,
    ) -> Result<bool> {
        let blocked = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM blocked_users WHERE blocker_id = $1 AND blocked_id = $2)",
        )
        .bind(blocker_id)
        .bind(blocked_id)
        .fetch_one(conn)
        .await?;
        Ok(blocked)
    }

    /// # Errors
    /// Returns `AppError::Database` if the query fails.
    #[tracing::instrument(level = "debug", skip(self, conn))]
    pub(crate) async fn list_blocked(&self, conn: &mut PgConnection, blocker_id: Uuid) -> Result<Vec<BlockedUser>> {
        let records = sqlx::query_as::<_, BlockedUserRecord>(
            r#"
            SELECT id, blocker_id, blocked_id, reason, created_at
            FROM blocked_users
            WHERE blocker_id = $1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(blocker_id)
        .fetch_all(conn)
        .await?;
        Ok(records.into_iter().map(Into::into).collect())
    }
}
