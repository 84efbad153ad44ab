use crate::error::Result;
use sqlx::PgConnection;
use time::OffsetDateTime;
use uuid::Uuid;

/// Refresh tokens are stored as SHA-256 hex digests, never in the clear.
#[derive(Clone, Debug, Default)]
pub struct RefreshTokenRepository {}

impl RefreshTokenRepository {
    #[must_use]
    pub const fn new() -> Self {
        Self {}
    }

    /// # Errors
    /// Returns `AppError::Database` if the insert fails.
    #[tracing::instrument(level = "debug", skip(self, conn, token_hash), err)]
    pub(crate) async fn create(
        &self,
        conn: &mut PgConnection,
        user_id: Uuid,
        token_hash: &str,
        expires_at: OffsetDateTime,
    ) -> Result<()> {
        sqlx::query("INSERT INTO refresh_tokens (token_hash, user_id, expires_at) VALUES ($1, $2, $3)")
            .bind(token_hash)
            .bind(user_id)
            .bind(expires_at)
            .execute(conn)
            .await?;
        Ok(())
    }

    /// Swaps `old_hash` for `new_hash` in one statement. The old token is consumed even when
    /// it turns out to be expired, so a replayed token can never rotate twice.
    /// Returns the owner when the rotation happened.
    ///
    /// # Errors
    /// Returns `AppError::Database` if the statement fails.
    #[tracing::instrument(level = "debug", skip(self, conn, old_hash, new_hash), err)]
    pub(crate) async fn rotate(
        &self,
        conn: &mut PgConnection,
        old_hash: &str,
        new_hash: &str,
        expires_at: OffsetDateTime,
    ) -> Result<Option<Uuid>> {
        let user_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            WITH consumed AS (
                DELETE FROM refresh_tokens
                WHERE token_hash = $1
                RETURNING user_id, expires_at
            )
            INSERT INTO refresh_tokens (token_hash, user_id, expires_at)
            SELECT $2, user_id, $3
            FROM consumed
            WHERE expires_at > NOW()
            RETURNING user_id
            "#,
        )
        .bind(old_hash)
        .bind(new_hash)
        .bind(expires_at)
        .fetch_optional(conn)
        .await?;

        Ok(user_id)
    }

    /// Revokes a token, but only when it belongs to `user_id`.
    ///
    /// # Errors
    /// Returns `AppError::Database` if the deletion fails.
    #[tracing::instrument(level = "debug", skip(self, conn, token_hash), err)]
    pub(crate) async fn revoke(&self, conn: &mut PgConnection, token_hash: &str, user_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE token_hash = $1 AND user_id = $2")
            .bind(token_hash)
            .bind(user_id)
            .execute(conn)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// # Errors
    /// Returns `AppError::Database` if the deletion fails.
    #[tracing::instrument(level = "debug", skip(self, conn), err)]
    pub async fn delete_expired(&self, conn: &mut PgConnection) -> Result<u64> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE expires_at < NOW()").execute(conn).await?;
        Ok(result.rows_affected())
    }
}
