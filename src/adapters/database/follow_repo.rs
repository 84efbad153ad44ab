use crate::domain::FollowStats;
use crate::error::{AppError, Result};
use sqlx::PgConnection;
use uuid::Uuid;

#[derive(Clone, Debug, Default)]
pub struct FollowRepository {}

impl FollowRepository {
    #[must_use]
    pub const fn new() -> Self {
        Self {}
    }

    /// Records `follower_id -> following_id`. Following twice is a no-op.
    ///
    /// # Errors
    /// Returns `AppError::NotFound` if the target user does not exist.
    /// Returns `AppError::Database` if the insert fails.
    #[tracing::instrument(level = "debug", skip(self, conn))]
    pub(crate) async fn follow(&self, conn: &mut PgConnection, follower_id: Uuid, following_id: Uuid) -> Result<()> {
        let result = sqlx::query(
            "INSERT INTO user_follows (follower_id, following_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(follower_id)
        .bind(following_id)
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

    /// Returns whether an edge was removed.
    ///
    /// # Errors
    /// Returns `AppError::Database` if the deletion fails.
    #[tracing::instrument(level = "debug", skip(self, conn))]
    pub(crate) async fn unfollow(&self, conn: &mut PgConnection, follower_id: Uuid, following_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM user_follows WHERE follower_id = $1 AND following_id = $2")
            .bind(follower_id)
            .bind(following_id)
            .execute(conn)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// # Errors
    /// Returns `AppError::Database` if the query fails.
    #[tracing::instrument(level = "debug", skip(self, conn))]
    pub(crate) async fn is_following(
        &self,
        conn: &mut PgConnection,
        follower_id: Uuid,
        following_id: Uuid,
    ) -> Result<bool> {
        let following = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM user_follows WHERE follower_id = $1 AND following_id = $2)",
        )
        .bind(follower_id)
        .bind(following_id)
        .fetch_one(conn)
        .await?;
        Ok(following)
    }

    /// # Errors
    /// Returns `AppError::Database` if the query fails.
    #[tracing::instrument(level = "debug", skip(self, conn))]
    pub(crate) async fn stats(&self, conn: &mut PgConnection, user_id: Uuid) -> Result<FollowStats> {
        let (followers, following) = sqlx::query_as::<_, (i64, i64)>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM user_follows WHERE following_id = $1),
                (SELECT COUNT(*) FROM user_follows WHERE follower_id = $1)
            "#,
        )
        .bind(user_id)
        .fetch_one(conn)
        .await?;
        Ok(FollowStats { followers, following })
    }
}
