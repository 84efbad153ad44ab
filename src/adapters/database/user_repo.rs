use crate::adapters::database::records::UserRecord;
use crate::domain::user::{ProfileUpdate, User};
use crate::error::{AppError, Result};
use sqlx::PgConnection;
use uuid::Uuid;

const USER_COLUMNS: &str = "id, username, password_hash, full_name, avatar_url, who_can_message, created_at";

#[derive(Clone, Debug, Default)]
pub struct UserRepository {}

impl UserRepository {
    #[must_use]
    pub const fn new() -> Self {
        Self {}
    }

    /// Inserts a new account.
    ///
    /// # Errors
    /// Returns `AppError::Conflict` if the username is taken.
    /// Returns `AppError::Database` if the insert fails.
    #[tracing::instrument(level = "debug", skip(self, conn, password_hash))]
    pub(crate) async fn create(
        &self,
        conn: &mut PgConnection,
        username: &str,
        password_hash: &str,
        full_name: &str,
    ) -> Result<User> {
        let sql = format!(
            "INSERT INTO users (username, password_hash, full_name) VALUES ($1, $2, $3) RETURNING {USER_COLUMNS}"
        );
        let result = sqlx::query_as::<_, UserRecord>(&sql)
            .bind(username)
            .bind(password_hash)
            .bind(full_name)
            .fetch_one(conn)
            .await;

        match result {
            Ok(record) => Ok(record.into()),
            Err(sqlx::Error::Database(e)) if e.code().as_deref() == Some("23505") => {
                Err(AppError::Conflict("Username already exists".into()))
            }
            Err(e) => Err(AppError::Database(e)),
        }
    }

    /// # Errors
    /// Returns `AppError::Database` if the query fails.
    #[tracing::instrument(level = "debug", skip(self, conn))]
    pub(crate) async fn find_by_id(&self, conn: &mut PgConnection, id: Uuid) -> Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let record = sqlx::query_as::<_, UserRecord>(&sql).bind(id).fetch_optional(conn).await?;
        Ok(record.map(Into::into))
    }

    /// Batch lookup; ids without a matching user are silently absent from the result.
    ///
    /// # Errors
    /// Returns `AppError::Database` if the query fails.
    #[tracing::instrument(level = "debug", skip(self, conn, ids), fields(count = ids.len()))]
    pub(crate) async fn find_by_ids(&self, conn: &mut PgConnection, ids: &[Uuid]) -> Result<Vec<User>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ANY($1)");
        let records = sqlx::query_as::<_, UserRecord>(&sql).bind(ids).fetch_all(conn).await?;
        Ok(records.into_iter().map(Into::into).collect())
    }

    /// # Errors
    /// Returns `AppError::Database` if the query fails.
    #[tracing::instrument(level = "debug", skip(self, conn))]
    pub(crate) async fn find_by_username(&self, conn: &mut PgConnection, username: &str) -> Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE username = $1");
        let record = sqlx::query_as::<_, UserRecord>(&sql).bind(username).fetch_optional(conn).await?;
        Ok(record.map(Into::into))
    }

    /// # Errors
    /// Returns `AppError::Database` if the query fails.
    #[tracing::instrument(level = "debug", skip(self, conn))]
    pub(crate) async fn exists(&self, conn: &mut PgConnection, id: Uuid) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
            .bind(id)
            .fetch_one(conn)
            .await?;
        Ok(exists)
    }

    /// Applies a partial profile update. Fields left as `None` keep their stored value.
    ///
    /// # Errors
    /// Returns `AppError::NotFound` if the user does not exist.
    /// Returns `AppError::Database` if the update fails.
    #[tracing::instrument(level = "debug", skip(self, conn, update))]
    pub(crate) async fn update_profile(
        &self,
        conn: &mut PgConnection,
        id: Uuid,
        update: &ProfileUpdate,
    ) -> Result<User> {
        let sql = format!(
            r#"
            UPDATE users
            SET full_name = COALESCE($2, full_name),
                avatar_url = COALESCE($3, avatar_url),
                who_can_message = COALESCE($4, who_can_message),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        );
        let record = sqlx::query_as::<_, UserRecord>(&sql)
            .bind(id)
            .bind(update.full_name.as_deref())
            .bind(update.avatar_url.as_deref())
            .bind(update.who_can_message.map(|w| w.as_str()))
            .fetch_optional(conn)
            .await?;

        record.map(Into::into).ok_or(AppError::NotFound("User not found"))
    }
}
