use crate::adapters::database::DbPool;
use crate::adapters::database::user_repo::UserRepository;
use crate::domain::auth_session::AuthSession;
use crate::domain::user::{ProfileUpdate, User, UserSummary, validate_username};
use crate::error::{AppError, Result};
use crate::services::auth_service::AuthService;
use opentelemetry::{global, metrics::Counter};
use uuid::Uuid;

const MAX_FULL_NAME_LENGTH: usize = 100;

#[derive(Clone, Debug)]
struct AccountMetrics {
    users_registered_total: Counter<u64>,
    profile_updates_total: Counter<u64>,
}

impl AccountMetrics {
    fn new() -> Self {
        let meter = global::meter("rapport-server");
        Self {
            users_registered_total: meter
                .u64_counter("users_registered_total")
                .with_description("Total number of successful user registrations")
                .build(),
            profile_updates_total: meter
                .u64_counter("profile_updates_total")
                .with_description("Total number of profile updates")
                .build(),
        }
    }
}

/// The user directory: accounts, profiles and the messaging privacy setting.
#[derive(Clone, Debug)]
pub struct AccountService {
    pool: DbPool,
    user_repo: UserRepository,
    auth_service: AuthService,
    min_password_length: usize,
    metrics: AccountMetrics,
}

impl AccountService {
    #[must_use]
    pub fn new(pool: DbPool, user_repo: UserRepository, auth_service: AuthService, min_password_length: usize) -> Self {
        Self { pool, user_repo, auth_service, min_password_length, metrics: AccountMetrics::new() }
    }

    /// Creates the account and its first session atomically.
    #[tracing::instrument(
        skip(self, username, password, full_name),
        fields(user_id = tracing::field::Empty),
        err(level = "warn")
    )]
    pub async fn register(&self, username: String, password: String, full_name: Option<String>) -> Result<AuthSession> {
        validate_username(&username).map_err(AppError::BadRequest)?;
        if password.chars().count() < self.min_password_length {
            return Err(AppError::BadRequest(format!(
                "Password must be at least {} characters",
                self.min_password_length
            )));
        }
        let full_name = normalize_full_name(full_name)?.unwrap_or_default();

        let password_hash = self.auth_service.hash_password(&password).await?;

        let mut tx = self.pool.begin().await?;
        let user = self.user_repo.create(&mut tx, &username, &password_hash, &full_name).await?;
        tracing::Span::current().record("user_id", tracing::field::display(user.id));

        let session = self.auth_service.create_session(&mut tx, user.id).await?;
        tx.commit().await?;

        tracing::info!("User registered");
        self.metrics.users_registered_total.add(1, &[]);

        Ok(session)
    }

    #[tracing::instrument(skip(self), err(level = "warn"))]
    pub async fn get_me(&self, user_id: Uuid) -> Result<User> {
        let mut conn = self.pool.acquire().await?;
        self.user_repo.find_by_id(&mut conn, user_id).await?.ok_or(AppError::NotFound("User not found"))
    }

    #[tracing::instrument(skip(self, update), err(level = "warn"))]
    pub async fn update_profile(&self, user_id: Uuid, mut update: ProfileUpdate) -> Result<User> {
        update.full_name = normalize_full_name(update.full_name)?;

        let mut conn = self.pool.acquire().await?;
        if update.is_empty() {
            return self.user_repo.find_by_id(&mut conn, user_id).await?.ok_or(AppError::NotFound("User not found"));
        }

        let user = self.user_repo.update_profile(&mut conn, user_id, &update).await?;
        if let Some(setting) = update.who_can_message {
            tracing::info!(who_can_message = %setting, "Messaging privacy setting changed");
        }
        self.metrics.profile_updates_total.add(1, &[]);
        Ok(user)
    }

    #[tracing::instrument(skip(self), err(level = "warn"))]
    pub async fn get_user(&self, user_id: Uuid) -> Result<UserSummary> {
        let mut conn = self.pool.acquire().await?;
        let user = self.user_repo.find_by_id(&mut conn, user_id).await?.ok_or(AppError::NotFound("User not found"))?;
        Ok(user.summary())
    }
}

fn normalize_full_name(full_name: Option<String>) -> Result<Option<String>> {
    let Some(name) = full_name else {
        return Ok(None);
    };
    let name = name.trim().to_string();
    if name.chars().count() > MAX_FULL_NAME_LENGTH {
        return Err(AppError::BadRequest(format!("Full name must be at most {MAX_FULL_NAME_LENGTH} characters")));
    }
    Ok(Some(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_name_is_trimmed_and_capped() {
        assert_eq!(normalize_full_name(None).unwrap(), None);
        assert_eq!(normalize_full_name(Some("  Ada Lovelace ".into())).unwrap(), Some("Ada Lovelace".into()));
        assert!(matches!(normalize_full_name(Some("x".repeat(101))), Err(AppError::BadRequest(_))));
    }
}
