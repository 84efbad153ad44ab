use crate::adapters::database::DbPool;
use crate::adapters::database::refresh_token_repo::RefreshTokenRepository;
use crate::adapters::database::user_repo::UserRepository;
use crate::config::AuthConfig;
use crate::domain::auth::{Claims, Jwt};
use crate::domain::auth_session::AuthSession;
use crate::error::{AppError, Result};
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};
use base64::Engine;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use opentelemetry::{KeyValue, global, metrics::Counter};
use rand::{RngCore, rngs::OsRng};
use sha2::{Digest, Sha256};
use sqlx::PgConnection;
use time::OffsetDateTime;
use uuid::Uuid;

/// A successful session transition, exported as the `event` label.
#[derive(Clone, Copy, Debug)]
enum SessionEvent {
    Login,
    Refresh,
    Logout,
}

impl SessionEvent {
    const fn label(self) -> &'static str {
        match self {
            Self::Login => "login",
            Self::Refresh => "refresh",
            Self::Logout => "logout",
        }
    }
}

#[derive(Clone, Debug)]
struct Metrics {
    session_events_total: Counter<u64>,
}

impl Metrics {
    fn new() -> Self {
        Self {
            session_events_total: global::meter("rapport-server")
                .u64_counter("rapport_session_events_total")
                .with_description("Logins, refresh token rotations and logouts")
                .build(),
        }
    }

    fn record(&self, event: SessionEvent) {
        self.session_events_total.add(1, &[KeyValue::new("event", event.label())]);
    }
}

/// HS256 keys derived once from the configured secret.
#[derive(Clone)]
struct SigningKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl SigningKeys {
    fn from_secret(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }
}

impl std::fmt::Debug for SigningKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SigningKeys(..)")
    }
}

/// Credentials, access tokens and refresh token rotation.
#[derive(Clone, Debug)]
pub struct AuthService {
    config: AuthConfig,
    keys: SigningKeys,
    pool: DbPool,
    user_repo: UserRepository,
    refresh_repo: RefreshTokenRepository,
    metrics: Metrics,
}

impl AuthService {
    #[must_use]
    pub fn new(
        config: AuthConfig,
        pool: DbPool,
        user_repo: UserRepository,
        refresh_repo: RefreshTokenRepository,
    ) -> Self {
        let keys = SigningKeys::from_secret(&config.jwt_secret);
        Self { config, keys, pool, user_repo, refresh_repo, metrics: Metrics::new() }
    }

    #[tracing::instrument(
        skip(self, username, password),
        fields(user_id = tracing::field::Empty),
        err(level = "warn")
    )]
    pub async fn login(&self, username: String, password: String) -> Result<AuthSession> {
        let mut conn = self.pool.acquire().await?;
        let Some(user) = self.user_repo.find_by_username(&mut conn, &username).await? else {
            tracing::warn!("Login failed: user not found");
            return Err(AppError::AuthError);
        };

        tracing::Span::current().record("user_id", tracing::field::display(user.id));

        if !self.verify_password(&password, &user.password_hash).await? {
            tracing::warn!("Login failed: invalid password");
            return Err(AppError::AuthError);
        }

        let session = self.create_session(&mut conn, user.id).await?;
        tracing::info!("User logged in");
        self.metrics.record(SessionEvent::Login);
        Ok(session)
    }

    /// Argon2id hash with a random salt, computed off the async runtime.
    #[tracing::instrument(err, skip_all)]
    pub async fn hash_password(&self, password: &str) -> Result<String> {
        let password = password.to_owned();
        off_runtime(move || {
            let salt = SaltString::generate(&mut OsRng);
            Argon2::default()
                .hash_password(password.as_bytes(), &salt)
                .map(|hash| hash.to_string())
                .map_err(|_| AppError::Internal)
        })
        .await
    }

    /// `Ok(false)` for a wrong password; a stored hash that does not parse is an internal error.
    #[tracing::instrument(err, skip_all)]
    pub async fn verify_password(&self, password: &str, password_hash: &str) -> Result<bool> {
        let (password, stored) = (password.to_owned(), password_hash.to_owned());
        off_runtime(move || {
            let stored = PasswordHash::new(&stored).map_err(|_| AppError::Internal)?;
            Ok(Argon2::default().verify_password(password.as_bytes(), &stored).is_ok())
        })
        .await
    }

    /// Issues an access token and stores a fresh refresh token on `conn`, so the caller
    /// can fold session creation into its own transaction.
    #[tracing::instrument(err, skip(self, conn), fields(user_id = %user_id))]
    pub async fn create_session(&self, conn: &mut PgConnection, user_id: Uuid) -> Result<AuthSession> {
        let refresh_token = generate_opaque_token();
        self.refresh_repo
            .create(conn, user_id, &hash_opaque_token(&refresh_token), self.refresh_expiry())
            .await?;

        self.issue_session(user_id, refresh_token)
    }

    #[tracing::instrument(err(level = "warn"), skip(self, refresh_token), fields(user_id = tracing::field::Empty))]
    pub async fn refresh_session(&self, refresh_token: String) -> Result<AuthSession> {
        let mut conn = self.pool.acquire().await?;
        let new_refresh_token = generate_opaque_token();

        let user_id = self
            .refresh_repo
            .rotate(
                &mut conn,
                &hash_opaque_token(&refresh_token),
                &hash_opaque_token(&new_refresh_token),
                self.refresh_expiry(),
            )
            .await?
            .ok_or(AppError::AuthError)?;

        tracing::Span::current().record("user_id", tracing::field::display(user_id));
        tracing::info!("Refresh token rotated");
        self.metrics.record(SessionEvent::Refresh);

        self.issue_session(user_id, new_refresh_token)
    }

    #[tracing::instrument(err, skip(self, refresh_token), fields(user_id = %user_id))]
    pub async fn logout(&self, user_id: Uuid, refresh_token: String) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        let revoked = self.refresh_repo.revoke(&mut conn, &hash_opaque_token(&refresh_token), user_id).await?;
        if !revoked {
            tracing::debug!("Logout with unknown refresh token");
        }
        self.metrics.record(SessionEvent::Logout);
        Ok(())
    }

    /// Verifies a JWT access token and returns the user ID (subject).
    ///
    /// # Errors
    /// Returns `AppError::AuthError` for malformed, forged or expired tokens.
    pub fn verify_token(&self, jwt: &Jwt) -> Result<Uuid> {
        decode::<Claims>(jwt.as_str(), &self.keys.decoding, &Validation::default())
            .map(|data| data.claims.sub)
            .map_err(|_| AppError::AuthError)
    }

    fn issue_session(&self, user_id: Uuid, refresh_token: String) -> Result<AuthSession> {
        let ttl = i64::try_from(self.config.access_token_ttl_secs).unwrap_or(i64::MAX);
        let expires_at = OffsetDateTime::now_utc().unix_timestamp().saturating_add(ttl);
        let exp = usize::try_from(expires_at).map_err(|_| AppError::Internal)?;

        let jwt = self.encode_jwt(&Claims::new(user_id, exp))?;

        Ok(AuthSession { user_id, token: jwt.as_str().to_string(), refresh_token, expires_at })
    }

    fn refresh_expiry(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc() + time::Duration::days(self.config.refresh_token_ttl_days)
    }

    fn encode_jwt(&self, claims: &Claims) -> Result<Jwt> {
        encode(&Header::default(), claims, &self.keys.encoding).map(Jwt).map_err(|_| AppError::Internal)
    }
}

async fn off_runtime<T, F>(work: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work).await.map_err(|_| AppError::Internal)?
}

fn generate_opaque_token() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

fn hash_opaque_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_service() -> AuthService {
        let config = AuthConfig {
            jwt_secret: "test_secret".to_string(),
            access_token_ttl_secs: 3600,
            refresh_token_ttl_days: 7,
            min_password_length: 12,
            cleanup_interval_secs: 3600,
        };
        let pool = sqlx::PgPool::connect_lazy("postgres://localhost/test").unwrap();
        AuthService::new(config, pool, UserRepository::new(), RefreshTokenRepository::new())
    }

    #[tokio::test]
    async fn test_issued_token_verifies_to_subject() {
        let service = setup_service();
        let user_id = Uuid::new_v4();

        let session = service.issue_session(user_id, "opaque".into()).unwrap();
        let decoded = service.verify_token(&Jwt(session.token)).unwrap();

        assert_eq!(decoded, user_id);
        assert!(session.expires_at > OffsetDateTime::now_utc().unix_timestamp());
    }

    #[tokio::test]
    async fn test_expired_or_foreign_tokens_are_rejected() {
        let service = setup_service();
        let expired = service.encode_jwt(&Claims::new(Uuid::new_v4(), 1_000)).unwrap();
        assert!(matches!(service.verify_token(&expired), Err(AppError::AuthError)));

        let foreign = encode(
            &Header::default(),
            &Claims::new(Uuid::new_v4(), 10_000_000_000),
            &EncodingKey::from_secret(b"someone_else"),
        )
        .unwrap();
        assert!(matches!(service.verify_token(&Jwt(foreign)), Err(AppError::AuthError)));
    }

    #[tokio::test]
    async fn test_password_hashing() {
        let service = setup_service();
        let hash = service.hash_password("correct horse battery").await.unwrap();

        assert!(service.verify_password("correct horse battery", &hash).await.unwrap());
        assert!(!service.verify_password("wrong_password", &hash).await.unwrap());
    }

    #[test]
    fn test_opaque_tokens_are_unique_and_hash_deterministically() {
        let token1 = generate_opaque_token();
        let token2 = generate_opaque_token();
        assert_ne!(token1, token2);

        assert_eq!(hash_opaque_token(&token1), hash_opaque_token(&token1));
        assert_eq!(hash_opaque_token(&token1).len(), 64);
    }
}
