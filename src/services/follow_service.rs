use crate::adapters::database::DbPool;
use crate::adapters::database::follow_repo::FollowRepository;
use crate::adapters::database::user_repo::UserRepository;
use crate::domain::FollowStats;
use crate::error::{AppError, Result};
use opentelemetry::{KeyValue, global, metrics::Counter};
use uuid::Uuid;

#[derive(Clone, Debug)]
struct Metrics {
    follow_changes_total: Counter<u64>,
}

impl Metrics {
    fn new() -> Self {
        let meter = global::meter("rapport-server");
        Self {
            follow_changes_total: meter
                .u64_counter("follow_changes_total")
                .with_description("Follow graph edges added or removed")
                .build(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct FollowService {
    pool: DbPool,
    user_repo: UserRepository,
    follow_repo: FollowRepository,
    metrics: Metrics,
}

impl FollowService {
    #[must_use]
    pub fn new(pool: DbPool, user_repo: UserRepository, follow_repo: FollowRepository) -> Self {
        Self { pool, user_repo, follow_repo, metrics: Metrics::new() }
    }

    #[tracing::instrument(skip(self), err(level = "warn"))]
    pub async fn follow(&self, follower_id: Uuid, following_id: Uuid) -> Result<()> {
        if follower_id == following_id {
            return Err(AppError::BadRequest("Cannot follow yourself".into()));
        }

        let mut conn = self.pool.acquire().await?;
        if !self.user_repo.exists(&mut conn, following_id).await? {
            return Err(AppError::NotFound("User not found"));
        }
        self.follow_repo.follow(&mut conn, follower_id, following_id).await?;

        self.metrics.follow_changes_total.add(1, &[KeyValue::new("action", "follow")]);
        Ok(())
    }

    #[tracing::instrument(skip(self), err(level = "warn"))]
    pub async fn unfollow(&self, follower_id: Uuid, following_id: Uuid) -> Result<()> {
        if follower_id == following_id {
            return Err(AppError::BadRequest("Cannot unfollow yourself".into()));
        }

        let mut conn = self.pool.acquire().await?;
        if self.follow_repo.unfollow(&mut conn, follower_id, following_id).await? {
            self.metrics.follow_changes_total.add(1, &[KeyValue::new("action", "unfollow")]);
        }
        Ok(())
    }

    #[tracing::instrument(skip(self), err(level = "warn"))]
    pub async fn is_following(&self, follower_id: Uuid, following_id: Uuid) -> Result<bool> {
        let mut conn = self.pool.acquire().await?;
        self.follow_repo.is_following(&mut conn, follower_id, following_id).await
    }

    #[tracing::instrument(skip(self), err(level = "warn"))]
    pub async fn stats(&self, user_id: Uuid) -> Result<FollowStats> {
        let mut conn = self.pool.acquire().await?;
        if !self.user_repo.exists(&mut conn, user_id).await? {
            return Err(AppError::NotFound("User not found"));
        }
        self.follow_repo.stats(&mut conn, user_id).await
    }
}
