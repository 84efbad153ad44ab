use crate::adapters::database::DbPool;
use crate::adapters::database::refresh_token_repo::RefreshTokenRepository;
use crate::error::Result;
use opentelemetry::{global, metrics::Counter};
use std::time::Duration;
use tokio::sync::watch;
use tracing::Instrument;

/// Purges refresh tokens past their expiry on a fixed interval.
#[derive(Debug)]
pub struct RefreshTokenCleanupWorker {
    pool: DbPool,
    repo: RefreshTokenRepository,
    interval: Duration,
    deleted_total: Counter<u64>,
}

impl RefreshTokenCleanupWorker {
    #[must_use]
    pub fn new(pool: DbPool, repo: RefreshTokenRepository, cleanup_interval_secs: u64) -> Self {
        let deleted_total = global::meter("rapport-server")
            .u64_counter("refresh_tokens_expired_deleted_total")
            .with_description("Expired refresh tokens removed by the cleanup worker")
            .build();
        Self { pool, repo, interval: Duration::from_secs(cleanup_interval_secs), deleted_total }
    }

    /// Runs until `shutdown` flips to `true`. A zero interval disables the worker.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        if self.interval.is_zero() {
            tracing::info!("Refresh token cleanup is disabled (interval = 0)");
            return;
        }

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        while !*shutdown.borrow() {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = self.perform_cleanup()
                        .instrument(tracing::info_span!("run_refresh_token_cleanup"))
                        .await
                    {
                        tracing::error!(error = %e, "Refresh token cleanup iteration failed");
                    }
                }
                _ = shutdown.changed() => {}
            }
        }
        tracing::info!("Refresh token cleanup loop shutting down");
    }

    /// Deletes every expired refresh token once.
    ///
    /// # Errors
    /// Returns an error if the database connection or query fails.
    #[tracing::instrument(skip(self), err, fields(expired_deleted = tracing::field::Empty))]
    pub async fn perform_cleanup(&self) -> Result<u64> {
        let mut conn = self.pool.acquire().await?;
        let count = self.repo.delete_expired(&mut conn).await?;

        tracing::Span::current().record("expired_deleted", count);
        if count > 0 {
            tracing::info!(count, "Deleted expired refresh tokens");
            self.deleted_total.add(count, &[]);
        }
        Ok(count)
    }
}
