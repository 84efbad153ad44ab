#![forbid(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::todo)]
#![warn(clippy::panic)]
#![warn(clippy::dbg_macro)]
#![warn(clippy::print_stdout)]
#![warn(clippy::print_stderr)]
#![warn(clippy::clone_on_ref_ptr)]
#![warn(unreachable_pub)]
#![warn(missing_debug_implementations)]
#![warn(unused_qualifications)]
#![deny(unused_must_use)]

pub mod adapters;
pub mod api;
pub mod config;
pub mod domain;
pub mod error;
pub mod services;
pub mod telemetry;
pub mod workers;

use crate::adapters::database::block_repo::BlockRepository;
use crate::adapters::database::conversation_repo::ConversationRepository;
use crate::adapters::database::follow_repo::FollowRepository;
use crate::adapters::database::message_repo::MessageRepository;
use crate::adapters::database::refresh_token_repo::RefreshTokenRepository;
use crate::adapters::database::user_repo::UserRepository;
use crate::adapters::database::DbPool;
use crate::api::ServiceContainer;
use crate::config::Config;
use crate::services::account_service::AccountService;
use crate::services::auth_service::AuthService;
use crate::services::follow_service::FollowService;
use crate::services::health_service::HealthService;
use crate::services::messaging_service::MessagingService;
use crate::services::privacy_gate::PrivacyGate;
use crate::services::rate_limit_service::RateLimitService;
use crate::workers::RefreshTokenCleanupWorker;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Everything `main` needs after wiring: request services, the health probe and the
/// background workers (not yet started).
#[derive(Debug)]
pub struct App {
    pub services: ServiceContainer,
    pub health_service: HealthService,
    pub workers: Workers,
}

#[derive(Debug)]
pub struct Workers {
    refresh_token_cleanup: RefreshTokenCleanupWorker,
}

impl Workers {
    /// Starts every worker on the runtime. Each observes `shutdown` and exits on its own.
    #[must_use]
    pub fn spawn_all(self, shutdown: watch::Receiver<bool>) -> Vec<JoinHandle<()>> {
        vec![tokio::spawn(self.refresh_token_cleanup.run(shutdown))]
    }
}

/// Wires repositories and services over an existing pool.
#[derive(Debug)]
pub struct AppBuilder {
    config: Config,
    pool: Option<DbPool>,
}

impl AppBuilder {
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self { config, pool: None }
    }

    #[must_use]
    pub fn with_database(mut self, pool: DbPool) -> Self {
        self.pool = Some(pool);
        self
    }

    /// # Errors
    /// Returns an error if no database pool was provided.
    pub fn build(self) -> anyhow::Result<App> {
        let config = self.config;
        let pool = self.pool.ok_or_else(|| anyhow::anyhow!("database pool is required"))?;

        let user_repo = UserRepository::new();
        let refresh_repo = RefreshTokenRepository::new();
        let follow_repo = FollowRepository::new();
        let block_repo = BlockRepository::new();

        let auth_service =
            AuthService::new(config.auth.clone(), pool.clone(), user_repo.clone(), refresh_repo.clone());
        let account_service = AccountService::new(
            pool.clone(),
            user_repo.clone(),
            auth_service.clone(),
            config.auth.min_password_length,
        );
        let follow_service = FollowService::new(pool.clone(), user_repo.clone(), follow_repo.clone());
        let privacy_gate = PrivacyGate::new(user_repo.clone(), block_repo.clone(), follow_repo);
        let messaging_service = MessagingService::new(
            pool.clone(),
            config.messaging.clone(),
            user_repo,
            ConversationRepository::new(),
            MessageRepository::new(),
            block_repo,
            privacy_gate,
        );
        let rate_limit_service = RateLimitService::new(config.server.trusted_proxies.clone());
        let health_service = HealthService::new(pool.clone(), config.health.clone());

        let workers = Workers {
            refresh_token_cleanup: RefreshTokenCleanupWorker::new(
                pool.clone(),
                refresh_repo,
                config.auth.cleanup_interval_secs,
            ),
        };

        Ok(App {
            services: ServiceContainer {
                pool,
                account_service,
                auth_service,
                follow_service,
                messaging_service,
                rate_limit_service,
            },
            health_service,
            workers,
        })
    }
}

/// Applies the embedded schema migrations.
///
/// # Errors
/// Returns an error if a migration fails.
pub async fn run_migrations(pool: &DbPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    tracing::info!("Database migrations applied");
    Ok(())
}

/// Flips the shutdown channel on SIGINT or SIGTERM.
pub fn spawn_signal_handler(shutdown_tx: watch::Sender<bool>) {
    tokio::spawn(async move {
        let ctrl_c = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for Ctrl+C");
                std::future::pending::<()>().await;
            }
        };

        #[cfg(unix)]
        let terminate = async {
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(mut signal) => {
                    signal.recv().await;
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to install SIGTERM handler");
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            () = ctrl_c => tracing::info!("Received Ctrl+C, shutting down"),
            () = terminate => tracing::info!("Received SIGTERM, shutting down"),
        }

        let _ = shutdown_tx.send(true);
    });
}

/// Routes panics through `tracing` so they reach the configured log sinks.
pub fn setup_panic_hook() {
    std::panic::set_hook(Box::new(|info| {
        let location = info.location().map(|l| format!("{}:{}", l.file(), l.line())).unwrap_or_default();
        let payload = info
            .payload()
            .downcast_ref::<&str>()
            .map(ToString::to_string)
            .or_else(|| info.payload().downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic payload".to_string());
        tracing::error!(panic.location = %location, panic.payload = %payload, "Thread panicked");
    }));
}
