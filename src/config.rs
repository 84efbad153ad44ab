use clap::{Args, Parser, ValueEnum};
use ipnetwork::IpNetwork;

#[derive(Clone, Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Config {
    #[command(flatten)]
    pub database: DatabaseConfig,

    #[command(flatten)]
    pub server: ServerConfig,

    #[command(flatten)]
    pub auth: AuthConfig,

    #[command(flatten)]
    pub rate_limit: RateLimitConfig,

    #[command(flatten)]
    pub messaging: MessagingConfig,

    #[command(flatten)]
    pub health: HealthConfig,

    #[command(flatten)]
    pub telemetry: TelemetryConfig,
}

#[derive(Clone, Debug, Args)]
pub struct DatabaseConfig {
    /// Database connection URL
    #[arg(long = "database-url", env = "RAPPORT_DATABASE_URL")]
    pub url: String,

    /// Maximum number of pooled connections
    #[arg(long, env = "RAPPORT_DB_MAX_CONNECTIONS", default_value_t = 20)]
    pub max_connections: u32,

    /// Minimum number of idle connections kept open
    #[arg(long, env = "RAPPORT_DB_MIN_CONNECTIONS", default_value_t = 2)]
    pub min_connections: u32,

    /// Seconds to wait for a free connection
    #[arg(long, env = "RAPPORT_DB_ACQUIRE_TIMEOUT_SECS", default_value_t = 5)]
    pub acquire_timeout_secs: u64,

    /// Seconds an idle connection may live
    #[arg(long, env = "RAPPORT_DB_IDLE_TIMEOUT_SECS", default_value_t = 600)]
    pub idle_timeout_secs: u64,

    /// Maximum lifetime of a connection in seconds
    #[arg(long, env = "RAPPORT_DB_MAX_LIFETIME_SECS", default_value_t = 1800)]
    pub max_lifetime_secs: u64,
}

#[derive(Clone, Debug, Args)]
pub struct ServerConfig {
    /// Host to listen on
    #[arg(long, env = "RAPPORT_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "RAPPORT_PORT", default_value_t = 3000)]
    pub port: u16,

    /// Port for the management (health) server
    #[arg(long, env = "RAPPORT_MGMT_PORT", default_value_t = 9090)]
    pub mgmt_port: u16,

    /// Seconds to wait for background tasks during shutdown
    #[arg(long, env = "RAPPORT_SHUTDOWN_TIMEOUT_SECS", default_value_t = 10)]
    pub shutdown_timeout_secs: u64,

    /// Comma-separated list of CIDRs to trust for X-Forwarded-For IP extraction
    #[arg(
        long,
        env = "RAPPORT_TRUSTED_PROXIES",
        default_value = "10.0.0.0/8,172.16.0.0/12,192.168.0.0/16,127.0.0.1/32",
        value_delimiter = ','
    )]
    pub trusted_proxies: Vec<IpNetwork>,
}

#[derive(Clone, Debug, Args)]
pub struct AuthConfig {
    /// Secret key for JWT signing
    #[arg(long, env = "RAPPORT_JWT_SECRET")]
    pub jwt_secret: String,

    /// Access token time-to-live in seconds
    #[arg(long, env = "RAPPORT_ACCESS_TOKEN_TTL_SECS", default_value_t = 900)]
    pub access_token_ttl_secs: u64,

    /// Refresh token time-to-live in days
    #[arg(long, env = "RAPPORT_REFRESH_TOKEN_TTL_DAYS", default_value_t = 30)]
    pub refresh_token_ttl_days: i64,

    /// Minimum accepted password length at registration
    #[arg(long, env = "RAPPORT_MIN_PASSWORD_LENGTH", default_value_t = 12)]
    pub min_password_length: usize,

    /// How often expired refresh tokens are purged (0 disables the worker)
    #[arg(long, env = "RAPPORT_REFRESH_TOKEN_CLEANUP_INTERVAL_SECS", default_value_t = 3600)]
    pub cleanup_interval_secs: u64,
}

#[derive(Clone, Debug, Args)]
pub struct RateLimitConfig {
    /// Requests per second allowed for standard endpoints
    #[arg(long, env = "RAPPORT_RATE_LIMIT_PER_SECOND", default_value_t = 10)]
    pub per_second: u32,

    /// Burst allowance for standard endpoints
    #[arg(long, env = "RAPPORT_RATE_LIMIT_BURST", default_value_t = 20)]
    pub burst: u32,

    /// Stricter rate limit for expensive auth-related endpoints (register/login)
    #[arg(long, env = "RAPPORT_AUTH_RATE_LIMIT_PER_SECOND", default_value_t = 1)]
    pub auth_per_second: u32,

    /// Burst allowance for expensive auth-related endpoints
    #[arg(long, env = "RAPPORT_AUTH_RATE_LIMIT_BURST", default_value_t = 3)]
    pub auth_burst: u32,
}

#[derive(Clone, Debug, Args)]
pub struct MessagingConfig {
    /// Maximum length of a text message, in characters
    #[arg(long, env = "RAPPORT_MAX_TEXT_LENGTH", default_value_t = 10_000)]
    pub max_text_length: usize,

    /// Maximum number of attachments on an image or file message
    #[arg(long, env = "RAPPORT_MAX_ATTACHMENTS", default_value_t = 5)]
    pub max_attachments: usize,

    /// Characters of a text message kept in the conversation preview
    #[arg(long, env = "RAPPORT_PREVIEW_LENGTH", default_value_t = 100)]
    pub preview_length: usize,

    /// Default page size for the conversation list
    #[arg(long, env = "RAPPORT_CONVERSATIONS_PAGE_SIZE", default_value_t = 20)]
    pub conversations_page_size: i64,

    /// Largest page size accepted for the conversation list
    #[arg(long, env = "RAPPORT_CONVERSATIONS_MAX_PAGE_SIZE", default_value_t = 50)]
    pub conversations_max_page_size: i64,

    /// Default page size for message history
    #[arg(long, env = "RAPPORT_MESSAGES_PAGE_SIZE", default_value_t = 50)]
    pub messages_page_size: i64,

    /// Largest page size accepted for message history
    #[arg(long, env = "RAPPORT_MESSAGES_MAX_PAGE_SIZE", default_value_t = 100)]
    pub messages_max_page_size: i64,
}

impl Default for MessagingConfig {
    fn default() -> Self {
        Self {
            max_text_length: 10_000,
            max_attachments: 5,
            preview_length: 100,
            conversations_page_size: 20,
            conversations_max_page_size: 50,
            messages_page_size: 50,
            messages_max_page_size: 100,
        }
    }
}

#[derive(Clone, Debug, Args)]
pub struct HealthConfig {
    /// Timeout for the database readiness probe in milliseconds
    #[arg(long, env = "RAPPORT_HEALTH_DB_TIMEOUT_MS", default_value_t = 2000)]
    pub db_timeout_ms: u64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Clone, Debug, Args)]
pub struct TelemetryConfig {
    /// OTLP collector endpoint (e.g. <http://localhost:4317>); export is disabled when unset
    #[arg(long, env = "RAPPORT_OTLP_ENDPOINT")]
    pub otlp_endpoint: Option<String>,

    /// Log output format
    #[arg(long, env = "RAPPORT_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// How often metrics are pushed to the collector
    #[arg(long, env = "RAPPORT_METRICS_EXPORT_INTERVAL_SECS", default_value_t = 60)]
    pub metrics_export_interval_secs: u64,
}

impl Config {
    #[must_use]
    pub fn load() -> Self {
        Self::parse()
    }
}
