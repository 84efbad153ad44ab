use crate::adapters::database::DbPool;
use crate::api::rate_limit::log_rate_limit_events;
use crate::config::Config;
use crate::services::account_service::AccountService;
use crate::services::auth_service::AuthService;
use crate::services::follow_service::FollowService;
use crate::services::health_service::HealthService;
use crate::services::messaging_service::MessagingService;
use crate::services::rate_limit_service::RateLimitService;
use axum::body::Body;
use axum::http::{HeaderName, Request};
use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{delete, get, post},
};
use std::sync::Arc;
use tower_governor::GovernorLayer;
use tower_governor::governor::GovernorConfigBuilder;
use tower_http::request_id::{PropagateRequestIdLayer, RequestId, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

pub mod auth;
pub mod blocks;
pub mod conversations;
pub mod health;
pub mod messages;
pub mod middleware;
pub mod rate_limit;
pub mod schemas;
pub mod users;

const REQUEST_ID_HEADER: &str = "x-request-id";

#[derive(Clone, Debug)]
pub struct AppState {
    pub config: Config,
    pub account_service: AccountService,
    pub auth_service: AuthService,
    pub follow_service: FollowService,
    pub messaging_service: MessagingService,
    pub rate_limit_service: RateLimitService,
}

#[derive(Clone, Debug)]
pub struct MgmtState {
    pub health_service: HealthService,
}

#[derive(Debug)]
pub struct ServiceContainer {
    pub pool: DbPool,
    pub account_service: AccountService,
    pub auth_service: AuthService,
    pub follow_service: FollowService,
    pub messaging_service: MessagingService,
    pub rate_limit_service: RateLimitService,
}

/// Builds the public `/v1` router: the auth tier (register, login, refresh, logout) and the
/// standard tier each get their own per-IP token bucket.
///
/// # Panics
/// Panics if a rate limiter configuration cannot be constructed.
pub fn app_router(config: Config, services: ServiceContainer) -> Router {
    let extractor = services.rate_limit_service.extractor.clone();
    let bucket = |per_second: u32, burst: u32| {
        Arc::new(
            GovernorConfigBuilder::default()
                .per_nanosecond(u64::from(1_000_000_000 / per_second.max(1)))
                .burst_size(burst)
                .key_extractor(extractor.clone())
                .finish()
                .expect("Failed to build rate limiter config"),
        )
    };
    let standard_conf = bucket(config.rate_limit.per_second, config.rate_limit.burst);
    let auth_conf = bucket(config.rate_limit.auth_per_second, config.rate_limit.auth_burst);

    let state = AppState {
        config,
        account_service: services.account_service,
        auth_service: services.auth_service,
        follow_service: services.follow_service,
        messaging_service: services.messaging_service,
        rate_limit_service: services.rate_limit_service,
    };

    let auth_routes = Router::new()
        .route("/users", post(auth::register))
        .route("/sessions", post(auth::login).delete(auth::logout))
        .route("/sessions/refresh", post(auth::refresh))
        .layer(GovernorLayer::new(auth_conf));

    let api_routes = Router::new()
        .route("/users/me", get(users::get_me).patch(users::update_me))
        .route("/users/blocked", get(blocks::list_blocked))
        .route("/users/{id}", get(users::get_user))
        .route("/users/{id}/follow", post(users::follow).delete(users::unfollow))
        .route("/users/{id}/follow-stats", get(users::follow_stats))
        .route("/users/{id}/can-message", get(blocks::can_message))
        .route("/users/{id}/block", post(blocks::block_user).delete(blocks::unblock_user))
        .route(
            "/conversations",
            post(conversations::create_conversation).get(conversations::list_conversations),
        )
        .route("/conversations/unread-count", get(conversations::unread_count))
        .route(
            "/conversations/{id}",
            get(conversations::get_conversation).delete(conversations::delete_conversation),
        )
        .route(
            "/conversations/{id}/messages",
            post(conversations::send_message).get(conversations::list_messages),
        )
        .route("/conversations/{id}/read", post(conversations::mark_read))
        .route("/messages/{id}", delete(messages::delete_message))
        .route("/messages/{id}/read", post(messages::mark_read))
        .layer(GovernorLayer::new(standard_conf));

    Router::new()
        .nest("/v1", auth_routes.merge(api_routes))
        .layer(from_fn_with_state(state.clone(), log_rate_limit_events))
        .layer(PropagateRequestIdLayer::new(HeaderName::from_static(REQUEST_ID_HEADER)))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(request_span)
                .on_response(
                    |response: &axum::http::Response<_>, latency: std::time::Duration, span: &tracing::Span| {
                        let status = response.status();
                        span.record("http.response.status_code", status.as_u16());

                        tracing::info!(
                            latency_ms = %latency.as_millis(),
                            status = %status.as_u16(),
                            "request completed"
                        );
                    },
                )
                .on_failure(|error, _latency, _span: &tracing::Span| {
                    tracing::error!(error = %error, "request failed");
                }),
        )
        .layer(SetRequestIdLayer::new(
            HeaderName::from_static(REQUEST_ID_HEADER),
            middleware::MakeRequestUuidOrHeader,
        ))
        .with_state(state)
}

fn request_span(request: &Request<Body>) -> tracing::Span {
    let request_id = request
        .extensions()
        .get::<RequestId>()
        .and_then(|id| id.header_value().to_str().ok())
        .unwrap_or_default();

    tracing::info_span!(
        "request",
        request_id = %request_id,
        "http.request.method" = %request.method(),
        "url.path" = %request.uri().path(),
        "http.response.status_code" = tracing::field::Empty,
        "otel.kind" = "server",
        user_id = tracing::field::Empty,
    )
}

/// Probe endpoints served on the management port.
pub fn mgmt_router(state: MgmtState) -> Router {
    Router::new().route("/livez", get(health::livez)).route("/readyz", get(health::readyz)).with_state(state)
}
