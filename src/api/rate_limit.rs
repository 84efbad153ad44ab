use crate::api::AppState;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

/// Records every governor decision. Throttled responses carry `x-ratelimit-after`.
pub async fn log_rate_limit_events(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let response = next.run(request).await;

    let retry_after = response
        .headers()
        .get("x-ratelimit-after")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    state.rate_limit_service.log_decision(response.status(), retry_after);

    response
}
