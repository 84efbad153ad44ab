use crate::api::AppState;
use crate::api::middleware::AuthUser;
use crate::api::schemas::messaging::{BlockUser, BlockedUser, BlockedUserList, CanMessage};
use crate::error::Result;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

pub async fn can_message(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let verdict = state.messaging_service.can_message(auth_user.user_id, user_id).await?;
    Ok(Json(CanMessage::from(verdict)))
}

/// The body is optional; `{"reason": "..."}` attaches a private note to the block.
pub async fn block_user(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    payload: Option<Json<BlockUser>>,
) -> Result<impl IntoResponse> {
    let reason = payload.and_then(|Json(body)| body.reason);
    state.messaging_service.block_user(auth_user.user_id, user_id, reason).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn unblock_user(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    state.messaging_service.unblock_user(auth_user.user_id, user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_blocked(auth_user: AuthUser, State(state): State<AppState>) -> Result<impl IntoResponse> {
    let blocked = state.messaging_service.blocked_users(auth_user.user_id).await?;
    Ok(Json(BlockedUserList { blocked_users: blocked.into_iter().map(BlockedUser::from).collect() }))
}
