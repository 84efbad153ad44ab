use crate::api::AppState;
use crate::api::middleware::AuthUser;
use crate::error::Result;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

pub async fn delete_message(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(message_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    state.messaging_service.delete_message(message_id, auth_user.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn mark_read(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(message_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    state.messaging_service.mark_message_read(message_id, auth_user.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
