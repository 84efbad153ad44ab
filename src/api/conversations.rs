use crate::api::AppState;
use crate::api::middleware::AuthUser;
use crate::api::schemas::messaging::{
    Conversation, ConversationList, CreateConversation, ListConversationsQuery, Message, MessageList, SendMessage,
    UnreadCount,
};
use crate::api::schemas::pagination::PageQuery;
use crate::error::Result;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

pub async fn create_conversation(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateConversation>,
) -> Result<impl IntoResponse> {
    let view = state.messaging_service.create_or_get_conversation(auth_user.user_id, payload.recipient_id).await?;
    Ok((StatusCode::CREATED, Json(Conversation::from(view))))
}

pub async fn list_conversations(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<ListConversationsQuery>,
) -> Result<impl IntoResponse> {
    let page = state
        .messaging_service
        .get_conversations(auth_user.user_id, query.page, query.limit, query.unread_only)
        .await?;
    Ok(Json(ConversationList::from(page)))
}

pub async fn get_conversation(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(conversation_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let view = state.messaging_service.get_conversation(conversation_id, auth_user.user_id).await?;
    Ok(Json(Conversation::from(view)))
}

pub async fn delete_conversation(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(conversation_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    state.messaging_service.delete_conversation(conversation_id, auth_user.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn send_message(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(conversation_id): Path<Uuid>,
    Json(payload): Json<SendMessage>,
) -> Result<impl IntoResponse> {
    let view = state.messaging_service.send_message(conversation_id, auth_user.user_id, payload.into()).await?;
    Ok((StatusCode::CREATED, Json(Message::from(view))))
}

pub async fn list_messages(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(conversation_id): Path<Uuid>,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse> {
    let page =
        state.messaging_service.get_messages(conversation_id, auth_user.user_id, query.page, query.limit).await?;
    Ok(Json(MessageList::from(page)))
}

pub async fn mark_read(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(conversation_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    state.messaging_service.mark_conversation_read(conversation_id, auth_user.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn unread_count(auth_user: AuthUser, State(state): State<AppState>) -> Result<impl IntoResponse> {
    let summary = state.messaging_service.unread_count(auth_user.user_id).await?;
    Ok(Json(UnreadCount::from(summary)))
}
