use crate::api::AppState;
use crate::api::middleware::AuthUser;
use crate::api::schemas::users::{FollowStats, Profile, ProfileUpdate, UserSummary};
use crate::error::Result;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

pub async fn get_me(auth_user: AuthUser, State(state): State<AppState>) -> Result<impl IntoResponse> {
    let user = state.account_service.get_me(auth_user.user_id).await?;
    Ok(Json(Profile::from(user)))
}

pub async fn update_me(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<ProfileUpdate>,
) -> Result<impl IntoResponse> {
    let user = state.account_service.update_profile(auth_user.user_id, payload.into()).await?;
    Ok(Json(Profile::from(user)))
}

pub async fn get_user(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let summary = state.account_service.get_user(user_id).await?;
    Ok(Json(UserSummary::from(summary)))
}

pub async fn follow(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    state.follow_service.follow(auth_user.user_id, user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn unfollow(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    state.follow_service.unfollow(auth_user.user_id, user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn follow_stats(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let counts = state.follow_service.stats(user_id).await?;
    let is_following = state.follow_service.is_following(auth_user.user_id, user_id).await?;
    Ok(Json(FollowStats::new(counts, is_following)))
}
