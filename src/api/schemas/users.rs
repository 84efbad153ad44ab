use crate::domain::FollowStats as FollowCounts;
use crate::domain::user::{ProfileUpdate as DomainProfileUpdate, User, UserSummary as DomainUserSummary, WhoCanMessage};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// The authenticated user's own profile, including their privacy setting.
#[derive(Debug, Serialize)]
pub struct Profile {
    pub id: Uuid,
    pub username: String,
    pub full_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    pub who_can_message: WhoCanMessage,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<User> for Profile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            full_name: user.full_name,
            avatar_url: user.avatar_url,
            who_can_message: user.who_can_message,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ProfileUpdate {
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
    pub who_can_message: Option<WhoCanMessage>,
}

impl From<ProfileUpdate> for DomainProfileUpdate {
    fn from(update: ProfileUpdate) -> Self {
        Self { full_name: update.full_name, avatar_url: update.avatar_url, who_can_message: update.who_can_message }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub username: String,
    pub full_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

impl From<DomainUserSummary> for UserSummary {
    fn from(summary: DomainUserSummary) -> Self {
        Self { id: summary.id, username: summary.username, full_name: summary.full_name, avatar_url: summary.avatar_url }
    }
}

#[derive(Debug, Serialize)]
pub struct FollowStats {
    pub followers: i64,
    pub following: i64,
    pub is_following: bool,
}

impl FollowStats {
    #[must_use]
    pub const fn new(counts: FollowCounts, is_following: bool) -> Self {
        Self { followers: counts.followers, following: counts.following, is_following }
    }
}
