pub mod auth;
pub mod auth_session;
pub mod block;
pub mod conversation;
pub mod message;
pub mod pagination;
pub mod privacy;
pub mod user;

/// Follower and following totals for one user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FollowStats {
    pub followers: i64,
    pub following: i64,
}
