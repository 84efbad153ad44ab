use time::OffsetDateTime;
use uuid::Uuid;

/// Directed block edge. Stored one way, enforced both ways for sending.
#[derive(Debug, Clone)]
pub struct BlockedUser {
    pub id: Uuid,
    pub blocker_id: Uuid,
    pub blocked_id: Uuid,
    pub reason: Option<String>,
    pub created_at: OffsetDateTime,
}
