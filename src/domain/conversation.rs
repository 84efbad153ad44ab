use time::OffsetDateTime;
use uuid::Uuid;

/// A one-to-one thread. `user1_id` is always the smaller of the two ids.
#[derive(Debug, Clone)]
pub struct Conversation {
    pub id: Uuid,
    pub user1_id: Uuid,
    pub user2_id: Uuid,
    pub last_message: Option<LastMessage>,
    pub user1_cleared_at: Option<OffsetDateTime>,
    pub user2_cleared_at: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// Denormalized copy of the newest message, kept on the conversation row for list views.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LastMessage {
    pub id: Uuid,
    pub text: String,
    pub sender_id: Uuid,
    pub sent_at: OffsetDateTime,
}

impl Conversation {
    #[must_use]
    pub fn is_participant(&self, user_id: Uuid) -> bool {
        self.user1_id == user_id || self.user2_id == user_id
    }

    /// The other participant, seen from `current_user_id`.
    #[must_use]
    pub fn recipient_id(&self, current_user_id: Uuid) -> Uuid {
        if self.user1_id == current_user_id { self.user2_id } else { self.user1_id }
    }

    /// When `user_id` last cleared this conversation from their side, if ever.
    #[must_use]
    pub fn cleared_at_for(&self, user_id: Uuid) -> Option<OffsetDateTime> {
        if self.user1_id == user_id {
            self.user1_cleared_at
        } else if self.user2_id == user_id {
            self.user2_cleared_at
        } else {
            None
        }
    }

    /// Drops the last-message preview if `user_id` cleared the conversation after it was sent.
    #[must_use]
    pub fn visible_to(mut self, user_id: Uuid) -> Self {
        let hidden = match (&self.last_message, self.cleared_at_for(user_id)) {
            (Some(last), Some(cleared_at)) => last.sent_at <= cleared_at,
            _ => false,
        };
        if hidden {
            self.last_message = None;
        }
        self
    }
}

/// Orders a participant pair smaller-id-first so that both directions map to one row.
#[must_use]
pub fn canonical_pair(a: Uuid, b: Uuid) -> (Uuid, Uuid) {
    if a <= b { (a, b) } else { (b, a) }
}
