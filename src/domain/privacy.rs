use crate::domain::user::WhoCanMessage;

/// Why a sender may not message a recipient.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denial {
    SelfMessage,
    BlockedByRecipient,
    RecipientBlocked,
    FollowersOnly,
    MessagesDisabled,
}

impl Denial {
    #[must_use]
    pub const fn reason(self) -> &'static str {
        match self {
            Self::SelfMessage => "Cannot message yourself",
            Self::BlockedByRecipient => "You have been blocked by this user",
            Self::RecipientBlocked => "You have blocked this user",
            Self::FollowersOnly => "Only followers can message this user",
            Self::MessagesDisabled => "This user has disabled new messages",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Allowed,
    Denied(Denial),
}

impl Verdict {
    #[must_use]
    pub const fn is_allowed(self) -> bool {
        matches!(self, Self::Allowed)
    }

    #[must_use]
    pub const fn reason(self) -> Option<&'static str> {
        match self {
            Self::Allowed => None,
            Self::Denied(denial) => Some(denial.reason()),
        }
    }

    /// Reports a block from the sender's point of view. Blocks gate both directions,
    /// the wording says which side created the edge.
    #[must_use]
    pub const fn blocked(recipient_blocked_sender: bool) -> Self {
        if recipient_blocked_sender {
            Self::Denied(Denial::BlockedByRecipient)
        } else {
            Self::Denied(Denial::RecipientBlocked)
        }
    }

    /// Applies the recipient's setting to a sender with no prior conversation.
    /// `sender_follows` is only consulted for [`WhoCanMessage::Followers`].
    #[must_use]
    pub fn for_setting(setting: WhoCanMessage, sender_follows: impl FnOnce() -> bool) -> Self {
        match setting {
            WhoCanMessage::Everyone => Self::Allowed,
            WhoCanMessage::Followers => {
                if sender_follows() {
                    Self::Allowed
                } else {
                    Self::Denied(Denial::FollowersOnly)
                }
            }
            WhoCanMessage::None => Self::Denied(Denial::MessagesDisabled),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blocked_wording_depends_on_direction() {
        assert_eq!(Verdict::blocked(true).reason(), Some("You have been blocked by this user"));
        assert_eq!(Verdict::blocked(false).reason(), Some("You have blocked this user"));
        assert!(!Verdict::blocked(true).is_allowed());
    }

    #[test]
    fn test_everyone_allows_without_follow_lookup() {
        let verdict = Verdict::for_setting(WhoCanMessage::Everyone, || unreachable!("follow lookup not needed"));
        assert!(verdict.is_allowed());
        assert_eq!(verdict.reason(), None);
    }

    #[test]
    fn test_followers_setting() {
        assert!(Verdict::for_setting(WhoCanMessage::Followers, || true).is_allowed());
        assert_eq!(
            Verdict::for_setting(WhoCanMessage::Followers, || false),
            Verdict::Denied(Denial::FollowersOnly)
        );
    }

    #[test]
    fn test_none_setting_denies() {
        let verdict = Verdict::for_setting(WhoCanMessage::None, || true);
        assert_eq!(verdict.reason(), Some("This user has disabled new messages"));
    }
}
