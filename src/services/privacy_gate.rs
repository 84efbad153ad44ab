use crate::adapters::database::block_repo::BlockRepository;
use crate::adapters::database::follow_repo::FollowRepository;
use crate::adapters::database::user_repo::UserRepository;
use crate::domain::privacy::{Denial, Verdict};
use crate::domain::user::WhoCanMessage;
use crate::error::{AppError, Result};
use sqlx::PgConnection;
use uuid::Uuid;

/// Decides whether a sender may message a recipient.
///
/// Checks run in a fixed order: self, blocks in either direction, the existing-thread
/// bypass, then the recipient's `who_can_message` setting.
#[derive(Clone, Debug, Default)]
pub struct PrivacyGate {
    user_repo: UserRepository,
    block_repo: BlockRepository,
    follow_repo: FollowRepository,
}

impl PrivacyGate {
    #[must_use]
    pub const fn new(user_repo: UserRepository, block_repo: BlockRepository, follow_repo: FollowRepository) -> Self {
        Self { user_repo, block_repo, follow_repo }
    }

    /// # Errors
    /// Returns `AppError::NotFound` if the recipient's settings have to be read and the
    /// recipient does not exist.
    /// Returns `AppError::Database` if a lookup fails.
    #[tracing::instrument(level = "debug", skip(self, conn), ret)]
    pub(crate) async fn can_message(
        &self,
        conn: &mut PgConnection,
        sender_id: Uuid,
        recipient_id: Uuid,
        has_existing_conversation: bool,
    ) -> Result<Verdict> {
        if sender_id == recipient_id {
            return Ok(Verdict::Denied(Denial::SelfMessage));
        }

        if self.block_repo.is_blocked(&mut *conn, sender_id, recipient_id).await? {
            let recipient_blocked_sender = self.block_repo.is_user_blocked(&mut *conn, recipient_id, sender_id).await?;
            return Ok(Verdict::blocked(recipient_blocked_sender));
        }

        if has_existing_conversation {
            return Ok(Verdict::Allowed);
        }

        let recipient = self
            .user_repo
            .find_by_id(&mut *conn, recipient_id)
            .await?
            .ok_or(AppError::NotFound("Recipient not found"))?;

        let sender_follows = if recipient.who_can_message == WhoCanMessage::Followers {
            self.follow_repo.is_following(&mut *conn, sender_id, recipient_id).await?
        } else {
            false
        };

        Ok(Verdict::for_setting(recipient.who_can_message, || sender_follows))
    }

    /// Bidirectional block check, reported on conversation views.
    ///
    /// # Errors
    /// Returns `AppError::Database` if the lookup fails.
    pub(crate) async fn is_blocked(&self, conn: &mut PgConnection, a: Uuid, b: Uuid) -> Result<bool> {
        self.block_repo.is_blocked(conn, a, b).await
    }
}
