pub mod block;
pub mod conversation;
pub mod message;
pub mod user;

pub use block::BlockedUserRecord;
pub use conversation::ConversationRecord;
pub use message::MessageRecord;
pub use user::UserRecord;
