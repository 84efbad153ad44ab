use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use time::OffsetDateTime;
use uuid::Uuid;

/// Who may open a new conversation with a user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WhoCanMessage {
    #[default]
    Everyone,
    Followers,
    None,
}

impl WhoCanMessage {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Everyone => "everyone",
            Self::Followers => "followers",
            Self::None => "none",
        }
    }
}

impl fmt::Display for WhoCanMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WhoCanMessage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "everyone" => Ok(Self::Everyone),
            "followers" => Ok(Self::Followers),
            "none" => Ok(Self::None),
            other => Err(format!("unknown who_can_message value: {other}")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub full_name: String,
    pub avatar_url: Option<String>,
    pub who_can_message: WhoCanMessage,
    pub created_at: OffsetDateTime,
}

impl User {
    #[must_use]
    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id,
            username: self.username.clone(),
            full_name: self.full_name.clone(),
            avatar_url: self.avatar_url.clone(),
        }
    }
}

/// The public slice of a user shown next to conversations and messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserSummary {
    pub id: Uuid,
    pub username: String,
    pub full_name: String,
    pub avatar_url: Option<String>,
}

/// Partial profile update; `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
    pub who_can_message: Option<WhoCanMessage>,
}

impl ProfileUpdate {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.full_name.is_none() && self.avatar_url.is_none() && self.who_can_message.is_none()
    }
}

/// Checks the username shape accepted at registration.
///
/// # Errors
/// Returns a human readable reason when the username is rejected.
pub fn validate_username(username: &str) -> Result<(), String> {
    let len = username.chars().count();
    if !(3..=32).contains(&len) {
        return Err("Username must be between 3 and 32 characters".into());
    }
    if !username.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.') {
        return Err("Username may only contain letters, digits, '_' and '.'".into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_who_can_message_roundtrip_strings() {
        for setting in [WhoCanMessage::Everyone, WhoCanMessage::Followers, WhoCanMessage::None] {
            assert_eq!(setting.as_str().parse::<WhoCanMessage>().unwrap(), setting);
        }
        assert!("friends".parse::<WhoCanMessage>().is_err());
    }

    #[test]
    fn test_who_can_message_serde_names() {
        assert_eq!(serde_json::to_string(&WhoCanMessage::None).unwrap(), "\"none\"");
        let parsed: WhoCanMessage = serde_json::from_str("\"followers\"").unwrap();
        assert_eq!(parsed, WhoCanMessage::Followers);
    }

    #[test]
    fn test_validate_username() {
        assert!(validate_username("alice_01").is_ok());
        assert!(validate_username("a.b").is_ok());
        assert!(validate_username("ab").is_err());
        assert!(validate_username("has space").is_err());
        assert!(validate_username(&"x".repeat(33)).is_err());
    }
}
