use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    Text,
    Image,
    File,
}

impl MessageType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Image => "image",
            Self::File => "file",
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(Self::Text),
            "image" => Ok(Self::Image),
            "file" => Ok(Self::File),
            _ => Err("invalid message type: must be text, image, or file".into()),
        }
    }
}

/// Metadata of an already uploaded file, carried inline with the message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentMetadata {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    pub filename: String,
    #[serde(default)]
    pub original_filename: String,
    pub size: i64,
    pub mime_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<i32>,
    #[serde(default, with = "time::serde::rfc3339::option", skip_serializing_if = "Option::is_none")]
    pub uploaded_at: Option<OffsetDateTime>,
}

#[derive(Debug, Clone)]
pub struct Message {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub sender_id: Uuid,
    pub message_type: MessageType,
    pub content: Option<String>,
    pub attachments: Vec<AttachmentMetadata>,
    pub is_read: bool,
    pub read_at: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
}

impl Message {
    #[must_use]
    pub const fn status(&self) -> &'static str {
        if self.is_read { "read" } else { "sent" }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct MessageLimits {
    pub max_text_length: usize,
    pub max_attachments: usize,
    pub preview_length: usize,
}

/// A message that passed type-specific validation and is ready to be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub message_type: MessageType,
    pub content: Option<String>,
    pub attachments: Vec<AttachmentMetadata>,
}

impl OutgoingMessage {
    /// Applies the per-type rules: text needs non-blank content within the length cap,
    /// image and file need between one and `max_attachments` attachments.
    ///
    /// # Errors
    /// Returns the reason the message is rejected.
    pub fn validate(
        message_type: MessageType,
        content: Option<String>,
        attachments: Vec<AttachmentMetadata>,
        limits: &MessageLimits,
    ) -> Result<Self, String> {
        let content = content.filter(|c| !c.trim().is_empty());

        match message_type {
            MessageType::Text => {
                let Some(text) = content.as_deref() else {
                    return Err("text message content cannot be empty".into());
                };
                if text.chars().count() > limits.max_text_length {
                    return Err(format!("message content too long (max {} characters)", limits.max_text_length));
                }
            }
            MessageType::Image | MessageType::File => {
                if attachments.is_empty() {
                    return Err(format!("{message_type} message requires attachments"));
                }
                if attachments.len() > limits.max_attachments {
                    return Err(format!("maximum {} attachments per message", limits.max_attachments));
                }
            }
        }

        Ok(Self { message_type, content, attachments })
    }

    /// Text stored on the conversation row as the list-view preview.
    #[must_use]
    pub fn preview_text(&self, max_chars: usize) -> String {
        match self.message_type {
            MessageType::Text => {
                let text = self.content.as_deref().unwrap_or_default();
                if text.chars().count() > max_chars {
                    let truncated: String = text.chars().take(max_chars).collect();
                    format!("{truncated}...")
                } else {
                    text.to_string()
                }
            }
            MessageType::Image => match self.content.as_deref() {
                Some(caption) => format!("📷 {caption}"),
                None => "📷 Photo".to_string(),
            },
            MessageType::File => match self.attachments.first() {
                Some(attachment) => format!("📎 {}", attachment.filename),
                None => "📎 File".to_string(),
            },
        }
    }
}
