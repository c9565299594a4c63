use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored chat message.
///
/// Serializes as `{ "sender_id", "content", "timestamp" }`; the row id is an
/// internal ordering tiebreaker and never leaves the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    #[serde(skip_serializing, default)]
    pub id: i32,
    pub sender_id: i32,
    pub content: String,
    #[serde(with = "crate::timestamp")]
    pub timestamp: DateTime<Utc>,
}

/// One event pushed to a streaming client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundEvent {
    pub username: String,
    pub content: String,
    pub timestamp: String,
}

impl OutboundEvent {
    pub fn new(message: &Message, username: String) -> Self {
        Self {
            username,
            content: message.content.clone(),
            timestamp: crate::timestamp::format(&message.timestamp),
        }
    }
}

/// Body of `POST /api/new/message`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewMessageRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub content: String,
}

impl NewMessageRequest {
    pub fn is_complete(&self) -> bool {
        !self.username.trim().is_empty() && !self.content.trim().is_empty()
    }
}
