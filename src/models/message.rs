use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An inbox message (tournament updates, system notifications).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    #[serde(default)]
    pub id: i64,
    pub subject: Option<String>,
    pub content: String,
    #[serde(rename = "type", default)]
    pub message_type: Option<String>,
    #[serde(default)]
    pub read: bool,
    #[serde(rename = "createdAt")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Response wrapper from the messages endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct MessagesResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(rename = "unreadCount", default)]
    pub unread_count: i64,
    #[serde(default)]
    pub total: i64,
    pub message: Option<String>,
}
