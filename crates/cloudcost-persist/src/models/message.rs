use std::fmt;

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A turn waiting to be appended to a thread
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub user_id: String,
    pub thread_id: String,
    pub role: MessageRole,
    pub content: String,
    pub relevant: bool,
}

impl NewMessage {
    pub fn user(
        user_id: impl Into<String>,
        thread_id: impl Into<String>,
        content: impl Into<String>,
        relevant: bool,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            thread_id: thread_id.into(),
            role: MessageRole::User,
            content: content.into(),
            relevant,
        }
    }

    pub fn assistant(
        user_id: impl Into<String>,
        thread_id: impl Into<String>,
        content: impl Into<String>,
        relevant: bool,
    ) -> Self {
        Self {
            role: MessageRole::Assistant,
            ..Self::user(user_id, thread_id, content, relevant)
        }
    }

    pub(crate) fn into_stored(self, seq: u64) -> StoredMessage {
        StoredMessage {
            id: uuid::Uuid::new_v4().to_string(),
            thread_id: self.thread_id,
            user_id: self.user_id,
            role: self.role,
            content: self.content,
            relevant: self.relevant,
            created_at: Utc::now(),
            seq,
        }
    }
}

/// Database-agnostic message model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredMessage {
    pub id: String,
    pub thread_id: String,
    pub user_id: String,
    pub role: MessageRole,
    pub content: String,
    pub relevant: bool,
    pub created_at: DateTime<Utc>,
    pub seq: u64,
}

impl StoredMessage {
    /// Chronological ordering key within a thread
    pub fn order_key(&self) -> (DateTime<Utc>, u64) {
        (self.created_at, self.seq)
    }

    /// `role: content` line used in prompts and transcripts
    pub fn transcript_line(&self) -> String {
        format!("{}: {}", self.role, self.content)
    }
}
