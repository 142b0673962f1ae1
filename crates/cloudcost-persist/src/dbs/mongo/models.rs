use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use bson::serde_helpers::chrono_datetime_as_bson_datetime;

use crate::models::{Analysis, MessageRole, StoredMessage, Thread};

/// MongoDB thread document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoThread {
    #[serde(rename = "_id")]
    pub id: String,
    pub user_id: String,
    pub title: String,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    pub seq: i64,
}

/// MongoDB message document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoMessage {
    #[serde(rename = "_id")]
    pub id: String,
    pub thread_id: String,
    pub user_id: String,
    pub role: MessageRole,
    pub content: String,
    pub relevant: bool,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    pub seq: i64,
}

/// MongoDB analysis document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoAnalysis {
    #[serde(rename = "_id")]
    pub id: String,
    pub user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,
    pub plan: String,
    pub metrics: String,
    pub comment: String,
    pub result: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub structured: Option<serde_json::Value>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

// Conversions between database-agnostic and MongoDB-specific models.
// BSON has no unsigned 64-bit integer, sequences are stored as i64.

impl From<Thread> for MongoThread {
    fn from(thread: Thread) -> Self {
        Self {
            id: thread.id,
            user_id: thread.user_id,
            title: thread.title,
            created_at: thread.created_at,
            seq: thread.seq as i64,
        }
    }
}

impl From<MongoThread> for Thread {
    fn from(thread: MongoThread) -> Self {
        Self {
            id: thread.id,
            user_id: thread.user_id,
            title: thread.title,
            created_at: thread.created_at,
            seq: thread.seq.max(0) as u64,
        }
    }
}

impl From<StoredMessage> for MongoMessage {
    fn from(msg: StoredMessage) -> Self {
        Self {
            id: msg.id,
            thread_id: msg.thread_id,
            user_id: msg.user_id,
            role: msg.role,
            content: msg.content,
            relevant: msg.relevant,
            created_at: msg.created_at,
            seq: msg.seq as i64,
        }
    }
}

impl From<MongoMessage> for StoredMessage {
    fn from(msg: MongoMessage) -> Self {
        Self {
            id: msg.id,
            thread_id: msg.thread_id,
            user_id: msg.user_id,
            role: msg.role,
            content: msg.content,
            relevant: msg.relevant,
            created_at: msg.created_at,
            seq: msg.seq.max(0) as u64,
        }
    }
}

impl From<Analysis> for MongoAnalysis {
    fn from(a: Analysis) -> Self {
        Self {
            id: a.id,
            user_id: a.user_id,
            thread_id: a.thread_id,
            plan: a.plan,
            metrics: a.metrics,
            comment: a.comment,
            result: a.result,
            structured: a.structured,
            created_at: a.created_at,
        }
    }
}

impl From<MongoAnalysis> for Analysis {
    fn from(a: MongoAnalysis) -> Self {
        Self {
            id: a.id,
            user_id: a.user_id,
            thread_id: a.thread_id,
            plan: a.plan,
            metrics: a.metrics,
            comment: a.comment,
            result: a.result,
            structured: a.structured,
            created_at: a.created_at,
        }
    }
}
