use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

pub const DEFAULT_THREAD_TITLE: &str = "New Chat";

/// Database-agnostic thread model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thread {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
    /// Insert sequence number, breaks ties between equal `created_at` values
    pub seq: u64,
}

impl Thread {
    pub fn new(user_id: impl Into<String>, seq: u64) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            title: DEFAULT_THREAD_TITLE.to_string(),
            created_at: Utc::now(),
            seq,
        }
    }

    /// Ordering key, most recent thread sorts last
    pub fn recency_key(&self) -> (DateTime<Utc>, u64) {
        (self.created_at, self.seq)
    }
}

/// Thread summary row returned by thread listings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreadListing {
    #[serde(flatten)]
    pub thread: Thread,
    pub message_count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latest_thread_tie_broken_by_seq() {
        let now = Utc::now();
        let threads: Vec<Thread> = [4, 9, 7]
            .into_iter()
            .map(|seq| Thread {
                created_at: now,
                ..Thread::new("guest", seq)
            })
            .collect();

        let latest = threads.iter().max_by_key(|t| t.recency_key()).unwrap();
        assert_eq!(latest.seq, 9);
    }
}
