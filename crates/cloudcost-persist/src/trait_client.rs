use async_trait::async_trait;

use crate::models::{Analysis, NewAnalysis, NewMessage, StoredMessage, Thread, ThreadListing};
use crate::error::Result;

/// Returned by [`PersistenceClient::get_full_thread_text`] for a thread without messages
pub const NO_MESSAGES_SENTINEL: &str = "No messages in this conversation yet.";

/// Trait for database persistence operations
///
/// Every operation is scoped by `user_id`; a thread owned by someone else
/// behaves exactly like a missing one. Messages and analyses are append-only.
#[async_trait]
pub trait PersistenceClient: Send + Sync {
    /// Create a new thread with a fresh id and the default title
    async fn create_thread(&self, user_id: &str) -> Result<Thread>;

    /// Get a thread by ID
    async fn get_thread(&self, user_id: &str, thread_id: &str) -> Result<Option<Thread>>;

    /// Most recently created thread of a user (ties broken by insert sequence)
    async fn get_latest_thread(&self, user_id: &str) -> Result<Option<Thread>>;

    /// Threads of a user with message counts, newest first
    async fn list_threads(&self, user_id: &str) -> Result<Vec<ThreadListing>>;

    /// Append one message with a server-assigned timestamp and sequence number.
    /// Not idempotent: every call stores a new row.
    async fn save_message(&self, message: NewMessage) -> Result<StoredMessage>;

    /// Full history of a thread in insertion order
    async fn get_thread_messages(
        &self,
        user_id: &str,
        thread_id: &str,
    ) -> Result<Vec<StoredMessage>>;

    /// Append one analysis record
    async fn save_analysis(&self, analysis: NewAnalysis) -> Result<Analysis>;

    /// Analyses of a user, optionally restricted to one thread, oldest first
    async fn list_analyses(
        &self,
        user_id: &str,
        thread_id: Option<&str>,
    ) -> Result<Vec<Analysis>>;

    /// Cheap round trip to the backing store
    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    /// Whole thread as `role: content` lines, or [`NO_MESSAGES_SENTINEL`] when empty
    async fn get_full_thread_text(&self, user_id: &str, thread_id: &str) -> Result<String> {
        let messages = self.get_thread_messages(user_id, thread_id).await?;
        if messages.is_empty() {
            return Ok(NO_MESSAGES_SENTINEL.to_string());
        }

        Ok(messages
            .iter()
            .map(StoredMessage::transcript_line)
            .collect::<Vec<_>>()
            .join("\n"))
    }
}
