use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::trait_client::PersistenceClient;
use crate::models::{Analysis, NewAnalysis, NewMessage, StoredMessage, Thread, ThreadListing};
use crate::error::{PersistError, Result};

#[derive(Default)]
struct Tables {
    threads: Vec<Thread>,
    messages: Vec<StoredMessage>,
    analyses: Vec<Analysis>,
}

impl Tables {
    fn owned_thread(&self, user_id: &str, thread_id: &str) -> Option<&Thread> {
        self.threads
            .iter()
            .find(|t| t.id == thread_id && t.user_id == user_id)
    }
}

/// Process-local backend. Data lives as long as the client.
#[derive(Default)]
pub struct InMemoryPersistenceClient {
    tables: RwLock<Tables>,
    seq: AtomicU64,
}

impl InMemoryPersistenceClient {
    pub fn new() -> Self {
        Self::default()
    }

    // Called with the write lock held so sequence order matches insert order
    fn next_seq(&self) -> u64 {
        self.seq.fetch_add(1, Ordering::SeqCst) + 1
    }
}

#[async_trait]
impl PersistenceClient for InMemoryPersistenceClient {
    async fn create_thread(&self, user_id: &str) -> Result<Thread> {
        let mut tables = self.tables.write().await;
        let thread = Thread::new(user_id, self.next_seq());
        tables.threads.push(thread.clone());

        tracing::debug!(thread_id = %thread.id, user_id, "Created thread");
        Ok(thread)
    }

    async fn get_thread(&self, user_id: &str, thread_id: &str) -> Result<Option<Thread>> {
        let tables = self.tables.read().await;
        Ok(tables.owned_thread(user_id, thread_id).cloned())
    }

    async fn get_latest_thread(&self, user_id: &str) -> Result<Option<Thread>> {
        let tables = self.tables.read().await;
        Ok(tables
            .threads
            .iter()
            .filter(|t| t.user_id == user_id)
            .max_by_key(|t| t.recency_key())
            .cloned())
    }

    async fn list_threads(&self, user_id: &str) -> Result<Vec<ThreadListing>> {
        let tables = self.tables.read().await;
        let mut threads: Vec<&Thread> = tables
            .threads
            .iter()
            .filter(|t| t.user_id == user_id)
            .collect();
        threads.sort_by_key(|t| std::cmp::Reverse(t.recency_key()));

        Ok(threads
            .into_iter()
            .map(|thread| ThreadListing {
                message_count: tables
                    .messages
                    .iter()
                    .filter(|m| m.thread_id == thread.id)
                    .count() as u64,
                thread: thread.clone(),
            })
            .collect())
    }

    async fn save_message(&self, message: NewMessage) -> Result<StoredMessage> {
        let mut tables = self.tables.write().await;
        if tables.owned_thread(&message.user_id, &message.thread_id).is_none() {
            return Err(PersistError::ThreadNotFound(message.thread_id));
        }

        let stored = message.into_stored(self.next_seq());
        tables.messages.push(stored.clone());
        Ok(stored)
    }

    async fn get_thread_messages(
        &self,
        user_id: &str,
        thread_id: &str,
    ) -> Result<Vec<StoredMessage>> {
        let tables = self.tables.read().await;
        if tables.owned_thread(user_id, thread_id).is_none() {
            return Err(PersistError::ThreadNotFound(thread_id.to_string()));
        }

        let mut messages: Vec<StoredMessage> = tables
            .messages
            .iter()
            .filter(|m| m.thread_id == thread_id)
            .cloned()
            .collect();
        messages.sort_by_key(StoredMessage::order_key);
        Ok(messages)
    }

    async fn save_analysis(&self, analysis: NewAnalysis) -> Result<Analysis> {
        let mut tables = self.tables.write().await;
        if let Some(thread_id) = analysis.thread_id.as_deref() {
            if tables.owned_thread(&analysis.user_id, thread_id).is_none() {
                return Err(PersistError::ThreadNotFound(thread_id.to_string()));
            }
        }

        let record = analysis.into_analysis();
        tables.analyses.push(record.clone());
        Ok(record)
    }

    async fn list_analyses(
        &self,
        user_id: &str,
        thread_id: Option<&str>,
    ) -> Result<Vec<Analysis>> {
        let tables = self.tables.read().await;
        Ok(tables
            .analyses
            .iter()
            .filter(|a| a.user_id == user_id)
            .filter(|a| thread_id.map_or(true, |id| a.thread_id.as_deref() == Some(id)))
            .cloned()
            .collect())
    }
}
