use std::sync::Arc;

use cloudcost_persist::{PersistenceClient, StoredMessage, Thread, UploadStore};

use crate::error::{ChatError, Result};
use crate::types::ChatSession;

/// Decides which thread a turn belongs to and resets session state
pub struct ThreadLifecycle {
    persist: Arc<dyn PersistenceClient>,
    uploads: Option<Arc<UploadStore>>,
}

impl ThreadLifecycle {
    pub fn new(persist: Arc<dyn PersistenceClient>, uploads: Option<Arc<UploadStore>>) -> Self {
        Self { persist, uploads }
    }

    /// Thread for a normal turn: the session's thread if it has one, else the
    /// user's latest thread, else a new one. The session only records the id
    /// once the row exists.
    pub async fn resolve_thread(&self, session: &mut ChatSession) -> Result<Thread> {
        if let Some(thread_id) = session.thread_id.as_deref() {
            return self
                .persist
                .get_thread(&session.user_id, thread_id)
                .await?
                .ok_or_else(|| ChatError::ThreadNotFound(thread_id.to_string()));
        }

        let thread = match self.persist.get_latest_thread(&session.user_id).await? {
            Some(thread) => thread,
            None => self.persist.create_thread(&session.user_id).await?,
        };

        session.thread_id = Some(thread.id.clone());
        Ok(thread)
    }

    /// Always create a thread, then hand back a reset session pointing at it.
    /// On failure the caller keeps its current session untouched.
    pub async fn start_new_chat(&self, session: &ChatSession) -> Result<ChatSession> {
        let thread = self.persist.create_thread(&session.user_id).await?;
        self.discard_uploads(session).await;

        tracing::info!(
            user_id = %session.user_id,
            thread_id = %thread.id,
            "Started new chat"
        );
        Ok(session.restart(thread.id))
    }

    /// Switch to an existing thread and return its full history
    pub async fn select_thread(
        &self,
        session: &mut ChatSession,
        thread_id: &str,
    ) -> Result<Vec<StoredMessage>> {
        let messages = self
            .persist
            .get_thread_messages(&session.user_id, thread_id)
            .await?;

        self.discard_uploads(session).await;
        session.thread_id = Some(thread_id.to_string());
        Ok(messages)
    }

    async fn discard_uploads(&self, session: &ChatSession) {
        let Some(uploads) = &self.uploads else {
            return;
        };
        if let Err(e) = uploads
            .clear_session(&session.user_id, &session.session_id)
            .await
        {
            tracing::warn!(session_id = %session.session_id, error = %e, "Failed to discard pending uploads");
        }
    }
}
