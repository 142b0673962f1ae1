/// Per-client conversation context passed explicitly through every turn
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatSession {
    pub user_id: String,
    /// Active thread; resolved on the first turn when absent
    pub thread_id: Option<String>,
    /// Correlation id for files uploaded ahead of a turn
    pub session_id: String,
}

impl ChatSession {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            thread_id: None,
            session_id: new_session_id(),
        }
    }

    pub fn with_thread(mut self, thread_id: impl Into<String>) -> Self {
        self.thread_id = Some(thread_id.into());
        self
    }

    /// Reuse a client-supplied correlation id; blank ids are ignored
    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        let session_id = session_id.into();
        if !session_id.trim().is_empty() {
            self.session_id = session_id;
        }
        self
    }

    /// Fresh session on `thread_id` for the same user with a new correlation id
    pub fn restart(&self, thread_id: impl Into<String>) -> Self {
        Self {
            user_id: self.user_id.clone(),
            thread_id: Some(thread_id.into()),
            session_id: new_session_id(),
        }
    }
}

fn new_session_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
