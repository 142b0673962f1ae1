use cloudcost_llm::{ChatOptions, Message};
use cloudcost_persist::StoredMessage;

use crate::mode::RequestMode;

/// Everything needed for one LLM call
#[derive(Debug, Clone)]
pub struct ContextWindow {
    pub system_prompt: Option<String>,
    pub messages: Vec<Message>,
    pub options: ChatOptions,
}

impl ContextWindow {
    /// Ordered turn list with the system prompt first
    pub fn into_messages(self) -> Vec<Message> {
        self.system_prompt
            .map(Message::system)
            .into_iter()
            .chain(self.messages)
            .collect()
    }
}

/// Strategy for building the context window of a turn
pub trait ContextStrategy: Send + Sync {
    /// `history` holds the thread's prior turns, oldest first, without the new one
    fn build_window(&self, mode: &RequestMode, history: &[StoredMessage]) -> ContextWindow;

    /// Window asking for a summary of a whole thread transcript
    fn summary_window(&self, transcript: &str) -> ContextWindow;
}
