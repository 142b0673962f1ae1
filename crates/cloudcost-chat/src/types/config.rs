use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_LLM_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    pub model: String,
    /// Upper bound for one LLM call; expiry fails the turn
    pub llm_timeout: Duration,
    /// Ask the model to classify each text field before answering
    pub relevance_check: bool,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            llm_timeout: DEFAULT_LLM_TIMEOUT,
            relevance_check: false,
        }
    }
}

impl ChatConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.llm_timeout = timeout;
        self
    }

    pub fn with_relevance_check(mut self, enabled: bool) -> Self {
        self.relevance_check = enabled;
        self
    }
}
