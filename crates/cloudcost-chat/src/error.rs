use std::time::Duration;

use cloudcost_persist::PersistError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChatError {
    #[error("Thread not found: {0}")]
    ThreadNotFound(String),

    #[error("Storage error: {0}")]
    Storage(PersistError),

    #[error("LLM call failed: {0}")]
    Llm(String),

    #[error("LLM call timed out after {0:?}")]
    Timeout(Duration),
}

impl From<PersistError> for ChatError {
    fn from(err: PersistError) -> Self {
        match err {
            PersistError::ThreadNotFound(id) => ChatError::ThreadNotFound(id),
            other => ChatError::Storage(other),
        }
    }
}

impl ChatError {
    /// Failure of the external model rather than of this service
    pub fn is_llm_failure(&self) -> bool {
        matches!(self, ChatError::Llm(_) | ChatError::Timeout(_))
    }
}

pub type Result<T> = std::result::Result<T, ChatError>;
