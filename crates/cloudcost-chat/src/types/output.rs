use serde::Serialize;

/// Result of one chat turn
#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    /// Nothing to send; no thread touched, nothing persisted
    Skipped,
    Replied(ChatReply),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatReply {
    pub reply: String,
    pub thread_id: String,
    /// `conversation` or `file_analysis`
    pub mode: &'static str,
    pub relevant: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis_id: Option<String>,
}

impl TurnOutcome {
    pub fn reply(&self) -> Option<&ChatReply> {
        match self {
            TurnOutcome::Replied(reply) => Some(reply),
            TurnOutcome::Skipped => None,
        }
    }
}
