use std::sync::Arc;

use cloudcost_context::RequestMode;
use cloudcost_persist::{NewAnalysis, NewMessage, PersistenceClient};
use serde_json::Value;

use crate::error::Result;
use crate::types::ChatReply;

/// Persists an assistant reply and shapes it for the caller
pub struct ResponseRelay {
    persist: Arc<dyn PersistenceClient>,
}

impl ResponseRelay {
    pub fn new(persist: Arc<dyn PersistenceClient>) -> Self {
        Self { persist }
    }

    /// Store `reply` as the assistant turn of `thread_id`. File-analysis
    /// replies also produce an analysis record.
    pub async fn relay(
        &self,
        user_id: &str,
        thread_id: &str,
        mode: &RequestMode,
        reply: String,
        relevant: bool,
    ) -> Result<ChatReply> {
        self.persist
            .save_message(NewMessage::assistant(user_id, thread_id, reply.as_str(), relevant))
            .await?;

        let analysis_id = match mode {
            RequestMode::FileAnalysis {
                plan,
                metrics,
                comment,
            } => {
                let analysis = self
                    .persist
                    .save_analysis(NewAnalysis {
                        user_id: user_id.to_string(),
                        thread_id: Some(thread_id.to_string()),
                        plan: plan.clone(),
                        metrics: metrics.clone(),
                        comment: comment.clone(),
                        result: reply.clone(),
                        structured: extract_json_block(&reply),
                    })
                    .await?;
                tracing::debug!(analysis_id = %analysis.id, thread_id, "Saved analysis");
                Some(analysis.id)
            }
            RequestMode::Conversation { .. } => None,
        };

        Ok(ChatReply {
            reply,
            thread_id: thread_id.to_string(),
            mode: mode.name(),
            relevant,
            analysis_id,
        })
    }
}

/// First fenced ```json block of `text`, parsed
pub fn extract_json_block(text: &str) -> Option<Value> {
    let start = text.find("```json")? + "```json".len();
    let rest = &text[start..];
    let end = rest.find("```")?;
    serde_json::from_str(rest[..end].trim()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_fenced_json() {
        let text = "Summary: downsize.\n```json\n[{\"resource\": \"ec2\", \"estimatedMonthlySavings\": 40}]\n```\nDone.";
        let value = extract_json_block(text).unwrap();
        assert_eq!(value[0]["resource"], "ec2");
        assert_eq!(value[0]["estimatedMonthlySavings"], 40);
    }

    #[test]
    fn test_missing_or_invalid_block() {
        assert!(extract_json_block("no code here").is_none());
        assert!(extract_json_block("```json\n{not json}\n```").is_none());
        assert!(extract_json_block("```json\n[1, 2]").is_none());
    }
}
