use std::sync::Arc;

use cloudcost_llm::{ChatClient, ChatOptions, ChatRequest, Message};
use futures::future::join_all;

use crate::templates::{render, RELEVANCE_PROMPT};

// Inputs longer than this are truncated before classification
const MAX_CHECK_CHARS: usize = 4000;

/// Asks the model whether pieces of user text are about cloud cost
pub struct RelevanceChecker {
    client: Arc<dyn ChatClient>,
    model: String,
}

impl RelevanceChecker {
    pub fn new(client: Arc<dyn ChatClient>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    /// True when every field is judged relevant. Fields are checked
    /// concurrently; a failed check counts as relevant.
    pub async fn check_all(&self, fields: &[&str]) -> bool {
        let checks = fields
            .iter()
            .filter(|f| !f.trim().is_empty())
            .map(|field| self.check(field));

        join_all(checks).await.into_iter().all(|relevant| relevant)
    }

    pub async fn check(&self, text: &str) -> bool {
        let excerpt: String = text.chars().take(MAX_CHECK_CHARS).collect();
        let request = ChatRequest::new(
            self.model.clone(),
            vec![Message::human(render(RELEVANCE_PROMPT, &[("text", &excerpt)]))],
        )
        .with_options(ChatOptions::new().temperature(0.0).max_tokens(3));

        match self.client.chat(request).await.and_then(|r| r.into_text()) {
            Ok(answer) => is_affirmative(&answer),
            Err(e) => {
                tracing::warn!(error = %e, "Relevance check failed, assuming relevant");
                true
            }
        }
    }
}

fn is_affirmative(answer: &str) -> bool {
    answer
        .trim()
        .trim_matches(|c: char| !c.is_alphanumeric())
        .to_ascii_lowercase()
        .starts_with("yes")
}
