use cloudcost_llm::{ChatOptions, Message};
use cloudcost_persist::StoredMessage;

use crate::mode::RequestMode;
use crate::strategy::{ContextStrategy, ContextWindow};
use crate::templates::{
    render, COST_ANALYSIS_PROMPT, NOT_PROVIDED, NO_HISTORY, SUMMARY_PROMPT, SYSTEM_PROMPT_TEMPLATE,
};

pub const DEFAULT_HISTORY_WINDOW: usize = 12;

/// Default context strategy.
///
/// Conversation turns get a system prompt carrying the last `history_window`
/// messages as `role: content` lines, then the new user turn. File analysis
/// ignores history and sends a single rendered analysis prompt.
#[derive(Debug, Clone)]
pub struct ConversationAssembler {
    history_window: usize,
    conversation_options: ChatOptions,
    analysis_options: ChatOptions,
    summary_options: ChatOptions,
}

impl Default for ConversationAssembler {
    fn default() -> Self {
        Self {
            history_window: DEFAULT_HISTORY_WINDOW,
            conversation_options: ChatOptions::new().temperature(0.7).max_tokens(800),
            analysis_options: ChatOptions::new().temperature(0.2).max_tokens(2000),
            summary_options: ChatOptions::new().temperature(0.3).max_tokens(500),
        }
    }
}

impl ConversationAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn history_window(mut self, messages: usize) -> Self {
        self.history_window = messages;
        self
    }

    pub fn conversation_options(mut self, options: ChatOptions) -> Self {
        self.conversation_options = options;
        self
    }

    pub fn analysis_options(mut self, options: ChatOptions) -> Self {
        self.analysis_options = options;
        self
    }

    pub fn summary_options(mut self, options: ChatOptions) -> Self {
        self.summary_options = options;
        self
    }

    fn render_history(&self, history: &[StoredMessage]) -> String {
        let start = history.len().saturating_sub(self.history_window);
        let window = &history[start..];
        if window.is_empty() {
            return NO_HISTORY.to_string();
        }

        window
            .iter()
            .map(StoredMessage::transcript_line)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl ContextStrategy for ConversationAssembler {
    fn build_window(&self, mode: &RequestMode, history: &[StoredMessage]) -> ContextWindow {
        match mode {
            RequestMode::FileAnalysis {
                plan,
                metrics,
                comment,
            } => {
                let prompt = render(
                    COST_ANALYSIS_PROMPT,
                    &[
                        ("plan", or_placeholder(plan)),
                        ("metrics", or_placeholder(metrics)),
                        ("comment", or_placeholder(comment)),
                    ],
                );
                ContextWindow {
                    system_prompt: None,
                    messages: vec![Message::human(prompt)],
                    options: self.analysis_options.clone(),
                }
            }
            RequestMode::Conversation { message } => {
                let history = self.render_history(history);
                ContextWindow {
                    system_prompt: Some(render(SYSTEM_PROMPT_TEMPLATE, &[("history", &history)])),
                    messages: vec![Message::human(message.as_str())],
                    options: self.conversation_options.clone(),
                }
            }
        }
    }

    fn summary_window(&self, transcript: &str) -> ContextWindow {
        ContextWindow {
            system_prompt: None,
            messages: vec![Message::human(render(
                SUMMARY_PROMPT,
                &[("conversation", transcript)],
            ))],
            options: self.summary_options.clone(),
        }
    }
}

fn or_placeholder(value: &str) -> &str {
    if value.is_empty() {
        NOT_PROVIDED
    } else {
        value
    }
}
