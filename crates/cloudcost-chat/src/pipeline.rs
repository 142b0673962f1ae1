use std::sync::Arc;

use cloudcost_context::{
    ChatInput, ContextStrategy, ContextWindow, OffTopicFilter, RelevanceChecker, RequestMode,
    OFF_TOPIC_REPLY,
};
use cloudcost_llm::{ChatClient, ChatRequest};
use cloudcost_persist::{NewMessage, PersistenceClient, NO_MESSAGES_SENTINEL};

use crate::error::{ChatError, Result};
use crate::lifecycle::ThreadLifecycle;
use crate::relay::ResponseRelay;
use crate::types::{ChatConfig, ChatSession, TurnOutcome};

/// One sequential pipeline per chat turn:
/// resolve thread, persist the user turn, call the model, relay the reply.
pub struct ChatPipeline {
    llm_client: Arc<dyn ChatClient>,
    persist: Arc<dyn PersistenceClient>,
    context: Arc<dyn ContextStrategy>,
    lifecycle: ThreadLifecycle,
    relay: ResponseRelay,
    off_topic: OffTopicFilter,
    relevance: Option<RelevanceChecker>,
    config: ChatConfig,
}

impl ChatPipeline {
    pub(crate) fn new(
        llm_client: Arc<dyn ChatClient>,
        persist: Arc<dyn PersistenceClient>,
        context: Arc<dyn ContextStrategy>,
        lifecycle: ThreadLifecycle,
        config: ChatConfig,
    ) -> Self {
        let relevance = config
            .relevance_check
            .then(|| RelevanceChecker::new(Arc::clone(&llm_client), config.model.clone()));

        Self {
            relay: ResponseRelay::new(Arc::clone(&persist)),
            llm_client,
            persist,
            context,
            lifecycle,
            off_topic: OffTopicFilter::new(),
            relevance,
            config,
        }
    }

    /// Create a builder for fluent construction
    pub fn builder() -> crate::builder::ChatPipelineBuilder {
        crate::builder::ChatPipelineBuilder::new()
    }

    pub fn lifecycle(&self) -> &ThreadLifecycle {
        &self.lifecycle
    }

    /// Run one turn. The user's message is committed before the model is
    /// called; when the model fails no assistant message is stored.
    pub async fn handle_turn(
        &self,
        session: &mut ChatSession,
        input: ChatInput,
    ) -> Result<TurnOutcome> {
        let Some(mode) = RequestMode::from_input(&input) else {
            tracing::debug!(user_id = %session.user_id, "Nothing to send, skipping turn");
            return Ok(TurnOutcome::Skipped);
        };

        let thread = self.lifecycle.resolve_thread(session).await?;
        let user_id = session.user_id.as_str();

        // History is read before the new turn is appended so it never shows up twice
        let history = match &mode {
            RequestMode::Conversation { .. } => {
                self.persist.get_thread_messages(user_id, &thread.id).await?
            }
            RequestMode::FileAnalysis { .. } => Vec::new(),
        };

        let off_topic = match &mode {
            RequestMode::Conversation { message } => self.off_topic.matched_category(message),
            RequestMode::FileAnalysis { .. } => None,
        };
        let relevant = match (off_topic, &self.relevance) {
            (Some(_), _) => false,
            (None, Some(checker)) => checker.check_all(&mode.fields()).await,
            (None, None) => true,
        };

        self.persist
            .save_message(NewMessage::user(
                user_id,
                &thread.id,
                mode.user_turn_text(),
                relevant,
            ))
            .await?;

        if let Some(category) = off_topic {
            tracing::info!(thread_id = %thread.id, category, "Off-topic message, sending redirect");
            let reply = self
                .relay
                .relay(user_id, &thread.id, &mode, OFF_TOPIC_REPLY.to_string(), false)
                .await?;
            return Ok(TurnOutcome::Replied(reply));
        }

        let window = self.context.build_window(&mode, &history);
        let reply = match self.complete(window).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::error!(
                    thread_id = %thread.id,
                    mode = mode.name(),
                    error = %e,
                    "LLM call failed, no assistant message stored"
                );
                return Err(e);
            }
        };

        let reply = self
            .relay
            .relay(user_id, &thread.id, &mode, reply, relevant)
            .await?;

        tracing::info!(thread_id = %thread.id, mode = reply.mode, relevant, "Turn completed");
        Ok(TurnOutcome::Replied(reply))
    }

    /// LLM summary of a whole thread. Empty threads return the no-messages
    /// sentinel without calling the model.
    pub async fn summarize(&self, user_id: &str, thread_id: &str) -> Result<String> {
        let transcript = self.persist.get_full_thread_text(user_id, thread_id).await?;
        if transcript == NO_MESSAGES_SENTINEL {
            return Ok(transcript);
        }

        let window = self.context.summary_window(&transcript);
        self.complete(window).await
    }

    async fn complete(&self, window: ContextWindow) -> Result<String> {
        let options = window.options.clone();
        let request =
            ChatRequest::new(self.config.model.clone(), window.into_messages()).with_options(options);

        let response = tokio::time::timeout(self.config.llm_timeout, self.llm_client.chat(request))
            .await
            .map_err(|_| ChatError::Timeout(self.config.llm_timeout))?
            .map_err(|e| ChatError::Llm(e.to_string()))?;

        response.into_text().map_err(|e| ChatError::Llm(e.to_string()))
    }
}
