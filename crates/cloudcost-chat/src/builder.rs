use std::sync::Arc;
use anyhow::{Result, anyhow};

use cloudcost_context::{ContextStrategy, ConversationAssembler};
use cloudcost_llm::ChatClient;
use cloudcost_persist::{PersistenceClient, UploadStore};

use crate::lifecycle::ThreadLifecycle;
use crate::pipeline::ChatPipeline;
use crate::types::ChatConfig;

/// Builder for constructing a ChatPipeline with optional components
pub struct ChatPipelineBuilder {
    llm_client: Option<Arc<dyn ChatClient>>,
    persistence: Option<Arc<dyn PersistenceClient>>,
    uploads: Option<Arc<UploadStore>>,
    context: Option<Arc<dyn ContextStrategy>>,
    config: ChatConfig,
}

impl ChatPipelineBuilder {
    pub fn new() -> Self {
        Self {
            llm_client: None,
            persistence: None,
            uploads: None,
            context: None,
            config: ChatConfig::default(),
        }
    }

    /// Set the LLM client
    pub fn llm_client(mut self, client: Arc<dyn ChatClient>) -> Self {
        self.llm_client = Some(client);
        self
    }

    /// Set the persistence backend
    pub fn with_persistence(mut self, client: Arc<dyn PersistenceClient>) -> Self {
        self.persistence = Some(client);
        self
    }

    /// Pending uploads are discarded on new chat and thread selection
    pub fn with_uploads(mut self, uploads: Arc<UploadStore>) -> Self {
        self.uploads = Some(uploads);
        self
    }

    /// Replace the default [`ConversationAssembler`]
    pub fn context_strategy(mut self, strategy: Arc<dyn ContextStrategy>) -> Self {
        self.context = Some(strategy);
        self
    }

    pub fn config(mut self, config: ChatConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the ChatPipeline
    pub fn build(self) -> Result<ChatPipeline> {
        let llm_client = self.llm_client
            .ok_or_else(|| anyhow!("LLM client is required"))?;
        let persistence = self.persistence
            .ok_or_else(|| anyhow!("Persistence client is required"))?;
        let context = self.context
            .unwrap_or_else(|| Arc::new(ConversationAssembler::default()));

        let lifecycle = ThreadLifecycle::new(Arc::clone(&persistence), self.uploads);

        Ok(ChatPipeline::new(
            llm_client,
            persistence,
            context,
            lifecycle,
            self.config,
        ))
    }
}

impl Default for ChatPipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
