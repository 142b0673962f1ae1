use std::sync::Arc;

use cloudcost_chat::ChatPipeline;
use cloudcost_llm::ChatClient;
use cloudcost_persist::{PersistenceClient, UploadStore};
use crate::config::Config;

/// Shared application state passed to all handlers
///
/// The pipeline is stateless across requests and built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub persist: Arc<dyn PersistenceClient>,
    pub uploads: Arc<UploadStore>,
    pub pipeline: Arc<ChatPipeline>,
}

impl AppState {
    pub fn new(
        config: Config,
        persist: Arc<dyn PersistenceClient>,
        uploads: Arc<UploadStore>,
        llm_client: Arc<dyn ChatClient>,
    ) -> anyhow::Result<Self> {
        let pipeline = ChatPipeline::builder()
            .llm_client(llm_client)
            .with_persistence(Arc::clone(&persist))
            .with_uploads(Arc::clone(&uploads))
            .context_strategy(Arc::new(config.llm.assembler()))
            .config(config.chat_config())
            .build()?;

        Ok(Self {
            config: Arc::new(config),
            persist,
            uploads,
            pipeline: Arc::new(pipeline),
        })
    }
}
