use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cloudcost_api::{
    build_router,
    config::{Config, StorageBackend},
    state::AppState,
};
use cloudcost_llm::{ChatClient, OpenAIClient, OpenAIConfig};
use cloudcost_persist::{InMemoryPersistenceClient, PersistenceClient, UploadStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Config::load()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

    // Initialize logging
    init_logging(&config);

    tracing::info!("Starting cloud cost chat API server");
    tracing::info!("Config loaded: {}:{}", config.server.host, config.server.port);

    // Initialize LLM client
    let mut openai_config = OpenAIConfig::new(config.openai_api_key.clone());
    if let Some(base_url) = &config.llm.base_url {
        openai_config = openai_config.with_base_url(base_url.clone());
    }
    let llm_client: Arc<dyn ChatClient> = Arc::new(OpenAIClient::from_config(openai_config)?);
    tracing::info!(model = %config.llm.model, "LLM client ready");

    // Initialize persistence
    let persist = connect_storage(&config).await?;

    let uploads = Arc::new(
        UploadStore::new(&config.storage.upload_dir, config.storage.max_upload_bytes).await?,
    );

    // Create application state
    let state = Arc::new(AppState::new(config.clone(), persist, uploads, llm_client)?);

    // Build router
    let app = build_router(state);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on {}", addr);
    tracing::info!("Health check: http://{}/health", addr);
    tracing::info!("API docs: http://{}/api/openapi.json", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

async fn connect_storage(config: &Config) -> anyhow::Result<Arc<dyn PersistenceClient>> {
    match config.storage.backend {
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage, data is lost on restart");
            Ok(Arc::new(InMemoryPersistenceClient::new()))
        }
        #[cfg(feature = "mongodb")]
        StorageBackend::Mongodb => {
            tracing::info!(database = %config.storage.database, "Connecting to MongoDB");
            let client = cloudcost_persist::MongoPersistenceClient::connect(
                &config.mongodb_uri,
                &config.storage.database,
            )
            .await?;
            Ok(Arc::new(client))
        }
        #[cfg(not(feature = "mongodb"))]
        StorageBackend::Mongodb => {
            anyhow::bail!("storage.backend = \"mongodb\" requires the `mongodb` feature")
        }
    }
}

fn init_logging(config: &Config) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);

    match config.logging.format.as_str() {
        "json" => {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            registry
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }
}
