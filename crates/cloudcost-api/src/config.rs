use config::{Config as ConfigLoader, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use cloudcost_chat::ChatConfig;
use cloudcost_context::{ConversationAssembler, DEFAULT_HISTORY_WINDOW};
use cloudcost_llm::ChatOptions;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub cors: CorsConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub relevance: RelevanceConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub logging: LoggingConfig,

    // Secrets (from ENV only)
    #[serde(default)]
    pub mongodb_uri: String,
    #[serde(default)]
    pub openai_api_key: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Whole-request timeout; keep it above `llm.timeout_secs`
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            request_timeout_secs: default_request_timeout(),
        }
    }
}

fn default_request_timeout() -> u64 {
    120
}

#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    pub enabled: bool,
    pub origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            origins: vec!["http://localhost:3000".to_string()],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Memory,
    Mongodb,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub database: String,
    pub upload_dir: PathBuf,
    pub max_upload_bytes: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Memory,
            database: "cloudcost".to_string(),
            upload_dir: PathBuf::from("data/uploads"),
            max_upload_bytes: 10 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    pub model: String,
    /// OpenAI-compatible endpoint, defaults to the public API
    #[serde(default)]
    pub base_url: Option<String>,
    pub timeout_secs: u64,
    /// Prior messages embedded in the conversation system prompt
    pub history_window: usize,
    pub conversation_temperature: f32,
    pub conversation_max_tokens: u32,
    pub analysis_temperature: f32,
    pub analysis_max_tokens: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            base_url: None,
            timeout_secs: 60,
            history_window: DEFAULT_HISTORY_WINDOW,
            conversation_temperature: 0.7,
            conversation_max_tokens: 800,
            analysis_temperature: 0.2,
            analysis_max_tokens: 2000,
        }
    }
}

impl LlmConfig {
    pub fn assembler(&self) -> ConversationAssembler {
        ConversationAssembler::new()
            .history_window(self.history_window)
            .conversation_options(
                ChatOptions::new()
                    .temperature(self.conversation_temperature)
                    .max_tokens(self.conversation_max_tokens),
            )
            .analysis_options(
                ChatOptions::new()
                    .temperature(self.analysis_temperature)
                    .max_tokens(self.analysis_max_tokens),
            )
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RelevanceConfig {
    /// Classify each text field with an extra LLM call
    #[serde(default)]
    pub llm_check: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Identity used when a request carries no `X-User-Id` header
    pub guest_user_id: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            guest_user_id: "guest".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from TOML files and environment variables
    ///
    /// Hierarchy (weakest to strongest):
    /// 1. config/default.toml
    /// 2. config/{ENV}.toml (if ENV is set)
    /// 3. Environment variables, e.g. `CLOUDCOST_LLM__MODEL=gpt-4o`
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("ENV").unwrap_or_else(|_| "dev".to_string());

        let builder = ConfigLoader::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(
                Environment::with_prefix("CLOUDCOST")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        let mut cfg: Config = builder.build()?.try_deserialize()?;

        // Load secrets from ENV (not in TOML)
        cfg.openai_api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| ConfigError::Message("OPENAI_API_KEY environment variable is required".to_string()))?;
        if cfg.storage.backend == StorageBackend::Mongodb {
            cfg.mongodb_uri = std::env::var("MONGODB_URI")
                .map_err(|_| ConfigError::Message("MONGODB_URI environment variable is required".to_string()))?;
        }

        Ok(cfg)
    }

    /// Load a single TOML file, without env layering or secrets
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        ConfigLoader::builder()
            .add_source(File::from(path.as_ref()).format(FileFormat::Toml))
            .build()?
            .try_deserialize()
    }

    pub fn chat_config(&self) -> ChatConfig {
        ChatConfig::new()
            .with_model(self.llm.model.clone())
            .with_timeout(Duration::from_secs(self.llm.timeout_secs))
            .with_relevance_check(self.relevance.llm_check)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_structure() {
        let toml = r#"
            [server]
            host = "127.0.0.1"
            port = 3000

            [cors]
            enabled = true
            origins = ["http://localhost:3000"]

            [storage]
            backend = "mongodb"
            database = "test"
            upload_dir = "/tmp/uploads"
            max_upload_bytes = 1024

            [llm]
            model = "gpt-4o"
            timeout_secs = 30
            history_window = 10
            conversation_temperature = 0.5
            conversation_max_tokens = 600
            analysis_temperature = 0.1
            analysis_max_tokens = 1500

            [relevance]
            llm_check = true

            [logging]
            level = "debug"
            format = "json"
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.request_timeout_secs, 120);
        assert_eq!(config.storage.backend, StorageBackend::Mongodb);
        assert_eq!(config.storage.database, "test");
        assert_eq!(config.auth.guest_user_id, "guest");

        let chat = config.chat_config();
        assert_eq!(chat.model, "gpt-4o");
        assert_eq!(chat.llm_timeout, Duration::from_secs(30));
        assert!(chat.relevance_check);
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let config: Config = toml::from_str("[server]\nhost = \"localhost\"\nport = 9000\n").unwrap();
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert_eq!(config.llm.history_window, DEFAULT_HISTORY_WINDOW);
        assert_eq!(config.logging.format, "pretty");
    }
}
