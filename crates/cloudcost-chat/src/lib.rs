pub mod builder;
pub mod error;
pub mod lifecycle;
pub mod pipeline;
pub mod relay;
pub mod types;

pub use builder::ChatPipelineBuilder;
pub use error::{ChatError, Result};
pub use lifecycle::ThreadLifecycle;
pub use pipeline::ChatPipeline;
pub use relay::{extract_json_block, ResponseRelay};
pub use types::{ChatConfig, ChatReply, ChatSession, TurnOutcome};

// Re-export the request types callers need to drive a turn
pub use cloudcost_context::{ChatInput, RequestMode};
