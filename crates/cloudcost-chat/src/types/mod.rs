pub mod config;
pub mod output;
pub mod session;

pub use config::ChatConfig;
pub use output::{ChatReply, TurnOutcome};
pub use session::ChatSession;
