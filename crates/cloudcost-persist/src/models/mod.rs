mod analysis;
mod message;
mod thread;

pub use analysis::{Analysis, NewAnalysis};
pub use message::{MessageRole, NewMessage, StoredMessage};
pub use thread::{Thread, ThreadListing, DEFAULT_THREAD_TITLE};
