pub mod models;
pub mod trait_client;
pub mod dbs;
pub mod uploads;
pub mod error;

pub use models::{
    Analysis, MessageRole, NewAnalysis, NewMessage, StoredMessage, Thread, ThreadListing,
    DEFAULT_THREAD_TITLE,
};
pub use trait_client::{PersistenceClient, NO_MESSAGES_SENTINEL};
pub use dbs::memory::InMemoryPersistenceClient;
#[cfg(feature = "mongodb")]
pub use dbs::mongo::MongoPersistenceClient;
pub use uploads::{FileType, NewUpload, UploadStore, UploadedFile};
pub use error::{PersistError, Result};
