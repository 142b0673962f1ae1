pub mod analysis;
pub mod counter;
pub mod message;
pub mod thread;

pub use analysis::MongoAnalysisRepository;
pub use counter::MongoCounterRepository;
pub use message::MongoMessageRepository;
pub use thread::MongoThreadRepository;
