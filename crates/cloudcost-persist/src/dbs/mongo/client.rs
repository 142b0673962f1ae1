use mongodb::{Client, Database, bson::doc};
use async_trait::async_trait;

use crate::trait_client::PersistenceClient;
use crate::models::{Analysis, NewAnalysis, NewMessage, StoredMessage, Thread, ThreadListing};
use crate::dbs::mongo::models::{MongoAnalysis, MongoMessage, MongoThread};
use crate::dbs::mongo::repositories::{
    MongoAnalysisRepository, MongoCounterRepository, MongoMessageRepository, MongoThreadRepository,
};
use crate::error::{PersistError, Result};

const THREAD_COUNTER: &str = "threads";
const MESSAGE_COUNTER: &str = "messages";

pub struct MongoPersistenceClient {
    database: Database,
    thread_repo: MongoThreadRepository,
    message_repo: MongoMessageRepository,
    analysis_repo: MongoAnalysisRepository,
    counters: MongoCounterRepository,
}

impl MongoPersistenceClient {
    /// Connect to MongoDB, create the client and make sure indexes exist
    pub async fn connect(mongodb_uri: &str, database: &str) -> Result<Self> {
        let client = Client::with_uri_str(mongodb_uri)
            .await
            .map_err(|e| PersistError::Connection(e.to_string()))?;

        let persist = Self {
            database: client.database(database),
            thread_repo: MongoThreadRepository::new(&client, database),
            message_repo: MongoMessageRepository::new(&client, database),
            analysis_repo: MongoAnalysisRepository::new(&client, database),
            counters: MongoCounterRepository::new(&client, database),
        };

        persist.thread_repo.ensure_indexes().await?;
        persist.message_repo.ensure_indexes().await?;
        persist.analysis_repo.ensure_indexes().await?;

        tracing::info!(database, "MongoDB persistence ready");
        Ok(persist)
    }

    async fn require_thread(&self, user_id: &str, thread_id: &str) -> Result<()> {
        match self.thread_repo.get_thread(user_id, thread_id).await? {
            Some(_) => Ok(()),
            None => Err(PersistError::ThreadNotFound(thread_id.to_string())),
        }
    }
}

#[async_trait]
impl PersistenceClient for MongoPersistenceClient {
    async fn create_thread(&self, user_id: &str) -> Result<Thread> {
        let seq = self.counters.next(THREAD_COUNTER).await?;
        let thread = Thread::new(user_id, seq.max(0) as u64);

        self.thread_repo.insert_thread(&MongoThread::from(thread.clone())).await?;

        tracing::debug!(thread_id = %thread.id, user_id, "Created thread");
        Ok(thread)
    }

    async fn get_thread(&self, user_id: &str, thread_id: &str) -> Result<Option<Thread>> {
        let thread = self.thread_repo.get_thread(user_id, thread_id).await?;
        Ok(thread.map(Into::into))
    }

    async fn get_latest_thread(&self, user_id: &str) -> Result<Option<Thread>> {
        let thread = self.thread_repo.get_latest_thread(user_id).await?;
        Ok(thread.map(Into::into))
    }

    async fn list_threads(&self, user_id: &str) -> Result<Vec<ThreadListing>> {
        let threads = self.thread_repo.list_threads(user_id).await?;

        let mut listings = Vec::with_capacity(threads.len());
        for thread in threads {
            let message_count = self.message_repo.count_messages(user_id, &thread.id).await?;
            listings.push(ThreadListing {
                thread: thread.into(),
                message_count,
            });
        }
        Ok(listings)
    }

    async fn save_message(&self, message: NewMessage) -> Result<StoredMessage> {
        self.require_thread(&message.user_id, &message.thread_id).await?;

        let seq = self.counters.next(MESSAGE_COUNTER).await?;
        let stored = message.into_stored(seq.max(0) as u64);
        self.message_repo.save_message(&MongoMessage::from(stored.clone())).await?;
        Ok(stored)
    }

    async fn get_thread_messages(
        &self,
        user_id: &str,
        thread_id: &str,
    ) -> Result<Vec<StoredMessage>> {
        self.require_thread(user_id, thread_id).await?;

        let messages = self.message_repo.get_messages(user_id, thread_id).await?;
        Ok(messages.into_iter().map(Into::into).collect())
    }

    async fn save_analysis(&self, analysis: NewAnalysis) -> Result<Analysis> {
        if let Some(thread_id) = analysis.thread_id.as_deref() {
            self.require_thread(&analysis.user_id, thread_id).await?;
        }

        let record = analysis.into_analysis();
        self.analysis_repo.save_analysis(&MongoAnalysis::from(record.clone())).await?;
        Ok(record)
    }

    async fn list_analyses(
        &self,
        user_id: &str,
        thread_id: Option<&str>,
    ) -> Result<Vec<Analysis>> {
        let analyses = self.analysis_repo.list_analyses(user_id, thread_id).await?;
        Ok(analyses.into_iter().map(Into::into).collect())
    }

    async fn ping(&self) -> Result<()> {
        self.database.run_command(doc! { "ping": 1 }).await?;
        Ok(())
    }
}
