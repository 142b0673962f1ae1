use mongodb::{Client, Collection, IndexModel, bson::doc};
use futures::TryStreamExt;

use crate::dbs::mongo::models::MongoMessage;
use crate::error::Result;

#[derive(Clone)]
pub struct MongoMessageRepository {
    collection: Collection<MongoMessage>,
}

impl MongoMessageRepository {
    pub fn new(client: &Client, db_name: &str) -> Self {
        let collection = client.database(db_name).collection("messages");
        Self { collection }
    }

    pub async fn ensure_indexes(&self) -> Result<()> {
        let index = IndexModel::builder()
            .keys(doc! { "user_id": 1, "thread_id": 1, "created_at": 1, "seq": 1 })
            .build();
        self.collection.create_index(index).await?;
        Ok(())
    }

    /// Save a single message
    pub async fn save_message(&self, message: &MongoMessage) -> Result<()> {
        self.collection.insert_one(message).await?;
        Ok(())
    }

    /// Get all messages for a thread in insertion order
    pub async fn get_messages(&self, user_id: &str, thread_id: &str) -> Result<Vec<MongoMessage>> {
        let filter = doc! { "user_id": user_id, "thread_id": thread_id };
        let messages = self.collection
            .find(filter)
            .sort(doc! { "created_at": 1, "seq": 1 })
            .await?
            .try_collect()
            .await?;
        Ok(messages)
    }

    /// Count messages in a thread
    pub async fn count_messages(&self, user_id: &str, thread_id: &str) -> Result<u64> {
        let filter = doc! { "user_id": user_id, "thread_id": thread_id };
        Ok(self.collection.count_documents(filter).await?)
    }
}
