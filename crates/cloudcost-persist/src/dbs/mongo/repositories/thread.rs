use mongodb::{Client, Collection, IndexModel, bson::doc};
use futures::TryStreamExt;

use crate::dbs::mongo::models::MongoThread;
use crate::error::Result;

#[derive(Clone)]
pub struct MongoThreadRepository {
    collection: Collection<MongoThread>,
}

impl MongoThreadRepository {
    pub fn new(client: &Client, db_name: &str) -> Self {
        let collection = client.database(db_name).collection("threads");
        Self { collection }
    }

    pub async fn ensure_indexes(&self) -> Result<()> {
        let index = IndexModel::builder()
            .keys(doc! { "user_id": 1, "created_at": -1, "seq": -1 })
            .build();
        self.collection.create_index(index).await?;
        Ok(())
    }

    pub async fn insert_thread(&self, thread: &MongoThread) -> Result<()> {
        self.collection.insert_one(thread).await?;
        Ok(())
    }

    /// Get thread by ID, scoped to its owner
    pub async fn get_thread(&self, user_id: &str, thread_id: &str) -> Result<Option<MongoThread>> {
        let filter = doc! { "_id": thread_id, "user_id": user_id };
        Ok(self.collection.find_one(filter).await?)
    }

    pub async fn get_latest_thread(&self, user_id: &str) -> Result<Option<MongoThread>> {
        let filter = doc! { "user_id": user_id };
        Ok(self.collection
            .find_one(filter)
            .sort(doc! { "created_at": -1, "seq": -1 })
            .await?)
    }

    /// List threads for a user, newest first
    pub async fn list_threads(&self, user_id: &str) -> Result<Vec<MongoThread>> {
        let filter = doc! { "user_id": user_id };
        let threads = self.collection
            .find(filter)
            .sort(doc! { "created_at": -1, "seq": -1 })
            .await?
            .try_collect()
            .await?;
        Ok(threads)
    }
}
