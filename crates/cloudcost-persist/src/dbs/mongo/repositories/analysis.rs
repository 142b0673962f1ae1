use mongodb::{Client, Collection, IndexModel, bson::doc};
use futures::TryStreamExt;

use crate::dbs::mongo::models::MongoAnalysis;
use crate::error::Result;

#[derive(Clone)]
pub struct MongoAnalysisRepository {
    collection: Collection<MongoAnalysis>,
}

impl MongoAnalysisRepository {
    pub fn new(client: &Client, db_name: &str) -> Self {
        let collection = client.database(db_name).collection("analyses");
        Self { collection }
    }

    pub async fn ensure_indexes(&self) -> Result<()> {
        let index = IndexModel::builder()
            .keys(doc! { "user_id": 1, "thread_id": 1, "created_at": -1 })
            .build();
        self.collection.create_index(index).await?;
        Ok(())
    }

    pub async fn save_analysis(&self, analysis: &MongoAnalysis) -> Result<()> {
        self.collection.insert_one(analysis).await?;
        Ok(())
    }

    pub async fn list_analyses(
        &self,
        user_id: &str,
        thread_id: Option<&str>,
    ) -> Result<Vec<MongoAnalysis>> {
        let mut filter = doc! { "user_id": user_id };
        if let Some(thread_id) = thread_id {
            filter.insert("thread_id", thread_id);
        }
        let analyses = self.collection
            .find(filter)
            .sort(doc! { "created_at": 1 })
            .await?
            .try_collect()
            .await?;
        Ok(analyses)
    }
}
