use mongodb::{Client, Collection, bson::{doc, Document}, options::ReturnDocument};

use crate::error::{PersistError, Result};

/// Monotonic sequence numbers backed by a `counters` collection
#[derive(Clone)]
pub struct MongoCounterRepository {
    collection: Collection<Document>,
}

impl MongoCounterRepository {
    pub fn new(client: &Client, db_name: &str) -> Self {
        let collection = client.database(db_name).collection("counters");
        Self { collection }
    }

    /// Atomically increment and return the counter named `name`
    pub async fn next(&self, name: &str) -> Result<i64> {
        let updated = self.collection
            .find_one_and_update(doc! { "_id": name }, doc! { "$inc": { "value": 1_i64 } })
            .upsert(true)
            .return_document(ReturnDocument::After)
            .await?
            .ok_or_else(|| PersistError::Internal(format!("counter {} was not returned", name)))?;

        updated
            .get_i64("value")
            .map_err(|e| PersistError::Internal(format!("counter {} is malformed: {}", name, e)))
    }
}
