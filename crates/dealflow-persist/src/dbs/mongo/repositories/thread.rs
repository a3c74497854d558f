use mongodb::{Client, Collection, IndexModel, bson::doc, bson::oid::ObjectId, bson::Document};
use futures::TryStreamExt;

use crate::dbs::mongo::models::MongoThread;
use crate::models::{NewThread, ThreadPatch};
use crate::error::{Result, PersistError};

pub const DEFAULT_THREADS_COLLECTION: &str = "assistant_threads";

/// Newest activity first; equal timestamps resolve to the later insert.
fn recency_sort() -> Document {
    doc! { "last_activity_at": -1, "_id": -1 }
}

#[derive(Clone)]
pub struct MongoThreadRepository {
    collection: Collection<MongoThread>,
}

impl MongoThreadRepository {
    pub fn with_collection(client: &Client, db_name: &str, collection: &str) -> Self {
        let collection = client.database(db_name).collection(collection);
        Self { collection }
    }

    /// Create the per-user recency index backing `latest_thread`
    pub async fn ensure_indexes(&self) -> Result<()> {
        let index = IndexModel::builder()
            .keys(doc! { "user_id": 1, "last_activity_at": -1 })
            .build();
        self.collection.create_index(index).await?;
        Ok(())
    }

    /// Create a new thread
    pub async fn create_thread(&self, thread: NewThread) -> Result<MongoThread> {
        let thread = MongoThread::from(thread);
        self.collection.insert_one(&thread).await?;
        Ok(thread)
    }

    /// Get thread by ID
    pub async fn get_thread(&self, thread_id: ObjectId) -> Result<Option<MongoThread>> {
        let filter = doc! { "_id": thread_id };
        Ok(self.collection.find_one(filter).await?)
    }

    /// Most recent thread for a user, served from the recency index
    pub async fn latest_thread(&self, user_id: &str) -> Result<Option<MongoThread>> {
        let filter = doc! { "user_id": user_id };
        Ok(self.collection.find_one(filter).sort(recency_sort()).await?)
    }

    /// List threads for a user
    pub async fn list_threads(
        &self,
        user_id: &str,
        limit: Option<i64>,
    ) -> Result<Vec<MongoThread>> {
        let filter = doc! { "user_id": user_id };
        let mut find_opts = self.collection
            .find(filter)
            .sort(recency_sort());

        if let Some(limit) = limit {
            find_opts = find_opts.limit(limit);
        }

        let threads = find_opts
            .await?
            .try_collect()
            .await?;
        Ok(threads)
    }

    /// Apply a partial update; an unmatched id is an error
    pub async fn patch_thread(&self, thread_id: ObjectId, patch: ThreadPatch) -> Result<()> {
        let filter = doc! { "_id": thread_id };
        let update = doc! { "$set": set_document(&patch)? };

        let result = self.collection.update_one(filter, update).await?;
        if result.matched_count == 0 {
            return Err(PersistError::ThreadNotFound(thread_id.to_hex()));
        }
        Ok(())
    }

    /// Delete all threads of a user
    pub async fn delete_user_threads(&self, user_id: &str) -> Result<u64> {
        let filter = doc! { "user_id": user_id };
        let result = self.collection.delete_many(filter).await?;
        Ok(result.deleted_count)
    }
}

fn set_document(patch: &ThreadPatch) -> Result<Document> {
    let mut set = doc! { "updated_at": bson::DateTime::from_chrono(patch.updated_at) };

    if let Some(at) = patch.last_activity_at {
        set.insert("last_activity_at", bson::DateTime::from_chrono(at));
    }
    if let Some(agent_thread_id) = &patch.agent_thread_id {
        set.insert("agent_thread_id", agent_thread_id.as_str());
    }
    if let Some(summary) = &patch.summary {
        set.insert("summary", summary.as_str());
    }
    if let Some(count) = patch.summarized_message_count {
        let count = i64::try_from(count)
            .map_err(|_| PersistError::Internal(format!("summarized message count out of range: {}", count)))?;
        set.insert("summarized_message_count", count);
    }
    if let Some(role) = &patch.last_role {
        set.insert("last_role", role.as_str());
    }

    Ok(set)
}
