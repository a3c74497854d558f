use mongodb::bson::oid::ObjectId;
use async_trait::async_trait;

use crate::trait_client::{ThreadStore, UserDirectory};
use crate::models::{NewThread, Thread, ThreadPatch, User};
use crate::dbs::mongo::repositories::{MongoThreadRepository, MongoUserRepository};
use crate::error::{Result, PersistError};

pub struct MongoPersistenceClient {
    thread_repo: MongoThreadRepository,
    user_repo: MongoUserRepository,
}

impl MongoPersistenceClient {
    pub fn from_repositories(thread_repo: MongoThreadRepository, user_repo: MongoUserRepository) -> Self {
        Self { thread_repo, user_repo }
    }

    pub async fn ensure_indexes(&self) -> Result<()> {
        self.thread_repo.ensure_indexes().await?;
        self.user_repo.ensure_indexes().await?;
        tracing::info!("MongoDB indexes ensured");
        Ok(())
    }
}

fn parse_thread_id(thread_id: &str) -> Result<ObjectId> {
    ObjectId::parse_str(thread_id)
        .map_err(|e| PersistError::InvalidObjectId(e.to_string()))
}

#[async_trait]
impl ThreadStore for MongoPersistenceClient {
    async fn create_thread(&self, thread: NewThread) -> Result<Thread> {
        let mongo_thread = self.thread_repo.create_thread(thread).await?;
        Ok(mongo_thread.into())
    }

    async fn get_thread(&self, thread_id: &str) -> Result<Option<Thread>> {
        let object_id = parse_thread_id(thread_id)?;
        let mongo_thread = self.thread_repo.get_thread(object_id).await?;
        Ok(mongo_thread.map(|t| t.into()))
    }

    async fn latest_thread(&self, user_id: &str) -> Result<Option<Thread>> {
        let mongo_thread = self.thread_repo.latest_thread(user_id).await?;
        Ok(mongo_thread.map(|t| t.into()))
    }

    async fn list_threads(&self, user_id: &str, limit: Option<i64>) -> Result<Vec<Thread>> {
        let mongo_threads = self.thread_repo.list_threads(user_id, limit).await?;
        let threads = mongo_threads.into_iter().map(|t| t.into()).collect();
        Ok(threads)
    }

    async fn patch_thread(&self, thread_id: &str, patch: ThreadPatch) -> Result<()> {
        let object_id = parse_thread_id(thread_id)?;
        self.thread_repo.patch_thread(object_id, patch).await
    }

    async fn delete_user_threads(&self, user_id: &str) -> Result<u64> {
        self.thread_repo.delete_user_threads(user_id).await
    }
}

#[async_trait]
impl UserDirectory for MongoPersistenceClient {
    async fn find_by_subject(&self, subject: &str) -> Result<Option<User>> {
        let mongo_user = self.user_repo.find_by_subject(subject).await?;
        Ok(mongo_user.map(|u| u.into()))
    }
}
