use mongodb::Client;

use crate::dbs::mongo::MongoPersistenceClient;
use crate::dbs::mongo::repositories::{
    MongoThreadRepository, MongoUserRepository,
    thread::DEFAULT_THREADS_COLLECTION, user::DEFAULT_USERS_COLLECTION,
};
use crate::error::{Result, PersistError};

pub struct MongoStoreBuilder {
    mongodb_uri: Option<String>,
    database: Option<String>,
    threads_collection: String,
    users_collection: String,
    ensure_indexes: bool,
}

impl MongoStoreBuilder {
    pub fn new() -> Self {
        Self {
            mongodb_uri: None,
            database: None,
            threads_collection: DEFAULT_THREADS_COLLECTION.to_string(),
            users_collection: DEFAULT_USERS_COLLECTION.to_string(),
            ensure_indexes: true,
        }
    }

    pub fn mongodb_uri(mut self, uri: impl Into<String>) -> Self {
        self.mongodb_uri = Some(uri.into());
        self
    }

    pub fn database(mut self, db: impl Into<String>) -> Self {
        self.database = Some(db.into());
        self
    }

    pub fn threads_collection(mut self, name: impl Into<String>) -> Self {
        self.threads_collection = name.into();
        self
    }

    pub fn users_collection(mut self, name: impl Into<String>) -> Self {
        self.users_collection = name.into();
        self
    }

    pub fn ensure_indexes(mut self, ensure: bool) -> Self {
        self.ensure_indexes = ensure;
        self
    }

    pub async fn build(self) -> Result<MongoPersistenceClient> {
        let mongodb_uri = self.mongodb_uri
            .ok_or_else(|| PersistError::Internal("mongodb_uri is required".to_string()))?;
        let database = self.database
            .ok_or_else(|| PersistError::Internal("database is required".to_string()))?;

        let client = Client::with_uri_str(&mongodb_uri)
            .await
            .map_err(|e| PersistError::Connection(e.to_string()))?;

        let store = MongoPersistenceClient::from_repositories(
            MongoThreadRepository::with_collection(&client, &database, &self.threads_collection),
            MongoUserRepository::with_collection(&client, &database, &self.users_collection),
        );

        if self.ensure_indexes {
            store.ensure_indexes().await?;
        }

        Ok(store)
    }
}

impl Default for MongoStoreBuilder {
    fn default() -> Self {
        Self::new()
    }
}
