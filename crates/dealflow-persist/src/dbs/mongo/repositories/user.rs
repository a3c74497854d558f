use mongodb::{Client, Collection, IndexModel, bson::doc, options::IndexOptions};

use crate::dbs::mongo::models::MongoUser;
use crate::error::Result;

pub const DEFAULT_USERS_COLLECTION: &str = "users";

/// Read-only view over the platform's user collection.
#[derive(Clone)]
pub struct MongoUserRepository {
    collection: Collection<MongoUser>,
}

impl MongoUserRepository {
    pub fn with_collection(client: &Client, db_name: &str, collection: &str) -> Self {
        let collection = client.database(db_name).collection(collection);
        Self { collection }
    }

    pub async fn ensure_indexes(&self) -> Result<()> {
        let index = IndexModel::builder()
            .keys(doc! { "subject": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        self.collection.create_index(index).await?;
        Ok(())
    }

    pub async fn find_by_subject(&self, subject: &str) -> Result<Option<MongoUser>> {
        let filter = doc! { "subject": subject };
        Ok(self.collection.find_one(filter).await?)
    }
}
