pub mod models;
pub mod dbs;
pub mod error;
pub mod trait_client;
#[cfg(feature = "mongodb")]
pub mod builder;

pub use models::{CallerIdentity, NewThread, Thread, ThreadPatch, User, UserRole};
pub use trait_client::{ThreadStore, UserDirectory};
pub use dbs::MemoryStore;
pub use error::{PersistError, Result};

#[cfg(feature = "mongodb")]
pub use dbs::mongo::MongoPersistenceClient;
#[cfg(feature = "mongodb")]
pub use builder::MongoStoreBuilder;
