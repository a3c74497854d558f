use async_trait::async_trait;
use crate::models::{NewThread, Thread, ThreadPatch, User};
use crate::error::Result;

/// Storage for assistant threads.
///
/// "Most recent" everywhere means greatest `last_activity_at`, ties broken
/// in favour of the later-inserted record.
#[async_trait]
pub trait ThreadStore: Send + Sync {
    /// Insert a new thread and return the stored record
    async fn create_thread(&self, thread: NewThread) -> Result<Thread>;

    /// Get a thread by ID
    async fn get_thread(&self, thread_id: &str) -> Result<Option<Thread>>;

    /// Get the user's most recent thread without scanning their history
    async fn latest_thread(&self, user_id: &str) -> Result<Option<Thread>>;

    /// List threads for a user, most recent first
    async fn list_threads(&self, user_id: &str, limit: Option<i64>) -> Result<Vec<Thread>>;

    /// Apply a patch to one thread.
    ///
    /// Fails with `ThreadNotFound` when no record has this id.
    async fn patch_thread(&self, thread_id: &str, patch: ThreadPatch) -> Result<()>;

    /// Delete every thread owned by the user, returning how many were removed
    async fn delete_user_threads(&self, user_id: &str) -> Result<u64>;
}

/// Lookup of platform users by identity-provider subject.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_by_subject(&self, subject: &str) -> Result<Option<User>>;
}
