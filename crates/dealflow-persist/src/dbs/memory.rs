use std::collections::HashMap;
use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::trait_client::{ThreadStore, UserDirectory};
use crate::models::{NewThread, Thread, ThreadPatch, User};
use crate::error::{Result, PersistError};

struct MemoryEntry {
    thread: Thread,
    seq: u64,
}

#[derive(Default)]
struct Inner {
    threads: HashMap<String, MemoryEntry>,
    users: HashMap<String, User>,
    next_seq: u64,
}

/// In-memory storage for testing and local development.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a user so `find_by_subject` can resolve it.
    pub async fn insert_user(&self, user: User) {
        let mut inner = self.inner.write().await;
        inner.users.insert(user.subject.clone(), user);
    }

    /// Number of stored threads across all users.
    pub async fn thread_count(&self) -> usize {
        self.inner.read().await.threads.len()
    }

    fn sorted_for_user<'a>(inner: &'a Inner, user_id: &str) -> Vec<&'a MemoryEntry> {
        let mut entries: Vec<&MemoryEntry> = inner
            .threads
            .values()
            .filter(|e| e.thread.user_id == user_id)
            .collect();
        entries.sort_by(|a, b| {
            b.thread
                .last_activity_at
                .cmp(&a.thread.last_activity_at)
                .then(b.seq.cmp(&a.seq))
        });
        entries
    }
}

#[async_trait]
impl ThreadStore for MemoryStore {
    async fn create_thread(&self, thread: NewThread) -> Result<Thread> {
        let mut inner = self.inner.write().await;
        let seq = inner.next_seq;
        inner.next_seq += 1;

        let thread = thread.into_thread(uuid::Uuid::new_v4().simple().to_string());
        inner.threads.insert(
            thread.id.clone(),
            MemoryEntry {
                thread: thread.clone(),
                seq,
            },
        );
        Ok(thread)
    }

    async fn get_thread(&self, thread_id: &str) -> Result<Option<Thread>> {
        let inner = self.inner.read().await;
        Ok(inner.threads.get(thread_id).map(|e| e.thread.clone()))
    }

    async fn latest_thread(&self, user_id: &str) -> Result<Option<Thread>> {
        let inner = self.inner.read().await;
        Ok(Self::sorted_for_user(&inner, user_id)
            .first()
            .map(|e| e.thread.clone()))
    }

    async fn list_threads(&self, user_id: &str, limit: Option<i64>) -> Result<Vec<Thread>> {
        let inner = self.inner.read().await;
        let limit = limit
            .and_then(|l| usize::try_from(l).ok())
            .unwrap_or(usize::MAX);
        Ok(Self::sorted_for_user(&inner, user_id)
            .into_iter()
            .take(limit)
            .map(|e| e.thread.clone())
            .collect())
    }

    async fn patch_thread(&self, thread_id: &str, patch: ThreadPatch) -> Result<()> {
        let mut inner = self.inner.write().await;
        let entry = inner
            .threads
            .get_mut(thread_id)
            .ok_or_else(|| PersistError::ThreadNotFound(thread_id.to_string()))?;
        patch.apply_to(&mut entry.thread);
        Ok(())
    }

    async fn delete_user_threads(&self, user_id: &str) -> Result<u64> {
        let mut inner = self.inner.write().await;
        let before = inner.threads.len();
        inner.threads.retain(|_, e| e.thread.user_id != user_id);
        Ok((before - inner.threads.len()) as u64)
    }
}

#[async_trait]
impl UserDirectory for MemoryStore {
    async fn find_by_subject(&self, subject: &str) -> Result<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner.users.get(subject).cloned())
    }
}
