use std::sync::Arc;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use dealflow_persist::{
    CallerIdentity, NewThread, PersistError, Thread, ThreadPatch, ThreadStore, User, UserDirectory,
};
use crate::default::WindowedContinuity;
use crate::error::{Result, SessionError};
use crate::strategy::{Continuity, ContinuityStrategy};

/// Upper bound on how many threads a history listing returns.
pub const MAX_LISTED_THREADS: i64 = 100;

/// User id that never owns threads; health checks read it.
const HEALTH_CHECK_USER_ID: &str = "_health_check";

/// Thread handle for the current interaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedThread {
    pub thread_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_thread_id: Option<String>,
    /// True when the caller must create a fresh agent thread this turn
    pub is_new: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_summary: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClearedMemory {
    pub cleared: bool,
    pub deleted: u64,
}

/// Caller-facing session operations.
///
/// Every method authenticates through the caller identity; thread patches
/// that skip that check live on [`crate::ThreadMaintenance`].
#[derive(Clone)]
pub struct SessionService {
    threads: Arc<dyn ThreadStore>,
    users: Arc<dyn UserDirectory>,
    strategy: Arc<dyn ContinuityStrategy>,
}

impl SessionService {
    pub fn new(threads: Arc<dyn ThreadStore>, users: Arc<dyn UserDirectory>) -> Self {
        Self {
            threads,
            users,
            strategy: Arc::new(WindowedContinuity::default()),
        }
    }

    pub fn with_strategy(mut self, strategy: Arc<dyn ContinuityStrategy>) -> Self {
        self.strategy = strategy;
        self
    }

    async fn require_user(&self, caller: Option<&CallerIdentity>) -> Result<User> {
        let caller = caller.ok_or(SessionError::Unauthenticated)?;
        self.users
            .find_by_subject(&caller.subject)
            .await?
            .ok_or_else(|| SessionError::UnknownUser(caller.subject.clone()))
    }

    /// Resolve the user without failing; read paths treat any problem as "no user".
    async fn lookup_user(&self, caller: Option<&CallerIdentity>) -> Option<User> {
        let caller = caller?;
        match self.users.find_by_subject(&caller.subject).await {
            Ok(user) => user,
            Err(e) => {
                tracing::warn!("User lookup failed: {}", e);
                None
            }
        }
    }

    /// Return the thread to use for this interaction, reusing the most recent
    /// one while it is fresh and starting a new one otherwise.
    pub async fn resolve_active_thread(
        &self,
        caller: Option<&CallerIdentity>,
        now: DateTime<Utc>,
    ) -> Result<ResolvedThread> {
        let user = self.require_user(caller).await?;
        let latest = self.threads.latest_thread(&user.id).await?;

        match (self.strategy.decide(latest.as_ref(), now), latest) {
            (Continuity::Resume, Some(thread)) => {
                match self.threads.patch_thread(&thread.id, ThreadPatch::touch(now)).await {
                    Ok(()) => {}
                    // Erased between the lookup and the touch
                    Err(PersistError::ThreadNotFound(_)) => {
                        tracing::debug!(user_id = %user.id, thread_id = %thread.id, "Thread vanished before resume");
                        return self.start_thread(&user, now).await;
                    }
                    Err(e) => return Err(e.into()),
                }
                tracing::debug!(user_id = %user.id, thread_id = %thread.id, "Resumed assistant thread");

                Ok(ResolvedThread {
                    thread_id: thread.id,
                    agent_thread_id: thread.agent_thread_id,
                    is_new: false,
                    previous_summary: None,
                })
            }
            (Continuity::Rollover { previous_summary }, _) => {
                let thread = self
                    .threads
                    .create_thread(NewThread::new(&user.id, now).with_summary(previous_summary.clone()))
                    .await?;
                tracing::info!(
                    user_id = %user.id,
                    thread_id = %thread.id,
                    carried_summary = previous_summary.is_some(),
                    "Session window expired, started new assistant thread"
                );

                Ok(ResolvedThread {
                    thread_id: thread.id,
                    agent_thread_id: None,
                    is_new: true,
                    previous_summary,
                })
            }
            // A strategy may only resume an existing thread; anything else starts over
            (Continuity::Start, _) | (Continuity::Resume, None) => self.start_thread(&user, now).await,
        }
    }

    async fn start_thread(&self, user: &User, now: DateTime<Utc>) -> Result<ResolvedThread> {
        let thread = self.threads.create_thread(NewThread::new(&user.id, now)).await?;
        tracing::info!(user_id = %user.id, thread_id = %thread.id, "Started new assistant thread");

        Ok(ResolvedThread {
            thread_id: thread.id,
            agent_thread_id: None,
            is_new: true,
            previous_summary: None,
        })
    }

    /// The user's most recent thread, for display. Never fails.
    pub async fn current_thread(&self, caller: Option<&CallerIdentity>) -> Option<Thread> {
        let user = self.lookup_user(caller).await?;
        match self.threads.latest_thread(&user.id).await {
            Ok(thread) => thread,
            Err(e) => {
                tracing::warn!(user_id = %user.id, "Current thread lookup failed: {}", e);
                None
            }
        }
    }

    /// The user's threads, most recent first. Never fails.
    pub async fn list_threads(&self, caller: Option<&CallerIdentity>, limit: Option<i64>) -> Vec<Thread> {
        let Some(user) = self.lookup_user(caller).await else {
            return Vec::new();
        };
        let limit = limit.unwrap_or(MAX_LISTED_THREADS).clamp(1, MAX_LISTED_THREADS);

        match self.threads.list_threads(&user.id, Some(limit)).await {
            Ok(threads) => threads,
            Err(e) => {
                tracing::warn!(user_id = %user.id, "Thread listing failed: {}", e);
                Vec::new()
            }
        }
    }

    /// Delete every thread the user owns. Irreversible.
    pub async fn clear_memory(&self, caller: Option<&CallerIdentity>) -> Result<ClearedMemory> {
        let user = self.require_user(caller).await?;
        let deleted = self.threads.delete_user_threads(&user.id).await?;
        tracing::info!(user_id = %user.id, deleted, "Cleared assistant memory");

        Ok(ClearedMemory { cleared: true, deleted })
    }

    /// Check that the thread store answers a read.
    pub async fn ping(&self) -> Result<()> {
        self.threads.latest_thread(HEALTH_CHECK_USER_ID).await?;
        Ok(())
    }
}
