use std::sync::Arc;
use chrono::{DateTime, Utc};

use dealflow_persist::{Result, ThreadPatch, ThreadStore};

/// Trusted thread mutations for server-side orchestration.
///
/// These patch a thread by id without any caller check. Hand this handle to
/// the chat pipeline and summarizer only, never to request handlers.
#[derive(Clone)]
pub struct ThreadMaintenance {
    threads: Arc<dyn ThreadStore>,
}

impl ThreadMaintenance {
    pub fn new(threads: Arc<dyn ThreadStore>) -> Self {
        Self { threads }
    }

    /// Record the external agent's thread id once it has been created.
    pub async fn bind_agent_thread(
        &self,
        thread_id: &str,
        agent_thread_id: &str,
        now: DateTime<Utc>,
    ) -> Result<()> {
        self.threads
            .patch_thread(thread_id, ThreadPatch::at(now).agent_thread_id(agent_thread_id))
            .await?;
        tracing::debug!(thread_id, agent_thread_id, "Bound agent thread");
        Ok(())
    }

    /// Replace the rolling summary. Callers keep the count non-decreasing.
    pub async fn update_summary(
        &self,
        thread_id: &str,
        summary: &str,
        summarized_message_count: u64,
        now: DateTime<Utc>,
    ) -> Result<()> {
        self.threads
            .patch_thread(thread_id, ThreadPatch::at(now).summary(summary, summarized_message_count))
            .await?;
        tracing::debug!(thread_id, summarized_message_count, "Updated thread summary");
        Ok(())
    }

    pub async fn record_role_used(&self, thread_id: &str, role: &str, now: DateTime<Utc>) -> Result<()> {
        self.threads
            .patch_thread(thread_id, ThreadPatch::at(now).last_role(role))
            .await?;
        tracing::debug!(thread_id, role, "Recorded role");
        Ok(())
    }
}
