use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

/// Database-agnostic assistant thread.
///
/// One record per (user, session). The record with the greatest
/// `last_activity_at` is the user's most recent thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thread {
    pub id: String,
    pub user_id: String,
    pub session_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_thread_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summarized_message_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_role: Option<String>,
    pub last_activity_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A thread that has not been stored yet; the backend assigns the record id.
#[derive(Debug, Clone)]
pub struct NewThread {
    pub user_id: String,
    pub session_id: String,
    pub summary: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl NewThread {
    /// Start a fresh session for `user_id` with a newly generated session token.
    pub fn new(user_id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.into(),
            session_id: uuid::Uuid::new_v4().to_string(),
            summary: None,
            created_at: now,
        }
    }

    /// Carry a summary over from the preceding session.
    pub fn with_summary(mut self, summary: Option<String>) -> Self {
        self.summary = summary;
        self
    }

    /// Materialize the stored record under the id chosen by the backend.
    pub fn into_thread(self, id: String) -> Thread {
        Thread {
            id,
            user_id: self.user_id,
            session_id: self.session_id,
            agent_thread_id: None,
            summary: self.summary,
            summarized_message_count: None,
            last_role: None,
            last_activity_at: self.created_at,
            created_at: self.created_at,
            updated_at: self.created_at,
        }
    }
}

/// Partial update of a thread record.
///
/// `updated_at` is always written; every other field is written only when set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadPatch {
    pub updated_at: DateTime<Utc>,
    pub last_activity_at: Option<DateTime<Utc>>,
    pub agent_thread_id: Option<String>,
    pub summary: Option<String>,
    pub summarized_message_count: Option<u64>,
    pub last_role: Option<String>,
}

impl ThreadPatch {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            updated_at: now,
            last_activity_at: None,
            agent_thread_id: None,
            summary: None,
            summarized_message_count: None,
            last_role: None,
        }
    }

    /// Mark activity at `now`.
    pub fn touch(now: DateTime<Utc>) -> Self {
        Self {
            last_activity_at: Some(now),
            ..Self::at(now)
        }
    }

    pub fn agent_thread_id(mut self, agent_thread_id: impl Into<String>) -> Self {
        self.agent_thread_id = Some(agent_thread_id.into());
        self
    }

    pub fn summary(mut self, summary: impl Into<String>, summarized_message_count: u64) -> Self {
        self.summary = Some(summary.into());
        self.summarized_message_count = Some(summarized_message_count);
        self
    }

    pub fn last_role(mut self, role: impl Into<String>) -> Self {
        self.last_role = Some(role.into());
        self
    }

    pub fn apply_to(&self, thread: &mut Thread) {
        thread.updated_at = self.updated_at;
        if let Some(at) = self.last_activity_at {
            thread.last_activity_at = at;
        }
        if let Some(agent_thread_id) = &self.agent_thread_id {
            thread.agent_thread_id = Some(agent_thread_id.clone());
        }
        if let Some(summary) = &self.summary {
            thread.summary = Some(summary.clone());
        }
        if let Some(count) = self.summarized_message_count {
            thread.summarized_message_count = Some(count);
        }
        if let Some(role) = &self.last_role {
            thread.last_role = Some(role.clone());
        }
    }
}
