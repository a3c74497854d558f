use chrono::{DateTime, Utc};
use dealflow_persist::Thread;

/// What to do with the user's most recent thread on a new interaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Continuity {
    /// The user has no threads yet
    Start,
    /// The most recent thread is still inside the session window
    Resume,
    /// The most recent thread went stale; begin a new one carrying its summary
    Rollover { previous_summary: Option<String> },
}

/// Decides whether a user's conversation continues or starts over.
pub trait ContinuityStrategy: Send + Sync {
    fn decide(&self, latest: Option<&Thread>, now: DateTime<Utc>) -> Continuity;
}
