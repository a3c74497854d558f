use chrono::{DateTime, Duration, Utc};
use dealflow_persist::Thread;

use crate::strategy::{Continuity, ContinuityStrategy};

/// Inactivity after which a session is considered over: 24 hours.
pub const DEFAULT_SESSION_WINDOW_MS: i64 = 86_400_000;

/// Time-window continuity: reuse while the last activity is strictly younger
/// than the window, otherwise roll over.
#[derive(Debug, Clone)]
pub struct WindowedContinuity {
    window: Duration,
}

impl WindowedContinuity {
    pub fn new(window: Duration) -> Self {
        Self { window }
    }

    pub fn from_hours(hours: i64) -> Self {
        Self::new(Duration::hours(hours))
    }

    pub fn window(&self) -> Duration {
        self.window
    }
}

impl Default for WindowedContinuity {
    fn default() -> Self {
        Self::new(Duration::milliseconds(DEFAULT_SESSION_WINDOW_MS))
    }
}

impl ContinuityStrategy for WindowedContinuity {
    fn decide(&self, latest: Option<&Thread>, now: DateTime<Utc>) -> Continuity {
        match latest {
            None => Continuity::Start,
            Some(thread) if now.signed_duration_since(thread.last_activity_at) < self.window => {
                Continuity::Resume
            }
            Some(thread) => Continuity::Rollover {
                previous_summary: thread.summary.clone(),
            },
        }
    }
}
