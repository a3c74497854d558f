//! Assistant session lifecycle.
//!
//! A user's assistant conversation is a sequence of thread records. Each
//! interaction either resumes the most recent thread or, once it has been idle
//! for a full session window, starts a new one that inherits the old summary.

pub mod strategy;
pub mod default;
pub mod error;
pub mod service;
pub mod maintenance;

pub use strategy::{Continuity, ContinuityStrategy};
pub use default::{WindowedContinuity, DEFAULT_SESSION_WINDOW_MS};
pub use error::SessionError;
pub use service::{ClearedMemory, ResolvedThread, SessionService, MAX_LISTED_THREADS};
pub use maintenance::ThreadMaintenance;
