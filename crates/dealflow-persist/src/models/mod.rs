mod db_thread;
mod user;

// Export database-agnostic models
pub use db_thread::{NewThread, Thread, ThreadPatch};
pub use user::{CallerIdentity, User, UserRole};
