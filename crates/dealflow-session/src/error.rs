use thiserror::Error;
use dealflow_persist::PersistError;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Not authenticated")]
    Unauthenticated,

    #[error("No user for identity: {0}")]
    UnknownUser(String),

    #[error("Persistence error: {0}")]
    Persist(#[from] PersistError),
}

pub type Result<T> = std::result::Result<T, SessionError>;
