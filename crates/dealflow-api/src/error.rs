use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use dealflow_persist::PersistError;
use dealflow_session::SessionError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Authentication required")]
    Unauthenticated,

    #[error("Unknown user: {0}")]
    UnknownUser(String),

    #[error("Thread not found: {0}")]
    ThreadNotFound(String),

    #[error("Persistence error: {0}")]
    Persist(PersistError),
}

impl From<PersistError> for ApiError {
    fn from(err: PersistError) -> Self {
        match err {
            PersistError::ThreadNotFound(id) => ApiError::ThreadNotFound(id),
            other => ApiError::Persist(other),
        }
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Unauthenticated => ApiError::Unauthenticated,
            SessionError::UnknownUser(subject) => ApiError::UnknownUser(subject),
            SessionError::Persist(e) => e.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Unauthenticated => {
                (StatusCode::UNAUTHORIZED, self.to_string())
            }
            ApiError::UnknownUser(_) => {
                tracing::warn!("Authenticated identity has no user record");
                (StatusCode::NOT_FOUND, "User not found".to_string())
            }
            ApiError::ThreadNotFound(_) => {
                (StatusCode::NOT_FOUND, self.to_string())
            }
            ApiError::Persist(ref e) => {
                tracing::error!("Persistence error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Storage error".to_string())
            }
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
