use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};

use dealflow_persist::Thread;
use dealflow_session::{ClearedMemory, ResolvedThread};
use crate::{error::ApiResult, identity::Caller, state::AppState};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ThreadResponse {
    pub thread_id: String,
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

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ResolveResponse {
    pub thread_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_thread_id: Option<String>,
    pub is_new: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_summary: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ClearMemoryResponse {
    pub cleared: bool,
    pub deleted: u64,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListThreadsQuery {
    /// Maximum number of threads to return (default and cap: 100)
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ListThreadsResponse {
    pub threads: Vec<ThreadResponse>,
}

/// Get the caller's current thread
///
/// Returns `null` when the caller is anonymous, unknown, or has no thread.
#[utoipa::path(
    get,
    path = "/session/current",
    responses(
        (status = 200, description = "Most recent thread or null", body = ThreadResponse)
    ),
    tag = "session"
)]
pub async fn current_thread(
    State(state): State<Arc<AppState>>,
    caller: Caller,
) -> Json<Option<ThreadResponse>> {
    let thread = state.sessions.current_thread(caller.identity()).await;
    Json(thread.map(thread_to_response))
}

/// Resolve the thread for this interaction
///
/// Reuses the most recent thread while it is fresh, otherwise starts a new
/// one carrying the previous summary.
#[utoipa::path(
    post,
    path = "/session/resolve",
    responses(
        (status = 200, description = "Thread handle", body = ResolveResponse),
        (status = 401, description = "No caller identity"),
        (status = 404, description = "Identity has no user record")
    ),
    tag = "session"
)]
pub async fn resolve_thread(
    State(state): State<Arc<AppState>>,
    caller: Caller,
) -> ApiResult<Json<ResolveResponse>> {
    let resolved = state
        .sessions
        .resolve_active_thread(caller.identity(), Utc::now())
        .await?;

    Ok(Json(resolved.into()))
}

/// List the caller's threads, most recent first
#[utoipa::path(
    get,
    path = "/session/threads",
    params(ListThreadsQuery),
    responses(
        (status = 200, description = "Thread history", body = ListThreadsResponse)
    ),
    tag = "session"
)]
pub async fn list_threads(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Query(query): Query<ListThreadsQuery>,
) -> Json<ListThreadsResponse> {
    let threads = state
        .sessions
        .list_threads(caller.identity(), query.limit)
        .await
        .into_iter()
        .map(thread_to_response)
        .collect();

    Json(ListThreadsResponse { threads })
}

/// Erase all of the caller's assistant threads
#[utoipa::path(
    delete,
    path = "/session/memory",
    responses(
        (status = 200, description = "Memory cleared", body = ClearMemoryResponse),
        (status = 401, description = "No caller identity"),
        (status = 404, description = "Identity has no user record")
    ),
    tag = "session"
)]
pub async fn clear_memory(
    State(state): State<Arc<AppState>>,
    caller: Caller,
) -> ApiResult<Json<ClearMemoryResponse>> {
    let cleared = state.sessions.clear_memory(caller.identity()).await?;
    Ok(Json(cleared.into()))
}

impl From<ResolvedThread> for ResolveResponse {
    fn from(resolved: ResolvedThread) -> Self {
        Self {
            thread_id: resolved.thread_id,
            agent_thread_id: resolved.agent_thread_id,
            is_new: resolved.is_new,
            previous_summary: resolved.previous_summary,
        }
    }
}

impl From<ClearedMemory> for ClearMemoryResponse {
    fn from(cleared: ClearedMemory) -> Self {
        Self {
            cleared: cleared.cleared,
            deleted: cleared.deleted,
        }
    }
}

fn thread_to_response(thread: Thread) -> ThreadResponse {
    ThreadResponse {
        thread_id: thread.id,
        session_id: thread.session_id,
        agent_thread_id: thread.agent_thread_id,
        summary: thread.summary,
        summarized_message_count: thread.summarized_message_count,
        last_role: thread.last_role,
        last_activity_at: thread.last_activity_at,
        created_at: thread.created_at,
        updated_at: thread.updated_at,
    }
}
