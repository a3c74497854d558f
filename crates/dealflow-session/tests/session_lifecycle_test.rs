use std::sync::Arc;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use dealflow_persist::{
    CallerIdentity, MemoryStore, NewThread, PersistError, Thread, ThreadPatch, ThreadStore, User,
    UserDirectory, UserRole,
};
use dealflow_session::{SessionError, SessionService, ThreadMaintenance, WindowedContinuity};
use tokio_test::{assert_err, assert_ok};

const SUBJECT: &str = "idp|investor-1";
const USER_ID: &str = "user-1";

async fn setup() -> (Arc<MemoryStore>, SessionService, ThreadMaintenance) {
    let store = Arc::new(MemoryStore::new());
    store
        .insert_user(User {
            id: USER_ID.to_string(),
            subject: SUBJECT.to_string(),
            email: Some("investor@example.com".to_string()),
            name: Some("Dana".to_string()),
            role: UserRole::Investor,
        })
        .await;

    let sessions = SessionService::new(store.clone(), store.clone());
    let maintenance = ThreadMaintenance::new(store.clone());
    (store, sessions, maintenance)
}

fn caller() -> CallerIdentity {
    CallerIdentity::new(SUBJECT)
}

/// Store whose every call fails as if the database were unreachable.
struct UnreachableStore;

fn unreachable() -> PersistError {
    PersistError::Connection("server selection timeout".to_string())
}

#[async_trait]
impl ThreadStore for UnreachableStore {
    async fn create_thread(&self, _thread: NewThread) -> dealflow_persist::Result<Thread> {
        Err(unreachable())
    }

    async fn get_thread(&self, _thread_id: &str) -> dealflow_persist::Result<Option<Thread>> {
        Err(unreachable())
    }

    async fn latest_thread(&self, _user_id: &str) -> dealflow_persist::Result<Option<Thread>> {
        Err(unreachable())
    }

    async fn list_threads(&self, _user_id: &str, _limit: Option<i64>) -> dealflow_persist::Result<Vec<Thread>> {
        Err(unreachable())
    }

    async fn patch_thread(&self, _thread_id: &str, _patch: ThreadPatch) -> dealflow_persist::Result<()> {
        Err(unreachable())
    }

    async fn delete_user_threads(&self, _user_id: &str) -> dealflow_persist::Result<u64> {
        Err(unreachable())
    }
}

#[async_trait]
impl UserDirectory for UnreachableStore {
    async fn find_by_subject(&self, _subject: &str) -> dealflow_persist::Result<Option<User>> {
        Err(unreachable())
    }
}

/// Memory store that erases the user's threads right after the latest one is
/// read, like a memory clear landing between lookup and touch.
struct ErasedAfterLookup {
    inner: Arc<MemoryStore>,
}

#[async_trait]
impl ThreadStore for ErasedAfterLookup {
    async fn create_thread(&self, thread: NewThread) -> dealflow_persist::Result<Thread> {
        self.inner.create_thread(thread).await
    }

    async fn get_thread(&self, thread_id: &str) -> dealflow_persist::Result<Option<Thread>> {
        self.inner.get_thread(thread_id).await
    }

    async fn latest_thread(&self, user_id: &str) -> dealflow_persist::Result<Option<Thread>> {
        let latest = self.inner.latest_thread(user_id).await?;
        self.inner.delete_user_threads(user_id).await?;
        Ok(latest)
    }

    async fn list_threads(&self, user_id: &str, limit: Option<i64>) -> dealflow_persist::Result<Vec<Thread>> {
        self.inner.list_threads(user_id, limit).await
    }

    async fn patch_thread(&self, thread_id: &str, patch: ThreadPatch) -> dealflow_persist::Result<()> {
        self.inner.patch_thread(thread_id, patch).await
    }

    async fn delete_user_threads(&self, user_id: &str) -> dealflow_persist::Result<u64> {
        self.inner.delete_user_threads(user_id).await
    }
}

async fn seed_thread(store: &MemoryStore, at: DateTime<Utc>, summary: Option<&str>) -> String {
    store
        .create_thread(NewThread::new(USER_ID, at).with_summary(summary.map(str::to_string)))
        .await
        .unwrap()
        .id
}

#[tokio::test]
async fn test_first_interaction_creates_thread() {
    let (store, sessions, _) = setup().await;
    let now = Utc::now();

    let resolved = sessions.resolve_active_thread(Some(&caller()), now).await.unwrap();

    assert!(resolved.is_new);
    assert!(resolved.previous_summary.is_none());
    assert!(resolved.agent_thread_id.is_none());
    assert_eq!(store.thread_count().await, 1);

    let thread = store.get_thread(&resolved.thread_id).await.unwrap().unwrap();
    assert_eq!(thread.user_id, USER_ID);
    assert_eq!(thread.last_activity_at, now);
    assert_eq!(thread.created_at, now);
    assert_eq!(thread.updated_at, now);
    assert!(thread.summary.is_none());
}

#[tokio::test]
async fn test_fresh_thread_is_reused() {
    let (store, sessions, _) = setup().await;
    let now = Utc::now();
    let id = seed_thread(&store, now - Duration::hours(23) - Duration::minutes(59), None).await;

    let resolved = sessions.resolve_active_thread(Some(&caller()), now).await.unwrap();

    assert!(!resolved.is_new);
    assert_eq!(resolved.thread_id, id);
    assert_eq!(store.thread_count().await, 1);

    let thread = store.get_thread(&id).await.unwrap().unwrap();
    assert_eq!(thread.last_activity_at, now);
    assert_eq!(thread.updated_at, now);
}

#[tokio::test]
async fn test_reuse_returns_bound_agent_thread() {
    let (store, sessions, maintenance) = setup().await;
    let now = Utc::now();
    let id = seed_thread(&store, now - Duration::minutes(5), None).await;
    maintenance
        .bind_agent_thread(&id, "agent-thread-9", now - Duration::minutes(4))
        .await
        .unwrap();

    let resolved = sessions.resolve_active_thread(Some(&caller()), now).await.unwrap();

    assert!(!resolved.is_new);
    assert_eq!(resolved.agent_thread_id.as_deref(), Some("agent-thread-9"));
}

#[tokio::test]
async fn test_stale_thread_rolls_over_with_summary() {
    let (store, sessions, _) = setup().await;
    let now = Utc::now();
    let summary = "buyer wants \u{05D3}\u{05D9}\u{05E8}\u{05D4} near the beach, budget 2.4M\n";
    let stale = seed_thread(
        &store,
        now - Duration::hours(24) - Duration::seconds(1),
        Some(summary),
    )
    .await;

    let resolved = sessions.resolve_active_thread(Some(&caller()), now).await.unwrap();

    assert!(resolved.is_new);
    assert_ne!(resolved.thread_id, stale);
    assert_eq!(resolved.previous_summary.as_deref(), Some(summary));

    let thread = store.get_thread(&resolved.thread_id).await.unwrap().unwrap();
    assert_eq!(thread.summary.as_deref().map(str::as_bytes), Some(summary.as_bytes()));
    assert!(thread.agent_thread_id.is_none());
    assert_eq!(thread.last_activity_at, now);

    // The stale thread is kept as history
    assert_eq!(store.thread_count().await, 2);
}

#[tokio::test]
async fn test_rollover_tel_aviv_scenario() {
    let (store, sessions, _) = setup().await;
    let now = Utc::now();
    seed_thread(&store, now - Duration::hours(25), Some("prefers 2BR in Tel Aviv")).await;

    let resolved = sessions.resolve_active_thread(Some(&caller()), now).await.unwrap();

    assert!(resolved.is_new);
    assert_eq!(resolved.previous_summary.as_deref(), Some("prefers 2BR in Tel Aviv"));
    let thread = store.get_thread(&resolved.thread_id).await.unwrap().unwrap();
    assert_eq!(thread.summary.as_deref(), Some("prefers 2BR in Tel Aviv"));
}

#[tokio::test]
async fn test_rollover_without_summary() {
    let (store, sessions, _) = setup().await;
    let now = Utc::now();
    seed_thread(&store, now - Duration::days(7), None).await;

    let resolved = sessions.resolve_active_thread(Some(&caller()), now).await.unwrap();

    assert!(resolved.is_new);
    assert!(resolved.previous_summary.is_none());
}

#[tokio::test]
async fn test_most_recent_thread_wins_over_older_summary() {
    let (store, sessions, _) = setup().await;
    let now = Utc::now();
    seed_thread(&store, now - Duration::hours(30), Some("discussed property X")).await;
    let recent = seed_thread(&store, now - Duration::hours(1), None).await;

    let resolved = sessions.resolve_active_thread(Some(&caller()), now).await.unwrap();

    assert!(!resolved.is_new);
    assert_eq!(resolved.thread_id, recent);
    assert!(resolved.previous_summary.is_none());

    let thread = store.get_thread(&recent).await.unwrap().unwrap();
    assert!(thread.summary.is_none());
    assert_eq!(store.thread_count().await, 2);
}

#[tokio::test]
async fn test_rollover_inherits_only_immediate_predecessor() {
    let (store, sessions, _) = setup().await;
    let now = Utc::now();
    seed_thread(&store, now - Duration::hours(80), Some("oldest")).await;
    seed_thread(&store, now - Duration::hours(50), Some("latest stale")).await;

    let resolved = sessions.resolve_active_thread(Some(&caller()), now).await.unwrap();

    assert_eq!(resolved.previous_summary.as_deref(), Some("latest stale"));
}

#[tokio::test]
async fn test_unauthenticated_resolve_creates_nothing() {
    let (store, sessions, _) = setup().await;

    let err = assert_err!(sessions.resolve_active_thread(None, Utc::now()).await);

    assert!(matches!(err, SessionError::Unauthenticated));
    assert_eq!(store.thread_count().await, 0);
}

#[tokio::test]
async fn test_unknown_user_resolve_fails() {
    let (store, sessions, _) = setup().await;
    let stranger = CallerIdentity::new("idp|nobody");

    let err = sessions
        .resolve_active_thread(Some(&stranger), Utc::now())
        .await
        .unwrap_err();

    assert!(matches!(err, SessionError::UnknownUser(subject) if subject == "idp|nobody"));
    assert_eq!(store.thread_count().await, 0);
}

#[tokio::test]
async fn test_current_thread_is_soft() {
    let (store, sessions, _) = setup().await;
    let now = Utc::now();

    assert!(sessions.current_thread(None).await.is_none());
    assert!(sessions.current_thread(Some(&CallerIdentity::new("idp|nobody"))).await.is_none());
    assert!(sessions.current_thread(Some(&caller())).await.is_none());

    seed_thread(&store, now - Duration::hours(30), Some("older")).await;
    let recent = seed_thread(&store, now - Duration::hours(2), None).await;

    let current = sessions.current_thread(Some(&caller())).await.unwrap();
    assert_eq!(current.id, recent);
    // Read path never mutates
    assert_eq!(current.last_activity_at, now - Duration::hours(2));
}

#[tokio::test]
async fn test_current_thread_matches_resolve_on_ties() {
    let (store, sessions, _) = setup().await;
    let at = Utc::now() - Duration::minutes(10);
    seed_thread(&store, at, None).await;
    let later_insert = seed_thread(&store, at, None).await;

    let current = sessions.current_thread(Some(&caller())).await.unwrap();
    let resolved = sessions.resolve_active_thread(Some(&caller()), Utc::now()).await.unwrap();

    assert_eq!(current.id, later_insert);
    assert_eq!(resolved.thread_id, later_insert);
}

#[tokio::test]
async fn test_bind_agent_thread_is_idempotent() {
    let (store, sessions, maintenance) = setup().await;
    let now = Utc::now();
    let resolved = sessions.resolve_active_thread(Some(&caller()), now).await.unwrap();

    assert_ok!(maintenance.bind_agent_thread(&resolved.thread_id, "abc", now).await);
    assert_ok!(maintenance.bind_agent_thread(&resolved.thread_id, "abc", now).await);

    let thread = store.get_thread(&resolved.thread_id).await.unwrap().unwrap();
    assert_eq!(thread.agent_thread_id.as_deref(), Some("abc"));
    assert_eq!(store.thread_count().await, 1);
}

#[tokio::test]
async fn test_update_summary_overwrites() {
    let (store, sessions, maintenance) = setup().await;
    let now = Utc::now();
    let resolved = sessions.resolve_active_thread(Some(&caller()), now).await.unwrap();

    maintenance
        .update_summary(&resolved.thread_id, "first pass", 4, now)
        .await
        .unwrap();
    let later = now + Duration::minutes(3);
    maintenance
        .update_summary(&resolved.thread_id, "second pass", 10, later)
        .await
        .unwrap();

    let thread = store.get_thread(&resolved.thread_id).await.unwrap().unwrap();
    assert_eq!(thread.summary.as_deref(), Some("second pass"));
    assert_eq!(thread.summarized_message_count, Some(10));
    assert_eq!(thread.updated_at, later);
    // Summaries are not activity
    assert_eq!(thread.last_activity_at, now);
}

#[tokio::test]
async fn test_record_role_used() {
    let (store, sessions, maintenance) = setup().await;
    let now = Utc::now();
    let resolved = sessions.resolve_active_thread(Some(&caller()), now).await.unwrap();

    maintenance
        .record_role_used(&resolved.thread_id, "mortgage_advisor", now)
        .await
        .unwrap();

    let thread = store.get_thread(&resolved.thread_id).await.unwrap().unwrap();
    assert_eq!(thread.last_role.as_deref(), Some("mortgage_advisor"));
}

#[tokio::test]
async fn test_internal_patch_on_missing_thread_fails() {
    let (_, _, maintenance) = setup().await;
    let now = Utc::now();

    let err = maintenance.bind_agent_thread("missing", "abc", now).await.unwrap_err();
    assert!(matches!(err, PersistError::ThreadNotFound(_)));

    let err = maintenance.update_summary("missing", "s", 1, now).await.unwrap_err();
    assert!(matches!(err, PersistError::ThreadNotFound(_)));

    let err = maintenance.record_role_used("missing", "lawyer", now).await.unwrap_err();
    assert!(matches!(err, PersistError::ThreadNotFound(_)));
}

#[tokio::test]
async fn test_clear_memory_is_exhaustive() {
    let (store, sessions, _) = setup().await;
    let now = Utc::now();
    for h in [1, 30, 60, 90] {
        seed_thread(&store, now - Duration::hours(h), Some("history")).await;
    }
    store
        .create_thread(NewThread::new("someone-else", now))
        .await
        .unwrap();

    let cleared = sessions.clear_memory(Some(&caller())).await.unwrap();

    assert!(cleared.cleared);
    assert_eq!(cleared.deleted, 4);
    assert!(store.list_threads(USER_ID, None).await.unwrap().is_empty());
    assert_eq!(store.list_threads("someone-else", None).await.unwrap().len(), 1);

    let resolved = sessions.resolve_active_thread(Some(&caller()), now).await.unwrap();
    assert!(resolved.is_new);
    assert!(resolved.previous_summary.is_none());
}

#[tokio::test]
async fn test_clear_memory_requires_identity() {
    let (store, sessions, _) = setup().await;
    seed_thread(&store, Utc::now(), None).await;

    assert!(matches!(
        sessions.clear_memory(None).await.unwrap_err(),
        SessionError::Unauthenticated
    ));
    assert!(matches!(
        sessions.clear_memory(Some(&CallerIdentity::new("idp|nobody"))).await.unwrap_err(),
        SessionError::UnknownUser(_)
    ));
    assert_eq!(store.thread_count().await, 1);
}

#[tokio::test]
async fn test_list_threads_most_recent_first() {
    let (store, sessions, _) = setup().await;
    let now = Utc::now();
    let old = seed_thread(&store, now - Duration::hours(48), None).await;
    let new = seed_thread(&store, now - Duration::hours(1), None).await;

    let threads = sessions.list_threads(Some(&caller()), None).await;
    let ids: Vec<&str> = threads.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, vec![new.as_str(), old.as_str()]);

    assert!(sessions.list_threads(None, None).await.is_empty());
    assert_eq!(sessions.list_threads(Some(&caller()), Some(1)).await.len(), 1);
}

#[tokio::test]
async fn test_custom_window_strategy() {
    let (store, sessions, _) = setup().await;
    let sessions = sessions.with_strategy(Arc::new(WindowedContinuity::from_hours(1)));
    let now = Utc::now();
    seed_thread(&store, now - Duration::hours(2), Some("short window")).await;

    let resolved = sessions.resolve_active_thread(Some(&caller()), now).await.unwrap();

    assert!(resolved.is_new);
    assert_eq!(resolved.previous_summary.as_deref(), Some("short window"));
}

#[tokio::test]
async fn test_resolved_thread_serialization_omits_absent_fields() {
    let (_, sessions, _) = setup().await;
    let resolved = sessions
        .resolve_active_thread(Some(&caller()), Utc::now())
        .await
        .unwrap();

    let json = serde_json::to_value(&resolved).unwrap();
    assert_eq!(json["is_new"], true);
    assert!(json.get("agent_thread_id").is_none());
    assert!(json.get("previous_summary").is_none());
}

#[tokio::test]
async fn test_read_paths_degrade_when_thread_store_fails() {
    let (store, _, _) = setup().await;
    let sessions = SessionService::new(Arc::new(UnreachableStore), store.clone());

    assert!(sessions.current_thread(Some(&caller())).await.is_none());
    assert!(sessions.list_threads(Some(&caller()), None).await.is_empty());
}

#[tokio::test]
async fn test_read_paths_degrade_when_user_lookup_fails() {
    let (store, _, _) = setup().await;
    seed_thread(&store, Utc::now(), None).await;
    let sessions = SessionService::new(store.clone(), Arc::new(UnreachableStore));

    assert!(sessions.current_thread(Some(&caller())).await.is_none());
    assert!(sessions.list_threads(Some(&caller()), None).await.is_empty());
}

#[tokio::test]
async fn test_write_paths_surface_store_failures() {
    let (store, _, _) = setup().await;
    let sessions = SessionService::new(Arc::new(UnreachableStore), store.clone());

    let err = assert_err!(sessions.resolve_active_thread(Some(&caller()), Utc::now()).await);
    assert!(matches!(err, SessionError::Persist(PersistError::Connection(_))));

    let err = assert_err!(sessions.clear_memory(Some(&caller())).await);
    assert!(matches!(err, SessionError::Persist(PersistError::Connection(_))));

    let sessions = SessionService::new(store.clone(), Arc::new(UnreachableStore));
    let err = assert_err!(sessions.resolve_active_thread(Some(&caller()), Utc::now()).await);
    assert!(matches!(err, SessionError::Persist(PersistError::Connection(_))));
    assert_eq!(store.thread_count().await, 0);
}

#[tokio::test]
async fn test_ping_reports_store_health() {
    let (store, sessions, _) = setup().await;
    assert_ok!(sessions.ping().await);

    let broken = SessionService::new(Arc::new(UnreachableStore), store);
    let err = assert_err!(broken.ping().await);
    assert!(matches!(err, SessionError::Persist(PersistError::Connection(_))));
}

#[tokio::test]
async fn test_resume_of_erased_thread_starts_fresh() {
    let (store, _, _) = setup().await;
    let now = Utc::now();
    let erased = seed_thread(&store, now - Duration::minutes(5), Some("gone")).await;
    let sessions = SessionService::new(
        Arc::new(ErasedAfterLookup { inner: store.clone() }),
        store.clone(),
    );

    let resolved = assert_ok!(sessions.resolve_active_thread(Some(&caller()), now).await);

    assert!(resolved.is_new);
    assert_ne!(resolved.thread_id, erased);
    assert!(resolved.previous_summary.is_none());
    assert!(resolved.agent_thread_id.is_none());
    assert_eq!(store.thread_count().await, 1);
}
