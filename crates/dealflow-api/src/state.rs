use std::sync::Arc;
use dealflow_session::SessionService;
use crate::config::Config;

/// Shared application state passed to all handlers
///
/// Handlers only get the caller-facing `SessionService`; trusted thread
/// mutations are not reachable over HTTP.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub sessions: SessionService,
}

impl AppState {
    pub fn new(config: Config, sessions: SessionService) -> Self {
        Self {
            config: Arc::new(config),
            sessions,
        }
    }
}
