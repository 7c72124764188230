//! Shared application state.

use std::sync::Arc;

use curricula_core::TokenService;
use curricula_db::{Database, LocalFileStore};
use curricula_jobs::NotificationQueue;

/// State handed to every handler. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    /// Database context with all repositories.
    pub db: Database,
    /// Token issue/verify service.
    pub tokens: Arc<TokenService>,
    /// Upload storage for material files.
    pub files: Arc<LocalFileStore>,
    /// Fire-and-forget notification producer.
    pub notifications: NotificationQueue,
}
