use std::sync::Arc;

use crate::config::Config;
use crate::discovery::pipeline::DiscoveryPipeline;
use crate::discovery::saved::SavedJobStore;
use crate::discovery::sessions::SessionRegistry;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub pipeline: Arc<DiscoveryPipeline>,
    pub sessions: Arc<SessionRegistry>,
    /// Postgres when `DATABASE_URL` is set, in-memory otherwise.
    pub saved_store: Arc<dyn SavedJobStore>,
}
