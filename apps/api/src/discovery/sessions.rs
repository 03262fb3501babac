use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info};
use uuid::Uuid;

use crate::discovery::board::{JobBoard, PreloadPolicy};
use crate::discovery::enrichment::EnrichmentService;

struct SessionEntry {
    board: Arc<JobBoard>,
    last_used: Instant,
}

/// One `JobBoard` per client session, created on first search and dropped
/// once it has been idle for longer than the configured TTL.
pub struct SessionRegistry {
    boards: RwLock<HashMap<Uuid, SessionEntry>>,
    enrichment: EnrichmentService,
    preload: Option<PreloadPolicy>,
}

impl SessionRegistry {
    pub fn new(enrichment: EnrichmentService, preload: Option<PreloadPolicy>) -> Self {
        Self {
            boards: RwLock::new(HashMap::new()),
            enrichment,
            preload,
        }
    }

    /// Existing board for the session, if any. Counts as activity.
    pub async fn get(&self, session_id: Uuid) -> Option<Arc<JobBoard>> {
        let mut boards = self.boards.write().await;
        let entry = boards.get_mut(&session_id)?;
        entry.last_used = Instant::now();
        Some(entry.board.clone())
    }

    pub async fn get_or_create(&self, session_id: Uuid) -> Arc<JobBoard> {
        let mut boards = self.boards.write().await;
        let entry = boards.entry(session_id).or_insert_with(|| {
            debug!(%session_id, "Creating job board for new session");
            SessionEntry {
                board: Arc::new(JobBoard::new(self.enrichment.clone(), self.preload.clone())),
                last_used: Instant::now(),
            }
        });
        entry.last_used = Instant::now();
        entry.board.clone()
    }

    /// Drops every board not used within `ttl`. Returns how many were dropped.
    pub async fn evict_idle(&self, ttl: Duration) -> usize {
        let mut boards = self.boards.write().await;
        let before = boards.len();
        boards.retain(|_, entry| entry.last_used.elapsed() < ttl);
        before - boards.len()
    }

    /// Runs `evict_idle` every `period` until the registry is dropped.
    pub fn spawn_sweeper(self: &Arc<Self>, ttl: Duration, period: Duration) -> JoinHandle<()> {
        let registry = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.tick().await; // Skip first immediate tick

            loop {
                interval.tick().await;
                let Some(registry) = registry.upgrade() else {
                    break;
                };
                let evicted = registry.evict_idle(ttl).await;
                if evicted > 0 {
                    info!(evicted, "Evicted idle job boards");
                }
            }
        })
    }
}
