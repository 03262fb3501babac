//! JobBoard: the single owner of one UI session's discovery state.
//!
//! Owns the current result set, the search generation, the enriched-id set,
//! the per-id in-flight enrichment markers and the selection. Every mutation
//! goes through a transition method here:
//!
//! - `begin_search` / `apply_new_search_result`: a new generation discards the
//!   previous result set in full; results from an older generation are dropped.
//! - `ensure_enriched` / `mark_enriched`: enrichment runs at most once per job
//!   id. The in-flight marker is checked-and-set under the state lock, so two
//!   near-simultaneous triggers share one upstream call. A completion whose
//!   generation has been superseded is discarded.
//!
//! Enrichment runs in its own task so an abandoned request cannot strand the
//! in-flight marker.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{watch, Mutex};
use tracing::{debug, info};

use crate::discovery::enrichment::{apply_expansion, EnrichmentService};
use crate::discovery::filters::FacetFilter;
use crate::discovery::pipeline::DiscoveryPipeline;
use crate::discovery::providers::ProviderQuery;
use crate::discovery::saved::SaveState;
use crate::discovery::sorting::SortStrategy;
use crate::models::job::Job;

pub const NO_JOBS_MESSAGE: &str = "No jobs found. Try different search terms or filters.";

#[derive(Debug, Error, PartialEq)]
pub enum BoardError {
    #[error("job {0} is not in the current result set")]
    JobNotFound(String),

    #[error("result set was replaced by a newer search")]
    Superseded,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    /// Detail pane next to the list.
    #[default]
    Inline,
    /// Detail takes over the screen.
    FullScreen,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Selection {
    pub active_job_id: Option<String>,
    pub view_mode: ViewMode,
}

/// Background preloading of short descriptions after a search.
#[derive(Debug, Clone)]
pub struct PreloadPolicy {
    pub initial_delay: Duration,
    pub spacing: Duration,
    pub max_jobs: usize,
}

impl Default for PreloadPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(5),
            spacing: Duration::from_secs(8),
            max_jobs: 10,
        }
    }
}

/// Proof that a search was started; results are only accepted for the
/// generation it names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchTicket {
    pub generation: u64,
}

#[derive(Debug, Clone)]
pub enum SearchOutcome {
    Results { generation: u64, jobs: Vec<Job> },
    NoJobsFound { generation: u64, message: &'static str },
    Superseded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrichmentStatus {
    /// Already expanded earlier in this result set.
    Cached,
    /// Long enough that no expansion is needed.
    NotNeeded,
    Enriched,
    /// Expansion failed; the short description is kept.
    Degraded,
}

#[derive(Debug, Clone, Serialize)]
pub struct SelectOutcome {
    pub job: Job,
    pub enrichment: EnrichmentStatus,
}

type InFlight = watch::Receiver<Option<Job>>;

#[derive(Default)]
struct BoardState {
    generation: u64,
    jobs: Vec<Job>,
    enriched: HashSet<String>,
    in_flight: HashMap<String, InFlight>,
    selection: Selection,
}

impl BoardState {
    fn job(&self, job_id: &str) -> Option<&Job> {
        self.jobs.iter().find(|j| j.id == job_id)
    }
}

enum EnrichStep {
    Done(SelectOutcome),
    Wait(Job, InFlight),
    Start(Job, u64, watch::Sender<Option<Job>>, InFlight),
}

pub struct JobBoard {
    state: Mutex<BoardState>,
    enrichment: EnrichmentService,
    preload: Option<PreloadPolicy>,
    pub saves: SaveState,
}

impl JobBoard {
    pub fn new(enrichment: EnrichmentService, preload: Option<PreloadPolicy>) -> Self {
        Self {
            state: Mutex::new(BoardState::default()),
            enrichment,
            preload,
            saves: SaveState::default(),
        }
    }

    pub async fn selection(&self) -> Selection {
        self.state.lock().await.selection.clone()
    }

    /// Starts a new search epoch. The old result set, enriched set, in-flight
    /// markers and selection are discarded immediately.
    pub async fn begin_search(&self) -> SearchTicket {
        let mut state = self.state.lock().await;
        state.generation += 1;
        state.jobs.clear();
        state.enriched.clear();
        state.in_flight.clear();
        state.selection = Selection::default();
        SearchTicket {
            generation: state.generation,
        }
    }

    /// Installs a finished search's jobs if its ticket is still current.
    /// The first job becomes the active one, shown inline.
    pub async fn apply_new_search_result(&self, ticket: SearchTicket, jobs: Vec<Job>) -> SearchOutcome {
        let mut state = self.state.lock().await;
        if state.generation != ticket.generation {
            debug!(
                ticket = ticket.generation,
                current = state.generation,
                "Discarding results from a superseded search"
            );
            return SearchOutcome::Superseded;
        }

        state.selection = Selection {
            active_job_id: jobs.first().map(|j| j.id.clone()),
            view_mode: ViewMode::Inline,
        };
        state.jobs = jobs;

        if state.jobs.is_empty() {
            SearchOutcome::NoJobsFound {
                generation: ticket.generation,
                message: NO_JOBS_MESSAGE,
            }
        } else {
            SearchOutcome::Results {
                generation: ticket.generation,
                jobs: state.jobs.clone(),
            }
        }
    }

    /// Runs a full search for this session and installs the result.
    pub async fn search(
        self: &Arc<Self>,
        pipeline: &DiscoveryPipeline,
        query: &ProviderQuery,
        sort: SortStrategy,
        now: DateTime<Utc>,
    ) -> SearchOutcome {
        let ticket = self.begin_search().await;
        let jobs = pipeline.search(query, sort, now).await;
        let outcome = self.apply_new_search_result(ticket, jobs).await;

        if matches!(outcome, SearchOutcome::Results { .. }) {
            if let Some(policy) = self.preload.clone() {
                self.spawn_preload(ticket.generation, policy);
            }
        }
        outcome
    }

    /// Current result set, facet-filtered and sorted for display.
    pub async fn view(&self, facets: &FacetFilter, sort: SortStrategy) -> (u64, Vec<Job>) {
        let state = self.state.lock().await;
        let mut visible = facets.apply(&state.jobs);
        sort.sort_refs(&mut visible);
        (state.generation, visible.into_iter().cloned().collect())
    }

    pub async fn job(&self, job_id: &str) -> Option<Job> {
        self.state.lock().await.job(job_id).cloned()
    }

    pub async fn close_detail(&self) -> Selection {
        let mut state = self.state.lock().await;
        state.selection.view_mode = ViewMode::Inline;
        state.selection.clone()
    }

    /// Makes `job_id` the active job and expands its description if eligible.
    pub async fn select_job(
        self: &Arc<Self>,
        job_id: &str,
        view_mode: ViewMode,
    ) -> Result<SelectOutcome, BoardError> {
        {
            let mut state = self.state.lock().await;
            if state.job(job_id).is_none() {
                return Err(BoardError::JobNotFound(job_id.to_string()));
            }
            state.selection = Selection {
                active_job_id: Some(job_id.to_string()),
                view_mode,
            };
        }
        self.ensure_enriched(job_id, None).await
    }

    /// Expands `job_id` at most once per result set. Concurrent callers for
    /// the same id share the one in-flight expansion.
    pub async fn ensure_enriched(
        self: &Arc<Self>,
        job_id: &str,
        expected_generation: Option<u64>,
    ) -> Result<SelectOutcome, BoardError> {
        let step = {
            let mut state = self.state.lock().await;
            if expected_generation.is_some_and(|g| g != state.generation) {
                return Err(BoardError::Superseded);
            }
            let job = state
                .job(job_id)
                .cloned()
                .ok_or_else(|| BoardError::JobNotFound(job_id.to_string()))?;

            if job.is_enriched() || state.enriched.contains(job_id) {
                EnrichStep::Done(SelectOutcome {
                    job,
                    enrichment: EnrichmentStatus::Cached,
                })
            } else if !EnrichmentService::is_eligible(&job) {
                EnrichStep::Done(SelectOutcome {
                    job,
                    enrichment: EnrichmentStatus::NotNeeded,
                })
            } else {
                // A closed channel means the owning task died; start over.
                let pending = state
                    .in_flight
                    .get(job_id)
                    .filter(|p| p.has_changed().is_ok())
                    .cloned();
                match pending {
                    Some(pending) => EnrichStep::Wait(job, pending),
                    None => {
                        let (tx, rx) = watch::channel(None);
                        state.in_flight.insert(job_id.to_string(), rx.clone());
                        EnrichStep::Start(job, state.generation, tx, rx)
                    }
                }
            }
        };

        let (job, pending) = match step {
            EnrichStep::Done(outcome) => return Ok(outcome),
            EnrichStep::Wait(job, pending) => (job, pending),
            EnrichStep::Start(job, generation, tx, rx) => {
                let board = Arc::clone(self);
                let target = job.clone();
                tokio::spawn(async move {
                    board.run_enrichment(generation, target, tx).await;
                });
                (job, rx)
            }
        };

        Ok(await_enrichment(job, pending).await)
    }

    async fn run_enrichment(&self, generation: u64, job: Job, done: watch::Sender<Option<Job>>) {
        let report = self.enrichment.expand(&job).await;
        debug!(
            job_id = %job.id,
            generation,
            attempts = report.attempts,
            retries = report.backoffs.len(),
            "Enrichment finished"
        );

        let finished = match report.result {
            Ok(expanded) => self
                .mark_enriched(generation, &job.id, expanded)
                .await
                .unwrap_or_else(|| job.clone()),
            Err(_) => {
                self.clear_in_flight(generation, &job.id).await;
                job
            }
        };
        done.send_replace(Some(finished));
    }

    /// Records a successful expansion: rewrites the job in the result set,
    /// adds it to the enriched set and clears its in-flight marker. Returns
    /// `None` when the generation has moved on and the write was discarded.
    pub async fn mark_enriched(&self, generation: u64, job_id: &str, expanded: String) -> Option<Job> {
        let mut state = self.state.lock().await;
        if state.generation != generation {
            debug!(job_id, generation, "Discarding stale enrichment completion");
            return None;
        }

        let index = state.jobs.iter().position(|j| j.id == job_id)?;
        let updated = apply_expansion(state.jobs[index].clone(), expanded);
        state.jobs[index] = updated.clone();
        state.enriched.insert(job_id.to_string());
        state.in_flight.remove(job_id);
        Some(updated)
    }

    async fn clear_in_flight(&self, generation: u64, job_id: &str) {
        let mut state = self.state.lock().await;
        if state.generation == generation {
            state.in_flight.remove(job_id);
        }
    }

    fn spawn_preload(self: &Arc<Self>, generation: u64, policy: PreloadPolicy) {
        let board = Arc::clone(self);
        tokio::spawn(async move {
            board.preload(generation, policy).await;
        });
    }

    /// Expands up to `max_jobs` eligible jobs one at a time, spaced out to
    /// stay under upstream rate limits. Stops once the generation advances.
    async fn preload(self: Arc<Self>, generation: u64, policy: PreloadPolicy) {
        tokio::time::sleep(policy.initial_delay).await;

        let candidates: Vec<String> = {
            let state = self.state.lock().await;
            if state.generation != generation {
                return;
            }
            state
                .jobs
                .iter()
                .filter(|j| EnrichmentService::is_eligible(j) && !state.enriched.contains(&j.id))
                .take(policy.max_jobs)
                .map(|j| j.id.clone())
                .collect()
        };
        info!(generation, count = candidates.len(), "Preloading job descriptions");

        for (i, job_id) in candidates.iter().enumerate() {
            if self.ensure_enriched(job_id, Some(generation)).await.is_err() {
                debug!(generation, "Preload stopped by a newer search");
                return;
            }
            if i + 1 < candidates.len() {
                tokio::time::sleep(policy.spacing).await;
            }
        }
    }
}

async fn await_enrichment(original: Job, mut pending: InFlight) -> SelectOutcome {
    let job = match pending.changed().await {
        Ok(()) => pending.borrow().clone().unwrap_or(original),
        Err(_) => original,
    };
    let enrichment = if job.is_enriched() {
        EnrichmentStatus::Enriched
    } else {
        EnrichmentStatus::Degraded
    };
    SelectOutcome { job, enrichment }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::enrichment::RetryPolicy;
    use crate::testing::{job, MockExpander};

    fn board_with(expander: Arc<MockExpander>, preload: Option<PreloadPolicy>) -> Arc<JobBoard> {
        Arc::new(JobBoard::new(
            EnrichmentService::new(expander, RetryPolicy::default()),
            preload,
        ))
    }

    fn short_job(id: &str) -> Job {
        let mut j = job(id, "Video Editor");
        j.description = "word ".repeat(50);
        j
    }

    async fn load(board: &JobBoard, jobs: Vec<Job>) -> u64 {
        let ticket = board.begin_search().await;
        board.apply_new_search_result(ticket, jobs).await;
        ticket.generation
    }

    #[tokio::test(start_paused = true)]
    async fn test_selecting_short_job_enriches_after_rate_limits() {
        let expander = Arc::new(
            MockExpander::new()
                .then_fail(429)
                .then_fail(429)
                .then_succeed("A complete, much longer description."),
        );
        let board = board_with(expander.clone(), None);
        load(&board, vec![short_job("a")]).await;

        let started = tokio::time::Instant::now();
        let outcome = board.select_job("a", ViewMode::FullScreen).await.unwrap();

        assert_eq!(outcome.enrichment, EnrichmentStatus::Enriched);
        assert_eq!(outcome.job.description, "A complete, much longer description.");
        assert!(started.elapsed() >= Duration::from_millis(8000 + 16000));

        // The visible result set carries the enriched snapshot.
        let stored = board.job("a").await.unwrap();
        assert_eq!(
            stored.expanded_description.as_deref(),
            Some("A complete, much longer description.")
        );
        assert_eq!(board.selection().await.view_mode, ViewMode::FullScreen);
    }

    #[tokio::test]
    async fn test_second_selection_uses_cache() {
        let expander = Arc::new(MockExpander::new().then_succeed("Long"));
        let board = board_with(expander.clone(), None);
        load(&board, vec![short_job("a")]).await;

        board.select_job("a", ViewMode::Inline).await.unwrap();
        let again = board.select_job("a", ViewMode::Inline).await.unwrap();

        assert_eq!(again.enrichment, EnrichmentStatus::Cached);
        assert_eq!(again.job.description, "Long");
        assert_eq!(expander.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_selections_share_one_call() {
        let expander = Arc::new(
            MockExpander::new()
                .with_delay(Duration::from_secs(2))
                .then_succeed("Long"),
        );
        let board = board_with(expander.clone(), None);
        load(&board, vec![short_job("a")]).await;

        let (first, second) = tokio::join!(
            board.select_job("a", ViewMode::Inline),
            board.ensure_enriched("a", None)
        );

        assert_eq!(first.unwrap().job.description, "Long");
        assert_eq!(second.unwrap().job.description, "Long");
        assert_eq!(expander.call_count(), 1);
    }

    #[tokio::test]
    async fn test_long_description_is_not_expanded() {
        let expander = Arc::new(MockExpander::new().then_succeed("unused"));
        let board = board_with(expander.clone(), None);
        let mut long = job("a", "Editor");
        long.description = "word ".repeat(300);
        load(&board, vec![long]).await;

        let outcome = board.select_job("a", ViewMode::Inline).await.unwrap();
        assert_eq!(outcome.enrichment, EnrichmentStatus::NotNeeded);
        assert_eq!(expander.call_count(), 0);
    }

    #[tokio::test]
    async fn test_terminal_failure_degrades_to_original() {
        let expander = Arc::new(MockExpander::new().then_fail(400));
        let board = board_with(expander, None);
        load(&board, vec![short_job("a")]).await;

        let outcome = board.select_job("a", ViewMode::Inline).await.unwrap();
        assert_eq!(outcome.enrichment, EnrichmentStatus::Degraded);
        assert_eq!(outcome.job, short_job("a"));
        assert_eq!(board.job("a").await.unwrap().expanded_description, None);
    }

    #[tokio::test]
    async fn test_unknown_job_is_rejected() {
        let board = board_with(Arc::new(MockExpander::new()), None);
        load(&board, vec![short_job("a")]).await;
        assert_eq!(
            board.select_job("zzz", ViewMode::Inline).await.unwrap_err(),
            BoardError::JobNotFound("zzz".to_string())
        );
    }

    #[tokio::test]
    async fn test_stale_search_result_is_discarded() {
        let board = board_with(Arc::new(MockExpander::new()), None);
        let old = board.begin_search().await;
        let new = board.begin_search().await;

        let late = board.apply_new_search_result(old, vec![short_job("old")]).await;
        assert!(matches!(late, SearchOutcome::Superseded));

        let current = board.apply_new_search_result(new, vec![short_job("new")]).await;
        assert!(matches!(current, SearchOutcome::Results { .. }));
        assert!(board.job("old").await.is_none());
        assert_eq!(
            board.selection().await.active_job_id.as_deref(),
            Some("new")
        );
    }

    #[tokio::test]
    async fn test_empty_result_reports_no_jobs_found() {
        let board = board_with(Arc::new(MockExpander::new()), None);
        let ticket = board.begin_search().await;
        let outcome = board.apply_new_search_result(ticket, vec![]).await;
        assert!(matches!(outcome, SearchOutcome::NoJobsFound { message, .. } if message == NO_JOBS_MESSAGE));
    }

    #[tokio::test]
    async fn test_late_enrichment_is_not_applied_to_newer_result_set() {
        let board = board_with(Arc::new(MockExpander::new()), None);
        let old_generation = load(&board, vec![short_job("a")]).await;
        load(&board, vec![short_job("a")]).await;

        let written = board
            .mark_enriched(old_generation, "a", "Stale text".to_string())
            .await;
        assert!(written.is_none());
        assert_eq!(board.job("a").await.unwrap().expanded_description, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_enrichment_in_flight_across_new_search_is_discarded() {
        let expander = Arc::new(
            MockExpander::new()
                .with_delay(Duration::from_secs(10))
                .then_succeed("Old generation text")
                .then_succeed("New generation text"),
        );
        let board = board_with(expander.clone(), None);
        load(&board, vec![short_job("a")]).await;

        let pending = {
            let board = Arc::clone(&board);
            tokio::spawn(async move { board.select_job("a", ViewMode::Inline).await })
        };
        tokio::time::sleep(Duration::from_secs(1)).await;
        load(&board, vec![short_job("a")]).await;

        let stale = pending.await.unwrap().unwrap();
        assert_eq!(stale.enrichment, EnrichmentStatus::Degraded);
        assert_eq!(board.job("a").await.unwrap().expanded_description, None);

        let fresh = board.select_job("a", ViewMode::Inline).await.unwrap();
        assert_eq!(fresh.job.description, "New generation text");
        assert_eq!(expander.call_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_preload_enriches_in_order_with_spacing() {
        let expander = Arc::new(
            MockExpander::new()
                .then_succeed("one")
                .then_succeed("two")
                .then_succeed("three"),
        );
        let policy = PreloadPolicy {
            max_jobs: 2,
            ..PreloadPolicy::default()
        };
        let board = board_with(expander.clone(), Some(policy.clone()));
        let generation = load(&board, vec![short_job("a"), short_job("b"), short_job("c")]).await;

        let started = tokio::time::Instant::now();
        Arc::clone(&board).preload(generation, policy).await;

        assert!(started.elapsed() >= Duration::from_secs(5 + 8));
        assert_eq!(expander.call_count(), 2);
        assert_eq!(board.job("a").await.unwrap().description, "one");
        assert_eq!(board.job("b").await.unwrap().description, "two");
        assert!(board.job("c").await.unwrap().expanded_description.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_preload_stops_when_generation_advances() {
        let expander = Arc::new(MockExpander::new().then_succeed("one"));
        let board = board_with(expander.clone(), None);
        let generation = load(&board, vec![short_job("a")]).await;
        load(&board, vec![short_job("a")]).await;

        Arc::clone(&board).preload(generation, PreloadPolicy::default()).await;
        assert_eq!(expander.call_count(), 0);
    }

    #[tokio::test]
    async fn test_view_applies_facets_and_sort() {
        use crate::models::job::Category;

        let board = board_with(Arc::new(MockExpander::new()), None);
        let mut video = short_job("video");
        video.detected_categories = vec![Category::AiVideo];
        let plain = short_job("plain");
        load(&board, vec![plain, video]).await;

        let (_, all) = board.view(&FacetFilter::default(), SortStrategy::Smart).await;
        assert_eq!(all[0].id, "video");

        let facets = FacetFilter {
            categories: vec![Category::AiVideo],
            ..Default::default()
        };
        let (_, only_video) = board.view(&facets, SortStrategy::Recent).await;
        assert_eq!(only_video.len(), 1);
    }

    #[tokio::test]
    async fn test_close_detail_returns_to_inline() {
        let board = board_with(Arc::new(MockExpander::new()), None);
        let mut long = job("a", "Editor");
        long.description = "word ".repeat(400);
        load(&board, vec![long]).await;

        board.select_job("a", ViewMode::FullScreen).await.unwrap();
        let selection = board.close_detail().await;
        assert_eq!(selection.view_mode, ViewMode::Inline);
        assert_eq!(selection.active_job_id.as_deref(), Some("a"));
    }
}
