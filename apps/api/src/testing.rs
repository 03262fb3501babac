//! Test doubles shared by the unit tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Barrier;
use uuid::Uuid;

use crate::config::Config;
use crate::discovery::enrichment::{
    DescriptionExpander, EnrichmentError, EnrichmentService, ExpansionRequest, RetryPolicy,
};
use crate::discovery::gateway::ProviderGateway;
use crate::discovery::pipeline::DiscoveryPipeline;
use crate::discovery::providers::{
    AdzunaJob, JobProvider, JoobleJob, ProviderError, ProviderQuery, RawProviderRecord,
};
use crate::discovery::providers::adzuna::AdzunaCompany;
use crate::discovery::saved::{InMemorySavedJobStore, SaveError, SavedJobStore};
use crate::discovery::sessions::SessionRegistry;
use crate::models::job::{Job, JobType, LocationType};
use crate::models::saved_job::{NewSavedJob, SavedJob};
use crate::state::AppState;

/// A classified job with a short, trigger-free description and no date.
pub fn job(id: &str, title: &str) -> Job {
    Job {
        id: id.to_string(),
        title: title.to_string(),
        company: "Acme Studio".to_string(),
        description: "A short role description.".to_string(),
        location: "New York".to_string(),
        created: None,
        salary_min: None,
        salary_max: None,
        contract_type: String::new(),
        redirect_url: format!("https://jobs.example.com/{id}"),
        detected_categories: Vec::new(),
        detected_job_type: JobType::FullTime,
        detected_location_type: LocationType::OnSite,
        expanded_description: None,
    }
}

pub fn adzuna_record(id: &str, title: &str) -> RawProviderRecord {
    RawProviderRecord::Adzuna(AdzunaJob {
        id: Some(id.to_string()),
        title: Some(title.to_string()),
        description: Some("Join a small team.".to_string()),
        company: Some(AdzunaCompany {
            display_name: Some("Acme Studio".to_string()),
        }),
        ..AdzunaJob::default()
    })
}

pub fn jooble_record(id: &str, title: &str) -> RawProviderRecord {
    RawProviderRecord::Jooble(JoobleJob {
        id: Some(Value::String(id.to_string())),
        title: Some(title.to_string()),
        snippet: Some("Join a small team.".to_string()),
        company: Some("Northwind".to_string()),
        ..JoobleJob::default()
    })
}

/// Scripted provider that records every query it receives.
pub struct MockProvider {
    name: &'static str,
    records: Vec<RawProviderRecord>,
    failure: Option<u16>,
    delay: Option<Duration>,
    barrier: Option<Arc<Barrier>>,
    calls: Mutex<Vec<ProviderQuery>>,
}

impl MockProvider {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            records: Vec::new(),
            failure: None,
            delay: None,
            barrier: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_records(mut self, records: Vec<RawProviderRecord>) -> Self {
        self.records = records;
        self
    }

    pub fn failing(mut self, status: u16) -> Self {
        self.failure = Some(status);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Waits on `barrier` before answering.
    pub fn with_barrier(mut self, barrier: Arc<Barrier>) -> Self {
        self.barrier = Some(barrier);
        self
    }

    pub fn calls(&self) -> Vec<ProviderQuery> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl JobProvider for MockProvider {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn fetch(&self, query: &ProviderQuery) -> Result<Vec<RawProviderRecord>, ProviderError> {
        self.calls.lock().unwrap().push(query.clone());
        if let Some(barrier) = &self.barrier {
            barrier.wait().await;
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match self.failure {
            Some(status) => Err(ProviderError::Status {
                status,
                message: "mock failure".to_string(),
            }),
            None => Ok(self.records.clone()),
        }
    }
}

/// Expander that replays a script of outcomes, one per call.
pub struct MockExpander {
    script: Mutex<VecDeque<Result<String, u16>>>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl MockExpander {
    pub fn new() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn then_fail(self, status: u16) -> Self {
        self.script.lock().unwrap().push_back(Err(status));
        self
    }

    pub fn then_succeed(self, text: &str) -> Self {
        self.script.lock().unwrap().push_back(Ok(text.to_string()));
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DescriptionExpander for MockExpander {
    async fn expand(&self, _request: &ExpansionRequest) -> Result<String, EnrichmentError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(Ok(text)) => Ok(text),
            Some(Err(status)) => Err(EnrichmentError::Upstream {
                status,
                message: "mock failure".to_string(),
            }),
            None => Err(EnrichmentError::Upstream {
                status: 400,
                message: "script exhausted".to_string(),
            }),
        }
    }
}

/// In-memory store that counts writes and can be told to fail them.
#[derive(Default)]
pub struct MockSavedJobStore {
    inner: InMemorySavedJobStore,
    fail_writes: AtomicBool,
    writes: AtomicUsize,
}

impl MockSavedJobStore {
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn write_attempt(&self) -> Result<(), SaveError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(SaveError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}

#[async_trait]
impl SavedJobStore for MockSavedJobStore {
    async fn find(&self, user_email: &str, job_id: Option<&str>) -> Result<Vec<SavedJob>, SaveError> {
        self.inner.find(user_email, job_id).await
    }

    async fn create(&self, new: NewSavedJob) -> Result<SavedJob, SaveError> {
        self.write_attempt()?;
        self.inner.create(new).await
    }

    async fn delete(&self, id: Uuid) -> Result<(), SaveError> {
        self.write_attempt()?;
        self.inner.delete(id).await
    }
}

pub fn test_config() -> Config {
    Config {
        database_url: None,
        anthropic_api_key: "test-key".to_string(),
        adzuna: None,
        jooble_api_key: None,
        results_per_page: 100,
        provider_timeout: Duration::from_secs(5),
        signup_url: "/CreatorSignup".to_string(),
        enrichment_preload: false,
        session_idle_ttl: Duration::from_secs(1800),
        session_sweep_interval: Duration::from_secs(60),
        port: 0,
        rust_log: "debug".to_string(),
    }
}

/// Full application state wired to mocks, preloading off.
pub fn app_state(
    providers: Vec<Arc<dyn JobProvider>>,
    expander: Arc<MockExpander>,
    store: Arc<MockSavedJobStore>,
) -> AppState {
    let config = test_config();
    let pipeline = DiscoveryPipeline::new(
        ProviderGateway::new(providers, config.provider_timeout),
        config.results_per_page,
    );
    let enrichment = EnrichmentService::new(expander, RetryPolicy::default());
    AppState {
        config,
        pipeline: Arc::new(pipeline),
        sessions: Arc::new(SessionRegistry::new(enrichment, None)),
        saved_store: store,
    }
}
