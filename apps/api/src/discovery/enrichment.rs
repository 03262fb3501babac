//! Enrichment Service: expands short job descriptions through an upstream
//! generator, with bounded retry and exponential backoff.
//!
//! Retry rule: only HTTP 429 and 500 are retried, at most `MAX_RETRIES`
//! times. The delay before retry `n` (0-based) is `2^(n+2) * 2000ms`, i.e.
//! 8s, 16s, 32s. Anything else, or exhausting the retries, is terminal and
//! the caller degrades silently to the original job.
//!
//! At-most-once semantics per job id live in `discovery::board`; this module
//! only knows how to run one expansion with retries.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::discovery::prompts::{EXPAND_DESCRIPTION_PROMPT_TEMPLATE, EXPAND_DESCRIPTION_SYSTEM};
use crate::llm_client::prompts::{FIDELITY_INSTRUCTION, JSON_ONLY_SYSTEM};
use crate::llm_client::{LlmClient, LlmError};
use crate::models::job::{Job, JobType};

/// Descriptions with at least this many words are left alone.
pub const ENRICHMENT_WORD_THRESHOLD: usize = 300;
pub const MAX_RETRIES: u32 = 3;
const BACKOFF_BASE: Duration = Duration::from_millis(2000);
const MAX_BACKOFF: Duration = Duration::from_secs(300);
const RETRYABLE_STATUSES: &[u16] = &[429, 500];

#[derive(Debug, Error)]
pub enum EnrichmentError {
    #[error("expansion failed with status {status}: {message}")]
    Upstream { status: u16, message: String },

    #[error("expansion transport failure: {0}")]
    Transport(String),

    #[error("expansion returned an empty description")]
    Empty,
}

impl EnrichmentError {
    pub fn status(&self) -> Option<u16> {
        match self {
            EnrichmentError::Upstream { status, .. } => Some(*status),
            EnrichmentError::Transport(_) | EnrichmentError::Empty => None,
        }
    }
}

impl From<LlmError> for EnrichmentError {
    fn from(err: LlmError) -> Self {
        match err.status() {
            Some(status) => EnrichmentError::Upstream {
                status,
                message: err.to_string(),
            },
            None => EnrichmentError::Transport(err.to_string()),
        }
    }
}

/// Input to one expansion call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpansionRequest {
    pub title: String,
    pub company: String,
    pub description: String,
    pub location: String,
    pub job_type: JobType,
}

impl From<&Job> for ExpansionRequest {
    fn from(job: &Job) -> Self {
        Self {
            title: job.title.clone(),
            company: job.company.clone(),
            description: job.description.clone(),
            location: job.location.clone(),
            job_type: job.detected_job_type,
        }
    }
}

/// Produces a longer description for a job listing. One call, no retries.
#[async_trait]
pub trait DescriptionExpander: Send + Sync {
    async fn expand(&self, request: &ExpansionRequest) -> Result<String, EnrichmentError>;
}

#[derive(Debug, Deserialize)]
struct ExpansionResponse {
    expanded_description: String,
}

/// Expander backed by the shared LLM client.
pub struct LlmExpander {
    llm: LlmClient,
}

impl LlmExpander {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

fn build_expansion_prompt(request: &ExpansionRequest) -> String {
    fill_template(
        EXPAND_DESCRIPTION_PROMPT_TEMPLATE,
        &[
            ("fidelity_instruction", FIDELITY_INSTRUCTION),
            ("title", request.title.as_str()),
            ("company", request.company.as_str()),
            ("location", request.location.as_str()),
            ("job_type", request.job_type.label()),
            ("description", request.description.as_str()),
        ],
    )
}

/// Substitutes `{name}` placeholders in a single pass over the template, so
/// braces inside substituted values are never expanded. Unknown `{...}` text
/// is copied as is.
fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let substituted = after.find('}').and_then(|close| {
            let name = &after[..close];
            values
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (*value, close))
        });
        match substituted {
            Some((value, close)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

#[async_trait]
impl DescriptionExpander for LlmExpander {
    async fn expand(&self, request: &ExpansionRequest) -> Result<String, EnrichmentError> {
        let prompt = build_expansion_prompt(request);
        let system = format!("{EXPAND_DESCRIPTION_SYSTEM} {JSON_ONLY_SYSTEM}");

        let response: ExpansionResponse = self.llm.call_json(&prompt, &system).await?;
        Ok(response.expanded_description)
    }
}

/// Backoff-and-retry rule for expansion calls.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: MAX_RETRIES,
            base_delay: BACKOFF_BASE,
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `retry` (0-based): `2^(retry+2) * base`,
    /// saturating at `MAX_BACKOFF`.
    pub fn backoff(&self, retry: u32) -> Duration {
        retry
            .checked_add(2)
            .and_then(|exp| 2u32.checked_pow(exp))
            .and_then(|factor| self.base_delay.checked_mul(factor))
            .map_or(MAX_BACKOFF, |delay| delay.min(MAX_BACKOFF))
    }

    pub fn should_retry(&self, error: &EnrichmentError, retries_so_far: u32) -> bool {
        retries_so_far < self.max_retries
            && error
                .status()
                .is_some_and(|status| RETRYABLE_STATUSES.contains(&status))
    }
}

/// What happened during one expansion, including every backoff slept.
#[derive(Debug)]
pub struct ExpansionReport {
    pub result: Result<String, EnrichmentError>,
    pub attempts: u32,
    pub backoffs: Vec<Duration>,
}

#[derive(Clone)]
pub struct EnrichmentService {
    expander: Arc<dyn DescriptionExpander>,
    policy: RetryPolicy,
}

impl EnrichmentService {
    pub fn new(expander: Arc<dyn DescriptionExpander>, policy: RetryPolicy) -> Self {
        Self { expander, policy }
    }

    /// True when the job is short enough to expand and has not been expanded yet.
    pub fn is_eligible(job: &Job) -> bool {
        !job.is_enriched() && job.word_count() < ENRICHMENT_WORD_THRESHOLD
    }

    /// Runs one expansion with retries. Sleeps between attempts without
    /// blocking other tasks.
    pub async fn expand(&self, job: &Job) -> ExpansionReport {
        let request = ExpansionRequest::from(job);
        let mut retries = 0;
        let mut backoffs = Vec::new();

        loop {
            let result = match self.expander.expand(&request).await {
                Ok(text) if text.trim().is_empty() => Err(EnrichmentError::Empty),
                other => other,
            };

            match result {
                Ok(text) => {
                    info!(job_id = %job.id, attempts = retries + 1, "Job description expanded");
                    return ExpansionReport {
                        result: Ok(text),
                        attempts: retries + 1,
                        backoffs,
                    };
                }
                Err(e) if self.policy.should_retry(&e, retries) => {
                    let delay = self.policy.backoff(retries);
                    warn!(
                        job_id = %job.id,
                        error = %e,
                        "Expansion attempt {} failed, retrying after {}ms...",
                        retries + 1,
                        delay.as_millis()
                    );
                    tokio::time::sleep(delay).await;
                    backoffs.push(delay);
                    retries += 1;
                }
                Err(e) => {
                    warn!(job_id = %job.id, error = %e, "Expansion gave up, keeping original description");
                    return ExpansionReport {
                        result: Err(e),
                        attempts: retries + 1,
                        backoffs,
                    };
                }
            }
        }
    }
}

/// Writes a successful expansion into the job. The expanded text replaces
/// the visible description and is recorded as terminal.
pub fn apply_expansion(mut job: Job, expanded: String) -> Job {
    job.description = expanded.clone();
    job.expanded_description = Some(expanded);
    job
}
