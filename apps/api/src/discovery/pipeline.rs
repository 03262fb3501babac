//! One search, end to end: gateway fan-out, normalization, classification,
//! merge, exclusion policy and sort.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::discovery::classifier::{self, ClassificationRules, DEFAULT_RULES};
use crate::discovery::filters::apply_exclusion_policy;
use crate::discovery::gateway::ProviderGateway;
use crate::discovery::normalizer::normalize;
use crate::discovery::providers::ProviderQuery;
use crate::discovery::sorting::SortStrategy;
use crate::models::job::Job;

pub struct DiscoveryPipeline {
    gateway: ProviderGateway,
    rules: &'static ClassificationRules,
    results_per_page: u32,
}

impl DiscoveryPipeline {
    pub fn new(gateway: ProviderGateway, results_per_page: u32) -> Self {
        Self {
            gateway,
            rules: &DEFAULT_RULES,
            results_per_page,
        }
    }

    pub fn provider_count(&self) -> usize {
        self.gateway.provider_count()
    }

    /// Runs a search. Provider failures reduce the result set but never fail
    /// the search; an empty result is a valid outcome.
    pub async fn search(&self, query: &ProviderQuery, sort: SortStrategy, now: DateTime<Utc>) -> Vec<Job> {
        let query = query.clone().with_results_per_page(self.results_per_page);
        let batches = self.gateway.fetch_all(&query).await;

        let mut seen = HashSet::new();
        let mut merged = Vec::new();
        for batch in batches {
            for record in batch.records {
                let job = classifier::apply(self.rules, normalize(record));
                if seen.insert(job.id.clone()) {
                    merged.push(job);
                } else {
                    debug!(provider = batch.provider, job_id = %job.id, "Dropping duplicate job id");
                }
            }
        }

        let fetched = merged.len();
        let mut jobs = apply_exclusion_policy(merged, now);
        sort.sort(&mut jobs);

        info!(
            search = query.search.as_deref().unwrap_or(""),
            location = %query.location,
            fetched,
            kept = jobs.len(),
            ?sort,
            "Search completed"
        );
        jobs
    }
}
