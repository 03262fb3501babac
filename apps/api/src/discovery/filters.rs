//! Filter & exclusion policy for the merged, classified result set, plus the
//! user-selected facet filter applied when viewing it.

use chrono::{DateTime, Months, Utc};
use serde::Deserialize;

use crate::models::job::{Category, Job, JobType, LocationType};

const EXCLUDED_KEYWORDS: &[&str] = &["engineer", "engineering"];

/// Cutoff for the staleness filter: one calendar month before `now`.
/// Day overflow clamps to the end of the shorter month (Mar 31 → Feb 28).
pub fn staleness_cutoff(now: DateTime<Utc>) -> DateTime<Utc> {
    now.checked_sub_months(Months::new(1)).unwrap_or(now)
}

pub fn is_stale(job: &Job, cutoff: DateTime<Utc>) -> bool {
    job.created.is_some_and(|created| created < cutoff)
}

/// Unconditional keyword exclusion on title or description. Category tags
/// (including Technical) are not consulted.
pub fn is_excluded(job: &Job) -> bool {
    let title = job.title.to_lowercase();
    let description = job.description.to_lowercase();
    EXCLUDED_KEYWORDS
        .iter()
        .any(|kw| title.contains(kw) || description.contains(kw))
}

/// Drops stale jobs, then excluded jobs. Order of survivors is preserved.
pub fn apply_exclusion_policy(jobs: Vec<Job>, now: DateTime<Utc>) -> Vec<Job> {
    let cutoff = staleness_cutoff(now);
    jobs.into_iter()
        .filter(|job| !is_stale(job, cutoff))
        .filter(|job| !is_excluded(job))
        .collect()
}

/// Facets chosen in the UI. An empty facet list places no constraint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FacetFilter {
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub job_types: Vec<JobType>,
    #[serde(default)]
    pub location_types: Vec<LocationType>,
}

impl FacetFilter {
    pub fn matches(&self, job: &Job) -> bool {
        let category_ok = self.categories.is_empty()
            || self.categories.iter().any(|c| job.has_category(*c));
        let job_type_ok =
            self.job_types.is_empty() || self.job_types.contains(&job.detected_job_type);
        let location_ok = self.location_types.is_empty()
            || self.location_types.contains(&job.detected_location_type);

        category_ok && job_type_ok && location_ok
    }

    pub fn apply<'a>(&self, jobs: &'a [Job]) -> Vec<&'a Job> {
        jobs.iter().filter(|job| self.matches(job)).collect()
    }
}
