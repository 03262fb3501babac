//! Upstream job-search providers.
//!
//! Every provider implements [`JobProvider`] and returns its own raw record
//! shape wrapped in [`RawProviderRecord`]. Raw records never travel past the
//! normalizer.

use async_trait::async_trait;
use thiserror::Error;

pub mod adzuna;
pub mod jooble;

pub use adzuna::{AdzunaClient, AdzunaJob};
pub use jooble::{JoobleClient, JoobleJob};

/// Countries offered by the location picker, as (code, name) pairs.
pub const COUNTRIES: &[(&str, &str)] = &[
    ("us", "United States"),
    ("gb", "United Kingdom"),
    ("ca", "Canada"),
    ("au", "Australia"),
    ("de", "Germany"),
    ("fr", "France"),
];

pub const DEFAULT_COUNTRY: &str = "us";

/// Resolves a country code to its display name. Unknown codes fall back to
/// the United States, matching the default location.
pub fn country_name(code: &str) -> &'static str {
    COUNTRIES
        .iter()
        .find(|(c, _)| c.eq_ignore_ascii_case(code))
        .map(|(_, name)| *name)
        .unwrap_or("United States")
}

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("provider returned status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("provider timed out after {0:?}")]
    Timeout(std::time::Duration),
}

/// One search request as every provider sees it.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderQuery {
    /// `None` means "no keywords"; blank input is normalized to `None`.
    pub search: Option<String>,
    /// Country code, e.g. `us`.
    pub location: String,
    pub page: u32,
    pub results_per_page: Option<u32>,
}

impl ProviderQuery {
    pub fn new(search: Option<&str>, location: Option<&str>, page: Option<u32>) -> Self {
        let search = search
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        let location = location
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_COUNTRY)
            .to_lowercase();
        Self {
            search,
            location,
            page: page.unwrap_or(1).max(1),
            results_per_page: None,
        }
    }

    pub fn with_results_per_page(mut self, results_per_page: u32) -> Self {
        self.results_per_page = Some(results_per_page);
        self
    }
}

/// Provider-specific payloads, one variant per provider shape.
#[derive(Debug, Clone)]
pub enum RawProviderRecord {
    Adzuna(AdzunaJob),
    Jooble(JoobleJob),
}

#[async_trait]
pub trait JobProvider: Send + Sync {
    /// Short, stable slug used in logs and as the job id prefix.
    fn name(&self) -> &'static str;

    async fn fetch(&self, query: &ProviderQuery) -> Result<Vec<RawProviderRecord>, ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_country_name_known_codes() {
        assert_eq!(country_name("gb"), "United Kingdom");
        assert_eq!(country_name("DE"), "Germany");
    }

    #[test]
    fn test_country_name_unknown_falls_back_to_us() {
        assert_eq!(country_name("zz"), "United States");
    }

    #[test]
    fn test_query_blank_search_becomes_none() {
        let query = ProviderQuery::new(Some("   "), None, None);
        assert_eq!(query.search, None);
        assert_eq!(query.location, "us");
        assert_eq!(query.page, 1);
    }

    #[test]
    fn test_query_page_is_at_least_one() {
        let query = ProviderQuery::new(Some("video editor"), Some("CA"), Some(0));
        assert_eq!(query.search.as_deref(), Some("video editor"));
        assert_eq!(query.location, "ca");
        assert_eq!(query.page, 1);
    }
}
