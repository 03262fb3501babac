//! Adzuna search API client.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::{JobProvider, ProviderError, ProviderQuery, RawProviderRecord};

const ADZUNA_API_URL: &str = "https://api.adzuna.com/v1/api/jobs";
const DEFAULT_RESULTS_PER_PAGE: u32 = 100;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdzunaCompany {
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdzunaLocation {
    pub display_name: Option<String>,
}

/// A single Adzuna result. Every field is optional upstream.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdzunaJob {
    pub id: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub created: Option<String>,
    pub redirect_url: Option<String>,
    pub salary_min: Option<f64>,
    pub salary_max: Option<f64>,
    pub contract_type: Option<String>,
    pub contract_time: Option<String>,
    pub company: Option<AdzunaCompany>,
    pub location: Option<AdzunaLocation>,
}

#[derive(Debug, Deserialize)]
struct AdzunaResponse {
    #[serde(default)]
    results: Vec<AdzunaJob>,
}

#[derive(Clone)]
pub struct AdzunaClient {
    client: Client,
    app_id: String,
    app_key: String,
}

impl AdzunaClient {
    pub fn new(app_id: String, app_key: String, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build Adzuna HTTP client")?;
        Ok(Self {
            client,
            app_id,
            app_key,
        })
    }
}

#[async_trait]
impl JobProvider for AdzunaClient {
    fn name(&self) -> &'static str {
        "adzuna"
    }

    async fn fetch(&self, query: &ProviderQuery) -> Result<Vec<RawProviderRecord>, ProviderError> {
        let url = format!("{ADZUNA_API_URL}/{}/search/{}", query.location, query.page);
        let results_per_page = query
            .results_per_page
            .unwrap_or(DEFAULT_RESULTS_PER_PAGE)
            .to_string();

        let mut params: Vec<(&str, &str)> = vec![
            ("app_id", self.app_id.as_str()),
            ("app_key", self.app_key.as_str()),
            ("results_per_page", results_per_page.as_str()),
            ("content-type", "application/json"),
        ];
        if let Some(search) = query.search.as_deref() {
            params.push(("what", search));
        }

        let response = self.client.get(&url).query(&params).send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let body: AdzunaResponse = response.json().await?;
        debug!("Adzuna returned {} results", body.results.len());

        Ok(body
            .results
            .into_iter()
            .map(RawProviderRecord::Adzuna)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adzuna_response_deserializes_nested_names() {
        let json = r#"{
            "count": 1,
            "results": [{
                "id": "4455",
                "title": "Video Editor",
                "description": "Cut short-form video.",
                "created": "2026-10-01T09:30:00Z",
                "redirect_url": "https://adzuna.example/4455",
                "salary_min": 40000,
                "salary_max": 52000.5,
                "contract_type": "permanent",
                "company": {"display_name": "Studio North"},
                "location": {"display_name": "Austin, Texas", "area": ["US", "Texas"]}
            }]
        }"#;

        let parsed: AdzunaResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.results.len(), 1);
        let job = &parsed.results[0];
        assert_eq!(job.id.as_deref(), Some("4455"));
        assert_eq!(
            job.company.as_ref().and_then(|c| c.display_name.as_deref()),
            Some("Studio North")
        );
        assert_eq!(job.salary_max, Some(52000.5));
    }

    #[test]
    fn test_adzuna_response_tolerates_missing_results() {
        let parsed: AdzunaResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.results.is_empty());
    }
}
