//! Jooble search API client.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::{country_name, JobProvider, ProviderError, ProviderQuery, RawProviderRecord};

const JOOBLE_API_URL: &str = "https://jooble.org/api";

/// A single Jooble result. Jooble sends `id` as a number or a string
/// depending on the endpoint, so it is kept as raw JSON here.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JoobleJob {
    pub id: Option<Value>,
    pub title: Option<String>,
    pub location: Option<String>,
    pub snippet: Option<String>,
    pub salary: Option<String>,
    #[serde(rename = "type")]
    pub job_type: Option<String>,
    pub link: Option<String>,
    pub company: Option<String>,
    pub updated: Option<String>,
}

#[derive(Debug, Serialize)]
struct JoobleRequest<'a> {
    keywords: &'a str,
    location: &'a str,
    page: String,
}

#[derive(Debug, Deserialize)]
struct JoobleResponse {
    #[serde(default)]
    jobs: Vec<JoobleJob>,
}

#[derive(Clone)]
pub struct JoobleClient {
    client: Client,
    api_key: String,
}

impl JoobleClient {
    pub fn new(api_key: String, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build Jooble HTTP client")?;
        Ok(Self { client, api_key })
    }
}

#[async_trait]
impl JobProvider for JoobleClient {
    fn name(&self) -> &'static str {
        "jooble"
    }

    async fn fetch(&self, query: &ProviderQuery) -> Result<Vec<RawProviderRecord>, ProviderError> {
        // Jooble wants a place name rather than a country code.
        let request = JoobleRequest {
            keywords: query.search.as_deref().unwrap_or(""),
            location: country_name(&query.location),
            page: query.page.to_string(),
        };

        let response = self
            .client
            .post(format!("{JOOBLE_API_URL}/{}", self.api_key))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let body: JoobleResponse = response.json().await?;
        debug!("Jooble returned {} results", body.jobs.len());

        Ok(body.jobs.into_iter().map(RawProviderRecord::Jooble).collect())
    }
}
