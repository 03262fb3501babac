//! Provider Gateway: concurrent, fault-isolated fan-out to every provider.
//!
//! All provider calls are dispatched before any is awaited. A failing
//! provider is logged and contributes an empty list; it never aborts the
//! others. The gateway resolves only once every call has settled.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tracing::{info, warn};

use crate::discovery::providers::{JobProvider, ProviderError, ProviderQuery, RawProviderRecord};

/// Raw records from one provider, tagged with the provider that produced them.
#[derive(Debug)]
pub struct ProviderBatch {
    pub provider: &'static str,
    pub records: Vec<RawProviderRecord>,
}

pub struct ProviderGateway {
    providers: Vec<Arc<dyn JobProvider>>,
    timeout: Duration,
}

impl ProviderGateway {
    pub fn new(providers: Vec<Arc<dyn JobProvider>>, timeout: Duration) -> Self {
        Self { providers, timeout }
    }

    pub fn provider_count(&self) -> usize {
        self.providers.len()
    }

    /// Returns one batch per configured provider, in configuration order.
    pub async fn fetch_all(&self, query: &ProviderQuery) -> Vec<ProviderBatch> {
        let calls = self
            .providers
            .iter()
            .map(|provider| self.fetch_isolated(provider.as_ref(), query));

        join_all(calls).await
    }

    async fn fetch_isolated(&self, provider: &dyn JobProvider, query: &ProviderQuery) -> ProviderBatch {
        let result = match tokio::time::timeout(self.timeout, provider.fetch(query)).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout(self.timeout)),
        };

        let records = match result {
            Ok(records) => {
                info!(provider = provider.name(), count = records.len(), "Provider fetch succeeded");
                records
            }
            Err(e) => {
                warn!(provider = provider.name(), error = %e, "Provider fetch failed, substituting empty result");
                Vec::new()
            }
        };

        ProviderBatch {
            provider: provider.name(),
            records,
        }
    }
}
