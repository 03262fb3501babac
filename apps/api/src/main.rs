mod config;
mod db;
mod discovery;
mod errors;
mod llm_client;
mod models;
mod routes;
mod state;
#[cfg(test)]
mod testing;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_pool;
use crate::discovery::board::PreloadPolicy;
use crate::discovery::enrichment::{EnrichmentService, LlmExpander, RetryPolicy};
use crate::discovery::gateway::ProviderGateway;
use crate::discovery::pipeline::DiscoveryPipeline;
use crate::discovery::providers::{AdzunaClient, JobProvider, JoobleClient};
use crate::discovery::saved::{InMemorySavedJobStore, PgSavedJobStore, SavedJobStore};
use crate::discovery::sessions::SessionRegistry;
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("discovery_api={}", &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Discovery API v{}", env!("CARGO_PKG_VERSION"));

    // Job providers; each is enabled only when its credentials are present
    let providers = build_providers(&config)?;
    if providers.is_empty() {
        warn!("No job providers configured; every search will return no jobs");
    }
    let gateway = ProviderGateway::new(providers, config.provider_timeout);
    let pipeline = DiscoveryPipeline::new(gateway, config.results_per_page);

    // Enrichment goes through the shared LLM client
    let llm = LlmClient::new(config.anthropic_api_key.clone())?;
    info!("LLM client initialized (model: {})", llm_client::MODEL);
    let enrichment = EnrichmentService::new(Arc::new(LlmExpander::new(llm)), RetryPolicy::default());

    let preload = config.enrichment_preload.then(PreloadPolicy::default);
    if preload.is_some() {
        info!("Background description preloading enabled");
    }

    let saved_store: Arc<dyn SavedJobStore> = match &config.database_url {
        Some(url) => Arc::new(PgSavedJobStore::new(create_pool(url).await?)),
        None => {
            warn!("DATABASE_URL not set; saved jobs are kept in memory and lost on restart");
            Arc::new(InMemorySavedJobStore::default())
        }
    };

    let sessions = Arc::new(SessionRegistry::new(enrichment, preload));
    sessions.spawn_sweeper(config.session_idle_ttl, config.session_sweep_interval);
    info!(
        "Idle job boards dropped after {}s",
        config.session_idle_ttl.as_secs()
    );

    // Build app state
    let state = AppState {
        config: config.clone(),
        pipeline: Arc::new(pipeline),
        sessions,
        saved_store,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict CORS to the UI origin once it is configurable

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn build_providers(config: &Config) -> Result<Vec<Arc<dyn JobProvider>>> {
    let mut providers: Vec<Arc<dyn JobProvider>> = Vec::new();

    if let Some(adzuna) = &config.adzuna {
        providers.push(Arc::new(AdzunaClient::new(
            adzuna.app_id.clone(),
            adzuna.app_key.clone(),
            config.provider_timeout,
        )?));
        info!("Adzuna provider enabled");
    }
    if let Some(key) = &config.jooble_api_key {
        providers.push(Arc::new(JoobleClient::new(key.clone(), config.provider_timeout)?));
        info!("Jooble provider enabled");
    }

    Ok(providers)
}
