//! Application state shared across handlers.

use crate::middleware::rate_limit::{RateLimitConfig, RateLimiter, SharedRateLimiter};
use collector_core::error::AuthErrorCode;
use collector_core::{Error, ParsedApiKey, Result};
use moka::future::Cache;
use sqlite_store::{find_project_by_api_key, SqliteStore};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use worker::{ReportGenerator, UserAgentEnricher};

/// Cache TTL for API key lookups (30 seconds).
const PROJECT_CACHE_TTL: Duration = Duration::from_secs(30);

/// Maximum cache entries.
const PROJECT_CACHE_MAX_CAPACITY: u64 = 10_000;

/// Resolves API keys to project ids.
///
/// Hits are cached for 30 seconds. Misses are not cached, so a project is
/// usable as soon as it is created.
#[derive(Clone)]
pub struct ProjectResolver {
    store: SqliteStore,
    cache: Cache<String, String>,
}

impl ProjectResolver {
    pub fn new(store: SqliteStore) -> Self {
        Self {
            store,
            cache: Cache::builder()
                .max_capacity(PROJECT_CACHE_MAX_CAPACITY)
                .time_to_live(PROJECT_CACHE_TTL)
                .build(),
        }
    }

    /// Project id for a well-formed key. Unknown keys are `AUTH_003`.
    pub async fn resolve(&self, api_key: &ParsedApiKey) -> Result<String> {
        let cache_key = api_key.as_str().to_string();

        if let Some(project_id) = self.cache.get(&cache_key).await {
            debug!("Project key cache hit");
            return Ok(project_id);
        }

        match find_project_by_api_key(&self.store, api_key.as_str()).await? {
            Some(project) => {
                self.cache.insert(cache_key, project.id.clone()).await;
                Ok(project.id)
            }
            None => {
                warn!(env = api_key.env().as_str(), "Unknown API key");
                Err(Error::auth(AuthErrorCode::InvalidKey, "Invalid API key"))
            }
        }
    }
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub store: SqliteStore,
    /// Report generator and freshness cache
    pub reports: Arc<ReportGenerator>,
    pub projects: ProjectResolver,
    pub enricher: Arc<UserAgentEnricher>,
    pub rate_limiter: SharedRateLimiter,
}

impl AppState {
    pub fn new(store: SqliteStore, reports: Arc<ReportGenerator>) -> Self {
        Self::with_rate_limit(store, reports, RateLimitConfig::default())
    }

    /// Create with custom rate limit config.
    pub fn with_rate_limit(
        store: SqliteStore,
        reports: Arc<ReportGenerator>,
        rate_config: RateLimitConfig,
    ) -> Self {
        Self {
            projects: ProjectResolver::new(store.clone()),
            store,
            reports,
            enricher: Arc::new(UserAgentEnricher::new()),
            rate_limiter: Arc::new(RateLimiter::new(rate_config)),
        }
    }

    /// Start the rate limiter cleanup background task.
    pub fn start_rate_limiter_cleanup(&self) -> tokio::task::JoinHandle<()> {
        let rate_limiter = self.rate_limiter.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(300));
            loop {
                interval.tick().await;
                rate_limiter.cleanup(Duration::from_secs(600));
            }
        })
    }
}
