//! Common test setup functions.

use api::middleware::rate_limit::RateLimitConfig;
use api::{router, state::AppState};
use axum::Router;
use axum_test::TestServer;
use collector_core::FreshnessPolicy;
use sqlite_store::{count_events_for_session, count_reports, SqliteStore};
use std::sync::Arc;
use telemetry::health;
use worker::{ReportGenerator, Summarizer};

use crate::mocks::MockSummarizer;

/// Test context over a private in-memory database.
///
/// Uses the real Axum router with all middleware and the real report
/// generator. The summarizer, when present, is a `MockSummarizer`.
pub struct TestContext {
    pub store: SqliteStore,
    pub reports: Arc<ReportGenerator>,
    pub summarizer: Option<MockSummarizer>,
    pub router: Router,
}

/// Builder for non-default contexts.
pub struct TestContextBuilder {
    summarizer: Option<MockSummarizer>,
    policy: FreshnessPolicy,
    rate_limit: RateLimitConfig,
}

impl TestContextBuilder {
    pub fn summarizer(mut self, summarizer: MockSummarizer) -> Self {
        self.summarizer = Some(summarizer);
        self
    }

    pub fn freshness_minutes(mut self, minutes: i64) -> Self {
        self.policy = FreshnessPolicy::from_minutes(minutes).expect("freshness out of range");
        self
    }

    pub fn rate_limit(mut self, rate: u32, burst: u32) -> Self {
        self.rate_limit = RateLimitConfig {
            rate,
            burst,
            ..RateLimitConfig::default()
        };
        self
    }

    pub async fn build(self) -> TestContext {
        let store = SqliteStore::in_memory()
            .await
            .expect("Failed to open in-memory store");
        health().database.set_healthy();

        let summarizer = self
            .summarizer
            .clone()
            .map(|mock| Arc::new(mock) as Arc<dyn Summarizer>);
        let reports = Arc::new(
            ReportGenerator::new(store.clone(), self.policy).with_summarizer(summarizer),
        );

        let state = AppState::with_rate_limit(store.clone(), reports.clone(), self.rate_limit);

        TestContext {
            store,
            reports,
            summarizer: self.summarizer,
            router: router(state),
        }
    }
}

impl TestContext {
    /// Default context: no summarizer, 5 minute freshness.
    pub async fn new() -> Self {
        Self::builder().build().await
    }

    pub fn builder() -> TestContextBuilder {
        TestContextBuilder {
            summarizer: None,
            policy: FreshnessPolicy::default(),
            rate_limit: RateLimitConfig::default(),
        }
    }

    pub fn server(&self) -> TestServer {
        TestServer::new(self.router.clone()).expect("Failed to create test server")
    }

    /// Rows stored for one session.
    pub async fn event_count(&self, session_id: &str) -> u64 {
        count_events_for_session(&self.store, session_id)
            .await
            .expect("Failed to count events")
    }

    pub async fn report_count(&self) -> u64 {
        count_reports(&self.store)
            .await
            .expect("Failed to count reports")
    }
}
