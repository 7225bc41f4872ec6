//! Report generation and the freshness cache.

use collector_core::{
    build_prompt, extract_summary, now, FreshnessPolicy, Report, ReportAggregate, Result,
};
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlite_store::{insert_report, latest_report, load_sessions_with_events, SqliteStore};
use std::sync::Arc;
use std::time::Instant;
use telemetry::{health, metrics};
use tracing::{debug, info, warn};

use crate::summarizer::Summarizer;

/// How `latest` obtained the report it returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportOutcome {
    /// No report existed; this is the first
    Created,
    /// The latest report was stale and was replaced
    Regenerated,
    /// The latest report was fresh and returned unchanged
    Cached,
}

/// Builds, persists and serves reports.
///
/// Concurrent callers that both see a stale report both regenerate; each
/// writes its own row and the newest wins on the next read.
pub struct ReportGenerator {
    store: SqliteStore,
    summarizer: Option<Arc<dyn Summarizer>>,
    policy: FreshnessPolicy,
}

impl ReportGenerator {
    pub fn new(store: SqliteStore, policy: FreshnessPolicy) -> Self {
        Self {
            store,
            summarizer: None,
            policy,
        }
    }

    pub fn with_summarizer(mut self, summarizer: Option<Arc<dyn Summarizer>>) -> Self {
        self.summarizer = summarizer;
        self
    }

    pub fn policy(&self) -> FreshnessPolicy {
        self.policy
    }

    pub fn store(&self) -> &SqliteStore {
        &self.store
    }

    /// Aggregate every session, optionally summarize, and persist a new report.
    pub async fn generate(&self) -> Result<Report> {
        let start = Instant::now();

        let sessions = load_sessions_with_events(&self.store).await?;
        let aggregate = ReportAggregate::build(sessions);
        debug!(
            sessions = aggregate.total_sessions,
            events = aggregate.total_events,
            "Aggregated sessions for report"
        );

        let data = match &self.summarizer {
            Some(summarizer) => self.summarize(summarizer.as_ref(), &aggregate).await,
            None => Some(serde_json::to_value(&aggregate)?),
        };

        let report = Report::new(data);
        insert_report(&self.store, &report).await?;

        let elapsed = start.elapsed();
        metrics().reports_generated.inc();
        metrics().report_latency_ms.observe(elapsed.as_millis() as u64);
        info!(
            report_id = %report.id,
            sessions = aggregate.total_sessions,
            events = aggregate.total_events,
            summarized = report.data.is_some() && self.summarizer.is_some(),
            elapsed_ms = elapsed.as_millis(),
            "Generated report"
        );

        Ok(report)
    }

    /// Never fails: any problem yields `None` and is logged.
    async fn summarize(&self, summarizer: &dyn Summarizer, aggregate: &ReportAggregate) -> Option<Value> {
        let prompt = match build_prompt(aggregate) {
            Ok(prompt) => prompt,
            Err(e) => {
                warn!(error = %e, "Failed to build summary prompt");
                metrics().summaries_failed.inc();
                return None;
            }
        };

        let text = match summarizer.summarize(&prompt).await {
            Ok(text) => {
                health().summarizer.set_healthy();
                text
            }
            Err(e) => {
                warn!(error = %e, "Summarizer call failed; storing report without payload");
                health().summarizer.set_unhealthy(e.to_string());
                metrics().summaries_failed.inc();
                return None;
            }
        };

        let summary = extract_summary(&text, summarizer.format());
        if summary.is_none() {
            warn!(
                format = ?summarizer.format(),
                response_len = text.len(),
                "Summarizer response had no usable JSON; storing report without payload"
            );
            metrics().summaries_failed.inc();
        }
        summary
    }

    /// Return the latest report, generating one if none exists or it is stale.
    pub async fn latest(&self) -> Result<(Report, ReportOutcome)> {
        self.latest_at(now()).await
    }

    /// `latest` with an explicit clock.
    pub async fn latest_at(&self, now: DateTime<Utc>) -> Result<(Report, ReportOutcome)> {
        match latest_report(&self.store).await? {
            None => {
                info!("No report yet; generating the first one");
                Ok((self.generate().await?, ReportOutcome::Created))
            }
            Some(report) if self.policy.is_stale(&report, now) => {
                info!(
                    report_id = %report.id,
                    age_secs = report.age(now).num_seconds(),
                    "Latest report is stale; regenerating"
                );
                Ok((self.generate().await?, ReportOutcome::Regenerated))
            }
            Some(report) => {
                debug!(report_id = %report.id, "Serving cached report");
                Ok((report, ReportOutcome::Cached))
            }
        }
    }

    /// Regenerate only if needed.
    pub async fn refresh_if_stale(&self) -> Result<ReportOutcome> {
        self.latest().await.map(|(_, outcome)| outcome)
    }
}
