//! Background report refresh.

use collector_core::FreshnessPolicy;
use serde::{Deserialize, Serialize};
use sqlite_store::health::check_connection;
use std::sync::Arc;
use std::time::Duration;
use telemetry::{health, metrics};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info};

use crate::report::{ReportGenerator, ReportOutcome};

/// Report section of the service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Maximum age before the latest report is regenerated
    #[serde(default = "default_freshness_minutes")]
    pub freshness_minutes: i64,
    /// Background refresh period; 0 disables the scheduler
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,
}

fn default_freshness_minutes() -> i64 {
    collector_core::DEFAULT_FRESHNESS_MINUTES
}

fn default_refresh_interval_secs() -> u64 {
    300
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            freshness_minutes: default_freshness_minutes(),
            refresh_interval_secs: default_refresh_interval_secs(),
        }
    }
}

impl ReportConfig {
    pub fn freshness_policy(&self) -> collector_core::Result<FreshnessPolicy> {
        FreshnessPolicy::from_minutes(self.freshness_minutes)
    }

    pub fn refresh_interval(&self) -> Option<Duration> {
        (self.refresh_interval_secs > 0).then(|| Duration::from_secs(self.refresh_interval_secs))
    }
}

/// Keeps a fresh report around without client traffic.
pub struct ReportScheduler {
    generator: Arc<ReportGenerator>,
    interval: Duration,
}

impl ReportScheduler {
    pub fn new(generator: Arc<ReportGenerator>, interval: Duration) -> Self {
        Self { generator, interval }
    }

    /// Spawn the refresh loop. The first tick runs immediately.
    pub fn start(self) -> tokio::task::JoinHandle<()> {
        info!(interval_secs = self.interval.as_secs(), "Report scheduler started");
        tokio::spawn(async move {
            let mut ticker = interval(self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                self.run_once().await;
            }
        })
    }

    /// One tick: probe the database, refresh the report if stale, log metrics.
    ///
    /// Errors are logged; the loop keeps going.
    pub async fn run_once(&self) -> Option<ReportOutcome> {
        if check_connection(self.generator.store()).await {
            health().database.set_healthy();
        } else {
            health().database.set_unhealthy("SQLite connection check failed");
        }

        let outcome = match self.generator.refresh_if_stale().await {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                error!(error = %e, "Scheduled report refresh failed");
                None
            }
        };

        metrics().snapshot().log();
        outcome
    }
}
