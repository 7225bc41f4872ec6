//! Analytics collector
//!
//! Minimal web analytics backend:
//! - Session and event ingestion over HTTP into SQLite
//! - Aggregate reports, cached by freshness and optionally summarized by an LLM
//! - Background refresh so a current report is always available

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info, warn};

use api::middleware::rate_limit::RateLimitConfig;
use api::{router, AppState};
use sqlite_store::{SqliteConfig, SqliteStore};
use telemetry::{health, init_tracing_from_env};
use worker::{ReportConfig, ReportGenerator, ReportScheduler, SummarizerConfig};

/// Application configuration.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct Config {
    #[serde(default = "default_host")]
    host: String,
    #[serde(default = "default_port")]
    port: u16,

    #[serde(default)]
    database: SqliteConfig,

    #[serde(default)]
    report: ReportConfig,

    #[serde(default)]
    summarizer: SummarizerConfig,

    #[serde(default)]
    rate_limit: RateLimitConfig,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            database: SqliteConfig::default(),
            report: ReportConfig::default(),
            summarizer: SummarizerConfig::default(),
            rate_limit: RateLimitConfig::default(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    init_tracing_from_env();

    info!("Starting analytics collector v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config()?;
    info!(
        database = %config.database.url,
        freshness_minutes = config.report.freshness_minutes,
        summarizer = config.summarizer.enabled,
        "Loaded configuration"
    );

    let store = SqliteStore::connect(config.database.clone())
        .await
        .context("Failed to open database")?;
    sqlite_store::health::init_schema(&store)
        .await
        .context("Failed to initialize database schema")?;

    check_health(&store).await;

    let summarizer = config
        .summarizer
        .build()
        .context("Failed to configure summarizer")?;
    if summarizer.is_some() {
        info!(model = %config.summarizer.model, "Report summarization enabled");
    } else {
        health().summarizer.set_healthy_with("disabled");
        info!("Report summarization disabled; reports carry the raw aggregate");
    }

    let policy = config
        .report
        .freshness_policy()
        .context("Invalid report.freshness_minutes")?;
    let generator =
        Arc::new(ReportGenerator::new(store.clone(), policy).with_summarizer(summarizer));

    let _scheduler = match config.report.refresh_interval() {
        Some(interval) => Some(ReportScheduler::new(generator.clone(), interval).start()),
        None => {
            warn!("Background report refresh disabled");
            None
        }
    };

    let state = AppState::with_rate_limit(store.clone(), generator, config.rate_limit.clone());

    let _rate_limiter_cleanup = state.start_rate_limiter_cleanup();
    info!("Started rate limiter cleanup task (every 5 minutes)");

    let app = router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("Invalid server address")?;

    info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("Server error")?;

    info!("Shutting down...");
    store.close().await;
    info!("Shutdown complete");
    Ok(())
}

/// Load configuration from defaults, `config/default.toml` and the environment.
fn load_config() -> Result<Config> {
    let config = config::Config::builder()
        .add_source(config::Config::try_from(&Config::default())?)
        .add_source(
            config::File::with_name("config/default")
                .required(false)
                .format(config::FileFormat::Toml),
        )
        .add_source(
            config::Environment::default()
                .separator("__")
                .prefix("COLLECTOR")
                .try_parsing(true),
        )
        .build()
        .context("Failed to build configuration")?;

    let mut config: Config = config
        .try_deserialize()
        .context("Failed to deserialize configuration")?;

    apply_env_overrides(&mut config, |name| std::env::var(name).ok())?;
    validate_config(&config)?;
    Ok(config)
}

/// Reject values that parse but cannot be used.
fn validate_config(config: &Config) -> Result<()> {
    config
        .report
        .freshness_policy()
        .context("Invalid report.freshness_minutes")?;
    Ok(())
}

/// Flat overrides for nested keys whose names contain underscores, which the
/// `__`-separated environment source cannot address reliably.
fn apply_env_overrides(config: &mut Config, var: impl Fn(&str) -> Option<String>) -> Result<()> {
    if let Some(url) = var("COLLECTOR_DATABASE_URL") {
        config.database.url = url;
    }
    if let Some(key) = var("COLLECTOR_SUMMARIZER_API_KEY") {
        config.summarizer.api_key = Some(key);
        config.summarizer.enabled = true;
    }
    if let Some(base_url) = var("COLLECTOR_SUMMARIZER_BASE_URL") {
        config.summarizer.base_url = base_url;
    }
    if let Some(minutes) = var("COLLECTOR_REPORT_FRESHNESS_MINUTES") {
        config.report.freshness_minutes = minutes
            .trim()
            .parse()
            .context("COLLECTOR_REPORT_FRESHNESS_MINUTES must be an integer")?;
    }
    Ok(())
}

/// Check component health on startup.
async fn check_health(store: &SqliteStore) {
    if sqlite_store::health::check_connection(store).await {
        health().database.set_healthy();
        info!("Database connection: healthy");
    } else {
        health().database.set_unhealthy("Connection failed");
        error!("Database connection: unhealthy");
    }
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        }
        _ = terminate => {
            info!("Received terminate signal");
        }
    }
}
