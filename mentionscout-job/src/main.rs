//! Mentionscout job runner
//!
//! One discovery run per invocation; scheduling is left to cron or similar.
//! Progress and failures land in the store's status location, so a run that
//! aborts still exits 0. Configuration errors exit non-zero before any call.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mentionscout::prelude::*;
use mentionscout::utils::today_utc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "mentionscout-job")]
#[command(about = "Find pages that mention a brand without linking to it")]
struct Cli {
    /// JSON configuration file; `MENTIONSCOUT_*` variables override it
    #[arg(long, env = "MENTIONSCOUT_CONFIG")]
    config: Option<PathBuf>,

    /// JSON store file holding queries, opportunities and run state
    #[arg(long, env = "MENTIONSCOUT_STORE", default_value = "mentionscout.json")]
    store: PathBuf,

    /// Emit logs as JSON lines
    #[arg(long, env = "MENTIONSCOUT_LOG_JSON")]
    log_json: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every query once (default)
    Run,

    /// Set the status of an active opportunity, archiving it if it leaves `New`
    Triage { url: String, status: String },

    /// Print today's search call count
    Quota,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let config = load_config(cli.config.as_deref())?;
    let store = Arc::new(
        JsonFileStore::open(&cli.store)
            .with_context(|| format!("Failed to open store {}", cli.store.display()))?,
    );

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run(config, store).await,
        Commands::Triage { url, status } => triage(&config, store.as_ref(), &url, &status).await,
        Commands::Quota => {
            let state = QuotaTracker::new(store).current().await;
            println!("{}", state.count_on(today_utc()));
            Ok(())
        }
    }
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,mentionscout=debug".into());

    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json).then(|| tracing_subscriber::fmt::layer().with_target(true)))
        .init();
}

fn load_config(path: Option<&std::path::Path>) -> Result<ScoutConfig> {
    let config = match path {
        Some(path) => ScoutConfig::from_json_file(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?,
        None => ScoutConfig::default(),
    }
    .with_env_overrides();
    Ok(config)
}

async fn run(config: ScoutConfig, store: Arc<JsonFileStore>) -> Result<()> {
    config.validate().context("Invalid configuration")?;
    tracing::info!(
        brand = %config.brand.name,
        domain = %config.brand.domain,
        pages_per_query = config.search.pages_per_query,
        "Starting discovery run"
    );

    let scout = MentionScout::from_config(config, store.clone(), store)
        .context("Failed to build discovery run")?;

    match scout.run_scheduled().await {
        Ok(report) => {
            let summary = serde_json::to_string(&report).context("Failed to encode report")?;
            println!("{summary}");
        }
        // Already recorded in the status location.
        Err(e) => tracing::error!(error = %e, "Run ended with an error"),
    }
    Ok(())
}

async fn triage(config: &ScoutConfig, store: &JsonFileStore, url: &str, status: &str) -> Result<()> {
    let status = OpportunityStatus::from(status.to_string());
    let outcome = archive_opportunity(store, &config.layout, url, &status)
        .await
        .with_context(|| format!("Failed to triage {url}"))?;

    if outcome.is_archived() {
        tracing::info!(url = %url, status = %status, "Moved to archive");
    } else {
        tracing::warn!(url = %url, "No active opportunity changed");
    }
    Ok(())
}
