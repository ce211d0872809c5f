use anyhow::{Context, Result};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use page_reply_sync::auth;
use page_reply_sync::config::Config;
use page_reply_sync::constants::{EXIT_FATAL, EXIT_OK};
use page_reply_sync::graph::GraphClient;
use page_reply_sync::scheduler;
use page_reply_sync::store::CommentStore;
use page_reply_sync::sync::{RunSummary, Synchronizer};

#[tokio::main]
async fn main() {
    let code = match run().await {
        Ok(code) => code,
        Err(e) => {
            error!("Fatal error: {e:#}");
            EXIT_FATAL
        }
    };
    std::process::exit(code);
}

async fn run() -> Result<i32> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    init_tracing()?;

    info!("Starting page-reply-sync");

    let config = Config::from_env().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    info!(
        sync_target = ?config.target,
        posts_dir = %config.posts_dir.display(),
        reply_enabled = config.reply_enabled,
        "Configuration loaded"
    );

    let bootstrap = GraphClient::new(&config).context("Failed to build Graph API client")?;
    let resolved = auth::resolve_access_token(&bootstrap, &config)
        .await
        .context("Failed to resolve access token")?;
    let config = config.with_access_token(resolved.token);
    let client = GraphClient::new(&config).context("Failed to build Graph API client")?;

    if config.check_permissions {
        if let Err(e) = auth::check_permissions(&client).await {
            warn!(error = %e, "Failed to check token permissions");
        }
    }

    let store = CommentStore::open(&config.posts_dir)
        .await
        .context("Failed to open posts directory")?;

    let sync = Synchronizer::new(config.clone(), client, store);

    let Some(interval) = config.sync_interval else {
        let summary = finish_cycle(&config, sync.run_once().await).await;
        return Ok(summary.exit_code());
    };

    info!(interval_secs = interval.as_secs(), "Scheduled mode enabled");
    let sync = &sync;
    let config = &config;
    tokio::select! {
        () = scheduler::run_every(interval, move || async move {
            finish_cycle(config, sync.run_once().await).await;
        }) => {},
        () = shutdown_signal() => {
            info!("Shutting down");
        }
    }

    Ok(EXIT_OK)
}

/// Log a finished pass and write its JSON report if configured.
async fn finish_cycle(config: &Config, summary: RunSummary) -> RunSummary {
    summary.log();

    if let Some(path) = &config.summary_path {
        if let Err(e) = write_report(path, &summary).await {
            warn!(path = %path.display(), "Failed to write run summary: {e:#}");
        }
    }

    summary
}

async fn write_report(path: &std::path::Path, summary: &RunSummary) -> Result<()> {
    let json = serde_json::to_vec_pretty(summary).context("Failed to serialize run summary")?;
    tokio::fs::write(path, json)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,page_reply_sync=debug"));

    // Check if JSON logging is requested
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| matches!(v.to_lowercase().as_str(), "json" | "structured"))
        .unwrap_or(false);

    if use_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
