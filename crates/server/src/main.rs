mod bootstrap;
mod health;
mod hooks;

use std::time::Duration;

use anyhow::Result;
use mifugo_core::config::{AppConfig, LoadOptions};
use tokio_util::sync::CancellationToken;

fn init_logging(config: &AppConfig) {
    use mifugo_core::config::LogFormat;
    use tracing_subscriber::EnvFilter;

    // RUST_LOG wins over the configured level when set.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.logging.level.clone()));

    let builder = tracing_subscriber::fmt().with_target(false).with_env_filter(filter);
    match config.logging.format {
        LogFormat::Compact => builder.compact().init(),
        LogFormat::Pretty => builder.pretty().init(),
        LogFormat::Json => builder.json().init(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    run().await
}

pub async fn run() -> Result<()> {
    // Load config and initialize logging before any other operations.
    let config = AppConfig::load(LoadOptions::default())?;
    init_logging(&config);

    let app = bootstrap::bootstrap_with_config(config).await?;

    let cancel = CancellationToken::new();
    let sweeper = app.sweeper.clone();
    let sweeper_cancel = cancel.clone();
    let sweeper_task = tokio::spawn(async move {
        sweeper.run(sweeper_cancel).await;
    });

    let router =
        hooks::router(app.reactor.clone()).merge(health::router(app.db_pool.clone(), app.channels));
    let address = format!("{}:{}", app.config.server.bind_address, app.config.server.port);
    let listener = tokio::net::TcpListener::bind(&address).await?;

    tracing::info!(
        event_name = "system.server.started",
        bind_address = %address,
        lifecycle = ?app.config.workflow.lifecycle,
        "mifugo-server started"
    );

    axum::serve(listener, router).with_graceful_shutdown(wait_for_shutdown()).await?;

    tracing::info!(event_name = "system.server.stopping", "mifugo-server stopping");
    cancel.cancel();
    let grace = Duration::from_secs(app.config.server.graceful_shutdown_secs);
    if tokio::time::timeout(grace, sweeper_task).await.is_err() {
        tracing::warn!("timeout sweeper did not stop within the grace period");
    }

    Ok(())
}

async fn wait_for_shutdown() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %error, "shutdown signal listener failed");
    }
}
