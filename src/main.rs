//! Partylink - diep.io party link moderation for Discord

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use partylink::common::shutdown_signal;
use partylink::config::{env::get_config_path, load_and_validate};
use partylink::discord::DiscordBot;
use partylink::link::{run_refresh_loop, HttpDirectorySource, ServerDirectory};
use partylink::store::PolicyStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("Partylink v{} starting...", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config_path = get_config_path();
    info!("Loading configuration from {}...", config_path);

    let config = load_and_validate(&config_path).map_err(|e| {
        error!("Failed to load configuration: {}", e);
        error!("Please ensure {} exists and is properly formatted.", config_path);
        e
    })?;

    info!("Configuration loaded successfully");
    info!("  Directory: {}", config.directory.url);
    info!(
        "  Refresh every {}s (timeout {}s)",
        config.directory.refresh_interval_secs, config.directory.fetch_timeout_secs
    );
    info!("  Settings file: {}", config.storage.path);

    let store = Arc::new(PolicyStore::load(&config.storage.path, config.defaults).await?);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // ============================================================
    // Directory refresh runs on its own schedule
    // ============================================================
    let directory = ServerDirectory::new();
    let source = HttpDirectorySource::new(
        config.directory.url.clone(),
        config.directory.fetch_timeout(),
    )?;
    let mut refresh_task = tokio::spawn(run_refresh_loop(
        directory.clone(),
        source,
        config.directory.refresh_settings(),
        shutdown_rx.clone(),
    ));

    // ============================================================
    // Start Discord bot
    // ============================================================
    info!("Starting Discord bot...");
    let bot = DiscordBot::new(
        config.discord.token.clone(),
        directory,
        store,
        config.discord.command_prefix.clone(),
        shutdown_rx,
    );
    let mut discord_task = tokio::spawn(bot.run());

    let shutdown = tokio::select! {
        biased;
        _ = shutdown_signal() => {
            info!("Shutdown signal received - stopping...");
            true
        }
        _ = &mut refresh_task => {
            error!("Directory refresh task ended unexpectedly");
            false
        }
        _ = &mut discord_task => false,
    };

    // Signal both tasks (fire-and-forget - they may already be gone)
    if let Err(e) = shutdown_tx.send(true) {
        debug!("Shutdown channel closed (tasks already exited): {}", e);
    }

    if shutdown {
        let timeout = Duration::from_secs(5);
        let joined = async { tokio::join!(refresh_task, discord_task) };
        match tokio::time::timeout(timeout, joined).await {
            Ok((refresh, discord)) => {
                if let Err(e) = refresh {
                    warn!("Directory refresh task panicked: {}", e);
                }
                if let Err(e) = discord {
                    warn!("Discord task panicked: {}", e);
                }
                info!("Stopped gracefully");
            }
            Err(_) => warn!("Shutdown timed out"),
        }
    }

    info!("Exiting...");
    Ok(())
}
