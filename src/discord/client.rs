//! Discord bot client.
//!
//! Builds the serenity client around [`PartyLinkHandler`] and keeps it
//! connected until shutdown.

use std::sync::Arc;
use std::time::Duration;

use backon::BackoffBuilder;
use serenity::http::HttpBuilder;
use serenity::prelude::*;
use serenity::Client;
use tokio::sync::watch;
use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::common::error::AppError;
use crate::common::wait_for_shutdown;
use crate::discord::handler::PartyLinkHandler;
use crate::link::ServerDirectory;
use crate::store::PolicyStore;

/// Create an exponential backoff iterator for Discord reconnection.
/// 5s initial, 5min max, factor 1.1, with jitter, unlimited retries.
fn discord_backoff() -> impl Iterator<Item = Duration> {
    backon::ExponentialBuilder::default()
        .with_min_delay(Duration::from_secs(5))
        .with_max_delay(Duration::from_secs(300))
        .with_factor(1.1)
        .with_jitter()
        .without_max_times()
        .build()
}

async fn build_client(
    token: &str,
    directory: ServerDirectory,
    store: Arc<PolicyStore>,
    command_prefix: String,
) -> Result<Client, AppError> {
    let intents = GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT
        | GatewayIntents::GUILDS;

    // Build a custom reqwest client with timeout settings
    let reqwest_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(15))
        .connect_timeout(Duration::from_secs(10))
        .build()?;

    let http = HttpBuilder::new(token).client(reqwest_client).build();

    let handler = PartyLinkHandler::new(directory, store, command_prefix);
    let client = serenity::client::ClientBuilder::new_with_http(http, intents)
        .event_handler(handler)
        .await?;
    Ok(client)
}

pub struct DiscordBot {
    token: String,
    directory: ServerDirectory,
    store: Arc<PolicyStore>,
    command_prefix: String,
    shutdown_rx: watch::Receiver<bool>,
}

impl DiscordBot {
    pub fn new(
        token: String,
        directory: ServerDirectory,
        store: Arc<PolicyStore>,
        command_prefix: String,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Self {
        Self {
            token,
            directory,
            store,
            command_prefix,
            shutdown_rx,
        }
    }

    /// Run until shutdown is signalled or the gateway closes normally.
    pub async fn run(mut self) {
        let mut backoff = discord_backoff();

        loop {
            if *self.shutdown_rx.borrow() {
                break;
            }

            info!("Connecting to Discord...");
            let mut client = match build_client(
                &self.token,
                self.directory.clone(),
                self.store.clone(),
                self.command_prefix.clone(),
            )
            .await
            {
                Ok(client) => client,
                Err(e) => {
                    error!("Failed to build Discord client: {}", e);
                    let delay = backoff.next().unwrap_or(Duration::from_secs(300));
                    warn!("Retrying in {:.1}s...", delay.as_secs_f64());
                    if self.sleep_or_shutdown(delay).await {
                        break;
                    }
                    continue;
                }
            };

            let shard_manager = client.shard_manager.clone();
            let mut shutdown_rx = self.shutdown_rx.clone();

            let result = tokio::select! {
                result = client.start() => Some(result),
                _ = wait_for_shutdown(&mut shutdown_rx) => None,
            };

            match result {
                None => {
                    info!("Initiating graceful Discord shutdown...");
                    shard_manager.shutdown_all().await;
                    info!("Discord shutdown complete");
                    break;
                }
                Some(Ok(())) => {
                    info!("Discord client disconnected normally");
                    break;
                }
                Some(Err(e)) => {
                    error!("Discord client error: {}", e);
                    let delay = backoff.next().unwrap_or(Duration::from_secs(300));
                    warn!(
                        "Discord disconnected. Reconnecting in {:.1}s...",
                        delay.as_secs_f64()
                    );
                    if self.sleep_or_shutdown(delay).await {
                        break;
                    }
                }
            }
        }
        info!("Discord task ended");
    }

    /// Sleep for `delay`; returns `true` if shutdown arrived first.
    async fn sleep_or_shutdown(&mut self, delay: Duration) -> bool {
        tokio::select! {
            _ = sleep(delay) => false,
            _ = wait_for_shutdown(&mut self.shutdown_rx) => true,
        }
    }
}
