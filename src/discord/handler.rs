//! Discord message event handling.
//!
//! Every guild message is scanned for party links against the directory
//! snapshot active when it arrives, judged with the guild's settings, and
//! the resulting action is carried out here.

use std::sync::Arc;

use serenity::async_trait;
use serenity::model::channel::Message;
use serenity::model::gateway::Ready;
use serenity::model::id::GuildId;
use serenity::model::mention::Mentionable;
use serenity::prelude::*;
use tracing::{debug, error, info, warn};

use crate::discord::commands::{parse_command, CommandHandler};
use crate::discord::render;
use crate::link::extract::LINK_MARKER;
use crate::link::{decide, resolve, Action, DirectorySnapshot, LinkExtractor, ServerDirectory};
use crate::store::{GuildSettings, PolicyStore};

/// Decide what to do with a guild message.
///
/// Returns `None` when the text holds no party link at all. Links that
/// fail to resolve still count as party links: they reach [`decide`] as
/// an empty list, so a delete-everything policy removes them.
pub fn judge_message(
    extractor: &LinkExtractor,
    content: &str,
    snapshot: &DirectorySnapshot,
    settings: &GuildSettings,
    author_roles: &[u64],
) -> Option<Action> {
    let candidates = extractor.extract(content);
    if candidates.is_empty() {
        return None;
    }

    let links = resolve(&candidates, snapshot);
    let immune = settings.is_immune(author_roles);
    Some(decide(links, &settings.policy, immune))
}

/// Discord event handler for party link moderation.
pub struct PartyLinkHandler {
    directory: ServerDirectory,
    store: Arc<PolicyStore>,
    extractor: LinkExtractor,
    command_prefix: String,
    command_handler: CommandHandler,
}

impl PartyLinkHandler {
    pub fn new(
        directory: ServerDirectory,
        store: Arc<PolicyStore>,
        command_prefix: String,
    ) -> Self {
        Self {
            command_handler: CommandHandler::new(store.clone(), directory.clone()),
            directory,
            store,
            extractor: LinkExtractor::new(),
            command_prefix,
        }
    }

    async fn moderate(&self, ctx: &Context, msg: &Message, guild_id: GuildId) {
        if !msg.content.contains(LINK_MARKER) {
            return;
        }

        let snapshot = self.directory.snapshot();
        let settings = self.store.settings(guild_id.get()).await;
        let roles: Vec<u64> = msg
            .member
            .as_ref()
            .map(|m| m.roles.iter().map(|r| r.get()).collect())
            .unwrap_or_default();

        let Some(action) =
            judge_message(&self.extractor, &msg.content, &snapshot, &settings, &roles)
        else {
            return;
        };
        debug!("Party links from {} in {}: {:?}", msg.author.name, msg.channel_id, action);

        if let Err(e) = self.apply(ctx, msg, action).await {
            warn!("Failed to act on party links in channel {}: {}", msg.channel_id, e);
        }
    }

    async fn apply(
        &self,
        ctx: &Context,
        msg: &Message,
        action: Action,
    ) -> Result<(), serenity::Error> {
        match action {
            Action::None => {}
            Action::DeleteSilent => {
                msg.delete(ctx).await?;
                info!("Deleted party link from {} in {}", msg.author.name, msg.channel_id);
            }
            Action::DeleteWithNotice { kind, .. } => {
                let notice = render::notice_text(kind, &msg.author.mention().to_string());
                msg.channel_id.say(&ctx.http, notice).await?;
                msg.delete(ctx).await?;
                info!(
                    "Deleted {:?} party link from {} in {}",
                    kind, msg.author.name, msg.channel_id
                );
            }
            Action::DetectNotify { links } => {
                for message in render::detection_messages(&links) {
                    msg.channel_id.send_message(&ctx.http, message).await?;
                }
            }
        }
        Ok(())
    }
}

#[async_trait]
impl EventHandler for PartyLinkHandler {
    async fn message(&self, ctx: Context, msg: Message) {
        // Ignore bots, including ourselves
        if msg.author.bot {
            return;
        }

        // Only handle guild (server) messages
        let Some(guild_id) = msg.guild_id else {
            return;
        };

        if let Some(command) = parse_command(&msg.content, &self.command_prefix) {
            if let Err(e) = self
                .command_handler
                .handle_command(&ctx, &msg, guild_id, command)
                .await
            {
                error!("Command handler error: {}", e);
            }
            return;
        }

        self.moderate(&ctx, &msg, guild_id).await;
    }

    async fn ready(&self, _ctx: Context, ready: Ready) {
        info!("Discord bot connected as {}", ready.user.name);
        info!(
            "Watching for party links against {} known servers",
            self.directory.snapshot().len()
        );
    }
}
