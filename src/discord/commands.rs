//! Party link admin commands (`!plset ...`).
//!
//! Handles command parsing and execution for guild administrators.

use std::sync::Arc;

use chrono::Utc;
use serenity::model::channel::Message;
use serenity::model::id::GuildId;
use serenity::prelude::*;
use tracing::{debug, info};

use crate::link::decision::GuildPolicy;
use crate::link::directory::ServerDirectory;
use crate::store::PolicyStore;

/// Role given as a command argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleArg {
    /// A role mention or a raw id.
    Id(u64),
    /// A role name, matched case-insensitively.
    Name(String),
}

/// A parsed `plset` sub-command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartyLinkCommand {
    AddImmuneRole(RoleArg),
    RemoveImmuneRole(RoleArg),
    SetDetect(bool),
    SetAllDelete(bool),
    SetSandboxDelete(bool),
    SetTdmDelete(bool),
    Status,
    Help,
}

const USAGE: &str = r#"**Party link settings:**
• `plset linkroleadd <role>` - Allow a role to post party links
• `plset linkroledelete <role>` - Remove a role from the allowed list
• `plset detect <on|off>` - Announce detected party links
• `plset delete <on|off>` - Delete all party links silently
• `plset sbdelete <on|off>` - Delete sandbox party links
• `plset tdmdelete <on|off>` - Delete TDM party links
• `plset status` - Show the current settings"#;

/// Parse a message as a `plset` command.
///
/// Returns `None` if the message is not a `plset` command at all, and
/// `Some(Err(reason))` if it is one but the arguments are wrong.
pub fn parse_command(content: &str, prefix: &str) -> Option<Result<PartyLinkCommand, String>> {
    let rest = content.trim().strip_prefix(prefix)?;
    let mut parts = rest.split_whitespace();

    let group = parts.next()?.to_lowercase();
    if group != "plset" && group != "partylinkset" {
        return None;
    }

    let Some(sub) = parts.next() else {
        return Some(Ok(PartyLinkCommand::Help));
    };
    let args: Vec<&str> = parts.collect();
    let args = args.join(" ");

    Some(parse_subcommand(&sub.to_lowercase(), &args))
}

fn parse_subcommand(sub: &str, args: &str) -> Result<PartyLinkCommand, String> {
    match sub {
        "linkroleadd" | "plra" => parse_role(args).map(PartyLinkCommand::AddImmuneRole),
        "linkroledelete" | "plrd" => parse_role(args).map(PartyLinkCommand::RemoveImmuneRole),
        "detect" => parse_bool(args).map(PartyLinkCommand::SetDetect),
        "delete" => parse_bool(args).map(PartyLinkCommand::SetAllDelete),
        "sbdelete" => parse_bool(args).map(PartyLinkCommand::SetSandboxDelete),
        "tdmdelete" => parse_bool(args).map(PartyLinkCommand::SetTdmDelete),
        "status" => Ok(PartyLinkCommand::Status),
        "help" => Ok(PartyLinkCommand::Help),
        other => Err(format!("Unknown setting `{}`.", other)),
    }
}

fn parse_bool(arg: &str) -> Result<bool, String> {
    match arg.trim().to_lowercase().as_str() {
        "on" | "true" | "yes" | "enable" | "enabled" | "1" => Ok(true),
        "off" | "false" | "no" | "disable" | "disabled" | "0" => Ok(false),
        "" => Err("Expected `on` or `off`.".to_string()),
        other => Err(format!("`{}` is not `on` or `off`.", other)),
    }
}

fn parse_role(arg: &str) -> Result<RoleArg, String> {
    let arg = arg.trim();
    if arg.is_empty() {
        return Err("Expected a role.".to_string());
    }

    let id = arg
        .strip_prefix("<@&")
        .and_then(|s| s.strip_suffix('>'))
        .unwrap_or(arg);

    match id.parse::<u64>() {
        Ok(id) => Ok(RoleArg::Id(id)),
        Err(_) => Ok(RoleArg::Name(arg.to_string())),
    }
}

fn toggle_word(enabled: bool) -> &'static str {
    if enabled {
        "enabled"
    } else {
        "disabled"
    }
}

fn on_off(enabled: bool) -> &'static str {
    if enabled {
        "on"
    } else {
        "off"
    }
}

/// Command handler for party link settings.
pub struct CommandHandler {
    store: Arc<PolicyStore>,
    directory: ServerDirectory,
}

impl CommandHandler {
    pub fn new(store: Arc<PolicyStore>, directory: ServerDirectory) -> Self {
        Self { store, directory }
    }

    /// Execute a parsed command and reply in the message's channel.
    pub async fn handle_command(
        &self,
        ctx: &Context,
        msg: &Message,
        guild_id: GuildId,
        command: Result<PartyLinkCommand, String>,
    ) -> anyhow::Result<()> {
        if !is_admin(ctx, msg) {
            debug!("Ignoring plset command from non-admin {}", msg.author.name);
            return Ok(());
        }

        let command = match command {
            Ok(command) => command,
            Err(reason) => {
                msg.channel_id
                    .say(&ctx.http, format!("{}\n{}", reason, USAGE))
                    .await?;
                return Ok(());
            }
        };

        info!("plset command from {} in guild {}: {:?}", msg.author.name, guild_id, command);

        let reply = match command {
            PartyLinkCommand::AddImmuneRole(arg) => {
                let Some((role_id, role_name)) = resolve_role(ctx, guild_id, &arg) else {
                    msg.channel_id.say(&ctx.http, "I couldn't find that role.").await?;
                    return Ok(());
                };
                if self.store.add_immune_role(guild_id.get(), role_id).await? {
                    format!("Successfully allowed **{}** to post party links!", role_name)
                } else {
                    format!("**{}** is already allowed to post party links.", role_name)
                }
            }
            PartyLinkCommand::RemoveImmuneRole(arg) => {
                let (role_id, role_name) =
                    resolve_role(ctx, guild_id, &arg).unwrap_or_else(|| match arg {
                        RoleArg::Id(id) => (id, id.to_string()),
                        RoleArg::Name(name) => (0, name),
                    });
                if self.store.remove_immune_role(guild_id.get(), role_id).await? {
                    format!("Successfully disallowed **{}** to post party links!", role_name)
                } else {
                    format!(
                        "**{}** was never allowed to post party links in the first place...",
                        role_name
                    )
                }
            }
            PartyLinkCommand::SetDetect(on) => {
                self.store.update_policy(guild_id.get(), |p| p.detect = on).await?;
                format!("Party link detection {}.", toggle_word(on))
            }
            PartyLinkCommand::SetAllDelete(on) => {
                self.store.update_policy(guild_id.get(), |p| p.all_delete = on).await?;
                format!("Party link deletion {}.", toggle_word(on))
            }
            PartyLinkCommand::SetSandboxDelete(on) => {
                self.store.update_policy(guild_id.get(), |p| p.delete = on).await?;
                format!("Sandbox link deletion {}.", toggle_word(on))
            }
            PartyLinkCommand::SetTdmDelete(on) => {
                self.store.update_policy(guild_id.get(), |p| p.tdm_delete = on).await?;
                format!("TDM (2 Teams and 4 Teams) link deletion {}.", toggle_word(on))
            }
            PartyLinkCommand::Status => self.status(guild_id).await,
            PartyLinkCommand::Help => USAGE.to_string(),
        };

        msg.channel_id.say(&ctx.http, reply).await?;
        Ok(())
    }

    async fn status(&self, guild_id: GuildId) -> String {
        let settings = self.store.settings(guild_id.get()).await;
        let snapshot = self.directory.snapshot();

        let roles = if settings.immune_roles.is_empty() {
            "none".to_string()
        } else {
            settings
                .immune_roles
                .iter()
                .map(|id| format!("<@&{}>", id))
                .collect::<Vec<_>>()
                .join(", ")
        };

        let refreshed = match snapshot.fetched_at() {
            Some(at) => format!("{}s ago", (Utc::now() - at).num_seconds().max(0)),
            None => "never".to_string(),
        };

        format_status(&settings.policy, &roles, snapshot.len(), &refreshed)
    }
}

fn format_status(policy: &GuildPolicy, roles: &str, servers: usize, refreshed: &str) -> String {
    format!(
        "**Party link settings:**\n\
         • Detection: {}\n\
         • Delete all: {}\n\
         • Sandbox deletion: {}\n\
         • TDM deletion: {}\n\
         • Allowed roles: {}\n\
         • Directory: {} servers, refreshed {}",
        on_off(policy.detect),
        on_off(policy.all_delete),
        on_off(policy.delete),
        on_off(policy.tdm_delete),
        roles,
        servers,
        refreshed
    )
}

/// Guild owner, or a member holding a role with ADMINISTRATOR.
fn is_admin(ctx: &Context, msg: &Message) -> bool {
    let Some(guild_id) = msg.guild_id else {
        return false;
    };
    let Some(guild) = ctx.cache.guild(guild_id) else {
        return false;
    };
    if guild.owner_id == msg.author.id {
        return true;
    }
    let Some(member) = msg.member.as_ref() else {
        return false;
    };

    member
        .roles
        .iter()
        .filter_map(|id| guild.roles.get(id))
        .any(|role| role.permissions.administrator())
}

/// Find a guild role by id or name, returning its id and display name.
fn resolve_role(ctx: &Context, guild_id: GuildId, arg: &RoleArg) -> Option<(u64, String)> {
    let guild = ctx.cache.guild(guild_id)?;
    let role = match arg {
        RoleArg::Id(id) => guild.roles.values().find(|r| r.id.get() == *id),
        RoleArg::Name(name) => guild
            .roles
            .values()
            .find(|r| r.name.eq_ignore_ascii_case(name)),
    }?;
    Some((role.id.get(), role.name.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_a_command() {
        assert!(parse_command("hello", "!").is_none());
        assert!(parse_command("!who", "!").is_none());
        assert!(parse_command("?plset detect on", "!").is_none());
        assert!(parse_command("!", "!").is_none());
    }

    #[test]
    fn test_group_without_sub_is_help() {
        assert_eq!(parse_command("!plset", "!"), Some(Ok(PartyLinkCommand::Help)));
        assert_eq!(parse_command("!PartyLinkSet", "!"), Some(Ok(PartyLinkCommand::Help)));
    }

    #[test]
    fn test_toggles() {
        assert_eq!(
            parse_command("!plset detect off", "!"),
            Some(Ok(PartyLinkCommand::SetDetect(false)))
        );
        assert_eq!(
            parse_command("!plset delete yes", "!"),
            Some(Ok(PartyLinkCommand::SetAllDelete(true)))
        );
        assert_eq!(
            parse_command("!plset SBDELETE 0", "!"),
            Some(Ok(PartyLinkCommand::SetSandboxDelete(false)))
        );
        assert_eq!(
            parse_command("?plset tdmdelete enable", "?"),
            Some(Ok(PartyLinkCommand::SetTdmDelete(true)))
        );
    }

    #[test]
    fn test_bad_toggle() {
        assert!(matches!(parse_command("!plset detect maybe", "!"), Some(Err(_))));
        assert!(matches!(parse_command("!plset detect", "!"), Some(Err(_))));
    }

    #[test]
    fn test_role_arguments() {
        assert_eq!(
            parse_command("!plset plra <@&1234>", "!"),
            Some(Ok(PartyLinkCommand::AddImmuneRole(RoleArg::Id(1234))))
        );
        assert_eq!(
            parse_command("!plset linkroledelete 99", "!"),
            Some(Ok(PartyLinkCommand::RemoveImmuneRole(RoleArg::Id(99))))
        );
        assert_eq!(
            parse_command("!plset linkroleadd Party Hosts", "!"),
            Some(Ok(PartyLinkCommand::AddImmuneRole(RoleArg::Name("Party Hosts".to_string()))))
        );
        assert!(matches!(parse_command("!plset plrd", "!"), Some(Err(_))));
    }

    #[test]
    fn test_unknown_setting() {
        let result = parse_command("!plset colour red", "!").unwrap();
        assert!(result.unwrap_err().contains("colour"));
    }

    #[test]
    fn test_format_status() {
        let text = format_status(&GuildPolicy::default(), "none", 12, "30s ago");
        assert!(text.contains("Detection: on"));
        assert!(text.contains("Delete all: off"));
        assert!(text.contains("Sandbox deletion: on"));
        assert!(text.contains("TDM deletion: off"));
        assert!(text.contains("12 servers, refreshed 30s ago"));
    }
}
