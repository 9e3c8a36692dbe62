//! Discord bot integration.
//!
//! This module connects the party link pipeline to Discord: message
//! scanning, admin commands and rendering of moderation actions.

pub mod client;
pub mod commands;
pub mod handler;
pub mod render;

// Re-export main types for external use
pub use client::DiscordBot;
pub use commands::{CommandHandler, PartyLinkCommand};
pub use handler::PartyLinkHandler;
