//! Partylink - diep.io party link moderation for Discord
//!
//! Detects party links in chat, decodes the game server they point at,
//! looks it up in the live server directory and deletes or announces the
//! link according to each guild's settings.

pub mod common;
pub mod config;
pub mod discord;
pub mod link;
pub mod store;
