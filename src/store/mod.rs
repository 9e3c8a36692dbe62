//! Guild settings persistence.

pub mod guild;

pub use guild::{GuildSettings, PolicyStore};
