//! Common utilities and types shared across the application.

pub mod error;
pub mod shutdown;

pub use shutdown::{shutdown_signal, wait_for_shutdown};
