//! Subcommand implementations.

/// Chat command handler.
pub mod chat;

/// Configure command handler.
pub mod configure;

/// Provider listing command handler.
pub mod providers;
