//! Interactive chat mode.
//!
//! Provides a REPL-style interface over a
//! [`ConversationSession`](crate::conversation::ConversationSession), with
//! slash commands for inspecting and restarting the conversation.

/// Slash command parsing and autocomplete.
pub mod command;
mod session;
mod ui;

pub use session::ChatSession;
