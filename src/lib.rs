//! # convo - Terminal Chat with Hosted LLMs
//!
//! `convo` keeps a multi-turn conversation with a remote language model and
//! sends the whole transcript on every exchange, so the model sees the
//! conversation so far.
//!
//! ## Features
//!
//! - **Conversation sessions**: an explicit uninitialized/active lifecycle
//!   with atomic reset
//! - **Two access styles**: direct model calls, or an agent wrapper with a
//!   system prompt
//! - **Multiple providers**: the Gemini API and any OpenAI-compatible endpoint
//! - **Credential sources**: masked prompt, secrets file, environment, config
//!
//! ## Quick Start
//!
//! ```bash
//! # Chat with Gemini using $GOOGLE_API_KEY or a prompted key
//! convo
//!
//! # Use a configured provider in agent mode
//! convo chat --provider ollama --mode agent
//! ```
//!
//! ## Configuration
//!
//! Settings are stored in `~/.config/convo/config.toml`:
//!
//! ```toml
//! [convo]
//! provider = "ollama"
//! model = "gemma3:12b"
//! mode = "direct"
//!
//! [providers.ollama]
//! kind = "openai"
//! endpoint = "http://localhost:11434"
//! models = ["gemma3:12b", "llama3.2"]
//! ```

/// Remote chat backends and model clients.
pub mod backend;

/// Interactive chat mode.
pub mod chat;

/// Command-line interface definitions and handlers.
pub mod cli;

/// Configuration file management and provider settings.
pub mod config;

/// Conversation sessions and transcripts.
pub mod conversation;

/// Credential sources (prompt, secrets file, environment, config).
pub mod credential;

/// Diagnostic logging with `tracing`.
pub mod logging;

/// Global output configuration (quiet mode, colors, stderr/stdout routing).
pub mod output;

/// XDG-style path utilities for configuration and secrets.
pub mod paths;

/// Terminal UI components (spinner, colors, prompts).
pub mod ui;
