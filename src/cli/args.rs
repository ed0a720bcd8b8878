use clap::{Parser, Subcommand};

use crate::backend::AccessStyle;
use crate::config::KeySource;

#[derive(Parser, Debug)]
#[command(name = "convo")]
#[command(about = "Chat with a hosted LLM from your terminal")]
#[command(version)]
pub struct Args {
    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Print diagnostic logs to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Options shared by `convo` and `convo chat`.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct ChatArgs {
    /// Provider name from config.toml
    #[arg(short, long)]
    pub provider: Option<String>,

    /// Model name
    #[arg(short, long)]
    pub model: Option<String>,

    /// Access style
    #[arg(long, value_enum)]
    pub mode: Option<AccessStyle>,

    /// Where to read the API key from
    #[arg(long, value_enum, default_value_t = KeySource::Auto)]
    pub key_source: KeySource,

    /// Skip checking the API key with the backend before chatting
    #[arg(long)]
    pub no_verify: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start an interactive chat (the default)
    Chat(ChatArgs),
    /// List configured providers
    Providers {
        /// Show details for a single provider
        provider: Option<String>,
    },
    /// Interactively set the default provider, model and mode
    Configure,
}
