use anyhow::Result;
use clap::Parser;
use std::process::ExitCode;

use convo_cli::cli::commands::{chat, configure, providers};
use convo_cli::cli::{Args, ChatArgs, Command};
use convo_cli::conversation::SessionError;
use convo_cli::logging;
use convo_cli::output::{self, OutputConfig};
use convo_cli::ui::Style;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    output::init(OutputConfig {
        quiet: args.quiet,
        no_color: args.no_color || OutputConfig::default().no_color,
    });
    logging::init(args.verbose);

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{} {err:#}", Style::error("Error:"));
            ExitCode::from(exit_code(&err))
        }
    }
}

async fn run(args: Args) -> Result<()> {
    match args.command {
        Some(Command::Providers { provider }) => {
            providers::print_providers(provider.as_deref())?;
        }
        Some(Command::Configure) => {
            configure::run_configure()?;
        }
        Some(Command::Chat(options)) => {
            chat::run_chat(&options).await?;
        }
        None => {
            chat::run_chat(&ChatArgs::default()).await?;
        }
    }

    Ok(())
}

/// Setup failures (configuration or credential) map to `EX_CONFIG`.
fn exit_code(err: &anyhow::Error) -> u8 {
    let code = match err.downcast_ref::<SessionError>() {
        Some(e) if e.is_setup_error() => exitcode::CONFIG,
        _ => exitcode::SOFTWARE,
    };
    u8::try_from(code).unwrap_or(1)
}
