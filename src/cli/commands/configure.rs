//! Configure command handler for editing default settings.

use anyhow::{Result, bail};
use inquire::{Select, Text};

use crate::backend::{AccessStyle, ProviderKind};
use crate::config::{ConfigFile, ConfigManager, ConvoConfig, DEFAULT_MODEL};
use crate::ui::{Style, handle_prompt_cancellation};

/// Runs the configure command to edit default settings.
///
/// Allows the user to interactively set the default provider, model, and access style.
/// Cancelling a prompt leaves the config file untouched.
pub fn run_configure() -> Result<()> {
    handle_prompt_cancellation(run_configure_inner)?;
    Ok(())
}

fn run_configure_inner() -> Result<()> {
    let manager = ConfigManager::new();
    let mut config = manager.load_or_default()?;

    print_current_defaults(&config);

    let provider_names = config.provider_names();
    let provider = select_provider(&provider_names, config.convo.provider.as_deref())?;

    let (available_models, kind) = config
        .provider(&provider)
        .map(|p| (p.models, p.kind))
        .unwrap_or_default();

    let model = select_model(&available_models, kind, config.convo.model.as_deref())?;
    let mode = select_mode(config.convo.mode.unwrap_or_default())?;

    config.convo = ConvoConfig {
        provider: Some(provider),
        model: Some(model),
        mode: Some(mode),
        secrets_file: config.convo.secrets_file.take(),
    };

    manager.save(&config)?;

    println!();
    println!(
        "{} Configuration saved to {}",
        Style::success("✓"),
        Style::secondary(manager.config_path().display().to_string())
    );

    Ok(())
}

fn print_current_defaults(config: &ConfigFile) {
    let not_set = || Style::secondary("(not set)");

    println!("{}", Style::header("Current defaults"));
    println!(
        "  {}  {}",
        Style::label("provider"),
        config
            .convo
            .provider
            .as_deref()
            .map_or_else(not_set, Style::value)
    );
    println!(
        "  {}     {}",
        Style::label("model"),
        config
            .convo
            .model
            .as_deref()
            .map_or_else(not_set, Style::value)
    );
    println!(
        "  {}      {}",
        Style::label("mode"),
        config.convo.mode.map_or_else(not_set, Style::value)
    );
    println!();
}

fn select_provider(providers: &[String], default: Option<&str>) -> Result<String> {
    let default_index = default
        .and_then(|d| providers.iter().position(|p| p == d))
        .unwrap_or(0);

    let selection = Select::new("Default provider:", providers.to_vec())
        .with_starting_cursor(default_index)
        .prompt()?;

    Ok(selection)
}

fn select_model(
    available_models: &[String],
    kind: ProviderKind,
    default: Option<&str>,
) -> Result<String> {
    if available_models.is_empty() {
        // No models configured, fall back to text input
        let suggested = default.or((kind == ProviderKind::Gemini).then_some(DEFAULT_MODEL));
        let mut prompt = Text::new("Default model:").with_help_message("Enter the model name");

        if let Some(d) = suggested {
            prompt = prompt.with_default(d);
        }

        let model = prompt.prompt()?;

        if model.trim().is_empty() {
            bail!("Model name cannot be empty");
        }

        Ok(model.trim().to_string())
    } else {
        let default_index = default
            .and_then(|d| available_models.iter().position(|m| m == d))
            .unwrap_or(0);

        let selection = Select::new("Default model:", available_models.to_vec())
            .with_starting_cursor(default_index)
            .prompt()?;

        Ok(selection)
    }
}

fn select_mode(default: AccessStyle) -> Result<AccessStyle> {
    let options = vec![AccessStyle::Direct, AccessStyle::Agent];
    let default_index = options.iter().position(|m| *m == default).unwrap_or(0);

    let selection = Select::new("Default mode:", options)
        .with_starting_cursor(default_index)
        .with_help_message("direct: raw model call, agent: system prompt and temperature")
        .prompt()?;

    Ok(selection)
}
