//! Provider listing command handler.

use anyhow::{Result, bail};

use crate::config::{BUILTIN_PROVIDER, ConfigFile, ConfigManager, ProviderConfig};
use crate::ui::Style;

/// Prints configured providers to stdout.
///
/// If `specific_provider` is provided, shows detailed information for that provider.
/// Otherwise, lists every provider, including the built-in one.
pub fn print_providers(specific_provider: Option<&str>) -> Result<()> {
    let config = ConfigManager::new().load_or_default()?;

    if let Some(name) = specific_provider {
        let Some(provider) = config.provider(name) else {
            bail!("Provider '{name}' not found");
        };
        print_details(&config, name, &provider);
        return Ok(());
    }

    println!("{}\n", Style::header("Providers"));
    for name in config.provider_names() {
        if let Some(provider) = config.provider(&name) {
            print_summary(&config, &name, &provider);
        }
    }

    Ok(())
}

fn is_default(config: &ConfigFile, name: &str) -> bool {
    config.convo.provider.as_deref().unwrap_or(BUILTIN_PROVIDER) == name
}

fn default_marker(config: &ConfigFile, name: &str) -> String {
    if is_default(config, name) {
        format!(" {}", Style::default_marker())
    } else {
        String::new()
    }
}

fn print_summary(config: &ConfigFile, name: &str, provider: &ProviderConfig) {
    println!("  {}{}", Style::value(name), default_marker(config, name));
    println!(
        "    {} {} {}",
        Style::label("endpoint:"),
        Style::secondary(&provider.endpoint),
        Style::secondary(format!("({})", provider.kind))
    );
    if !provider.models.is_empty() {
        println!(
            "    {} {}",
            Style::label("models:"),
            provider.models.join(", ")
        );
    }
}

fn print_details(config: &ConfigFile, name: &str, provider: &ProviderConfig) {
    println!(
        "{} {}{}",
        Style::header("Provider:"),
        Style::value(name),
        default_marker(config, name)
    );
    println!("  {}     = {}", Style::label("kind"), provider.kind);
    println!(
        "  {} = {}",
        Style::label("endpoint"),
        Style::secondary(&provider.endpoint)
    );

    let sources = provider.credential_sources(&config.secrets_file());
    if sources.is_empty() {
        println!("  {}  = (not required)", Style::label("api key"));
    } else {
        println!("  {}:", Style::label("api key"));
        for source in &sources {
            println!("    - {source}");
        }
    }

    if provider.models.is_empty() {
        println!("  {}   = (none configured)", Style::label("models"));
    } else {
        println!("  {}:", Style::label("models"));
        for model in &provider.models {
            println!("    - {model}");
        }
    }
}
