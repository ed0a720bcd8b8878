use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::backend::{
    AccessStyle, AgentSettings, BackendSpec, DEFAULT_GEMINI_ENDPOINT, ProviderKind,
};
use crate::credential::{CredentialSource, DEFAULT_SECRET_KEY};
use crate::paths;
use crate::ui::Style;

/// Name of the provider that exists even without a config file.
pub const BUILTIN_PROVIDER: &str = "gemini";

/// Model used with the built-in provider when none is configured.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Default settings in the `[convo]` section of config.toml.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConvoConfig {
    /// Default provider name.
    pub provider: Option<String>,
    /// Default model name.
    pub model: Option<String>,
    /// Default access style (`direct` or `agent`).
    pub mode: Option<AccessStyle>,
    /// Secrets file location, if not `~/.config/convo/secrets.toml`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secrets_file: Option<PathBuf>,
}

/// Configuration for a model provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Wire protocol (`gemini` or `openai`).
    #[serde(default)]
    pub kind: ProviderKind,
    /// Base URL of the API.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// API key stored directly in config (not recommended).
    #[serde(default)]
    pub api_key: Option<String>,
    /// Environment variable name containing the API key.
    #[serde(default)]
    pub api_key_env: Option<String>,
    /// Key to look up in the secrets file.
    #[serde(default)]
    pub secret_key: Option<String>,
    /// List of available models for this provider.
    #[serde(default)]
    pub models: Vec<String>,
    /// Per-request timeout in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

fn default_endpoint() -> String {
    DEFAULT_GEMINI_ENDPOINT.to_string()
}

impl ProviderConfig {
    /// The provider used when nothing is configured: Gemini, keyed by
    /// `GOOGLE_API_KEY` in the environment or the secrets file.
    pub fn builtin() -> Self {
        Self {
            kind: ProviderKind::Gemini,
            endpoint: default_endpoint(),
            api_key: None,
            api_key_env: Some(DEFAULT_SECRET_KEY.to_string()),
            secret_key: Some(DEFAULT_SECRET_KEY.to_string()),
            models: vec![DEFAULT_MODEL.to_string(), "gemini-1.5-flash".to_string()],
            timeout_secs: None,
        }
    }

    /// Returns `true` if this provider requires an API key.
    pub const fn requires_api_key(&self) -> bool {
        matches!(self.kind, ProviderKind::Gemini)
            || self.api_key.is_some()
            || self.api_key_env.is_some()
            || self.secret_key.is_some()
    }

    /// Credential sources configured for this provider, in lookup order:
    /// environment variable, secrets file, inline `api_key`.
    pub fn credential_sources(&self, secrets_file: &std::path::Path) -> Vec<CredentialSource> {
        let mut sources = Vec::new();

        if let Some(var) = &self.api_key_env {
            sources.push(CredentialSource::Environment { var: var.clone() });
        }
        if let Some(key) = &self.secret_key {
            sources.push(CredentialSource::SecretStore {
                path: secrets_file.to_path_buf(),
                key: key.clone(),
            });
        }
        if let Some(value) = &self.api_key {
            sources.push(CredentialSource::Inline(value.clone()));
        }

        sources
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }
}

/// The complete configuration file structure.
///
/// Corresponds to `~/.config/convo/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    /// Default settings.
    #[serde(default)]
    pub convo: ConvoConfig,
    /// Agent wrapper settings, used in `agent` mode.
    #[serde(default)]
    pub agent: AgentSettings,
    /// Provider configurations keyed by name.
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

impl ConfigFile {
    /// Looks up a provider, falling back to the built-in one by name.
    pub fn provider(&self, name: &str) -> Option<ProviderConfig> {
        self.providers
            .get(name)
            .cloned()
            .or_else(|| (name == BUILTIN_PROVIDER).then(ProviderConfig::builtin))
    }

    /// Configured provider names plus the built-in one, sorted.
    pub fn provider_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.providers.keys().cloned().collect();
        if !self.providers.contains_key(BUILTIN_PROVIDER) {
            names.push(BUILTIN_PROVIDER.to_string());
        }
        names.sort_unstable();
        names
    }

    pub fn secrets_file(&self) -> PathBuf {
        self.convo
            .secrets_file
            .clone()
            .unwrap_or_else(paths::secrets_file)
    }
}

/// Which credential sources to consult.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum KeySource {
    /// Environment variable, then secrets file, then config, then prompt.
    #[default]
    Auto,
    /// Always ask on the terminal.
    Prompt,
    /// Only the secrets file.
    Secrets,
    /// Only the environment variable.
    Env,
}

/// Resolved configuration after merging CLI arguments and config file.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// The selected provider name.
    pub provider_name: String,
    /// Everything needed to build the backend.
    pub backend: BackendSpec,
    /// Where to look for the credential, in order.
    pub credential_sources: Vec<CredentialSource>,
}

/// Options for resolving configuration.
///
/// Contains CLI overrides that take precedence over config file values.
#[derive(Debug, Clone, Default)]
pub struct ResolveOptions {
    /// Provider name override.
    pub provider: Option<String>,
    /// Model name override.
    pub model: Option<String>,
    /// Access style override.
    pub mode: Option<AccessStyle>,
    /// Credential source selection.
    pub key_source: KeySource,
}

/// Resolves configuration by merging CLI options with config file settings.
///
/// Priority: CLI options, then config file, then built-in defaults.
///
/// # Errors
///
/// Returns an error if the specified provider is not found or a model cannot
/// be determined.
pub fn resolve_config(
    options: &ResolveOptions,
    config_file: &ConfigFile,
) -> Result<ResolvedConfig> {
    // Resolve provider
    let provider_name = options
        .provider
        .as_ref()
        .or(config_file.convo.provider.as_ref())
        .cloned()
        .unwrap_or_else(|| BUILTIN_PROVIDER.to_string());

    // Get provider config
    let provider_config = config_file.provider(&provider_name).ok_or_else(|| {
        let available = config_file.provider_names();
        anyhow::anyhow!(
            "Provider '{provider_name}' not found\n\n\
             Available providers:\n  \
             - {}\n\n\
             Add providers to ~/.config/convo/config.toml",
            available.join("\n  - ")
        )
    })?;

    // Resolve model
    let model = options
        .model
        .as_ref()
        .or(config_file.convo.model.as_ref())
        .or(provider_config.models.first())
        .cloned()
        .or_else(|| {
            (provider_config.kind == ProviderKind::Gemini).then(|| DEFAULT_MODEL.to_string())
        })
        .ok_or_else(|| {
            anyhow::anyhow!(
                "Missing required configuration: 'model'\n\n\
                 Please provide it via:\n  \
                 - CLI option: convo --model <name>\n  \
                 - Config file: ~/.config/convo/config.toml"
            )
        })?;

    // Warn if model is not in provider's models list
    if !provider_config.models.is_empty() && !provider_config.models.contains(&model) {
        crate::warn!(
            "{} Model '{}' is not in the configured models list for '{}'\n\
             Configured models: {}\n\
             Proceeding anyway...\n",
            Style::warning("Warning:"),
            model,
            provider_name,
            provider_config.models.join(", ")
        );
    }

    let style = options
        .mode
        .or(config_file.convo.mode)
        .unwrap_or_default();

    let credential_sources =
        select_credential_sources(options.key_source, &provider_config, config_file.secrets_file());

    let backend = BackendSpec {
        kind: provider_config.kind,
        endpoint: provider_config.endpoint.clone(),
        model,
        style,
        agent: config_file.agent.clone(),
        timeout: provider_config.timeout(),
        requires_credential: provider_config.requires_api_key(),
    };

    Ok(ResolvedConfig {
        provider_name,
        backend,
        credential_sources,
    })
}

fn select_credential_sources(
    key_source: KeySource,
    provider: &ProviderConfig,
    secrets_file: PathBuf,
) -> Vec<CredentialSource> {
    match key_source {
        KeySource::Auto => {
            let mut sources = provider.credential_sources(&secrets_file);
            if provider.requires_api_key() {
                sources.push(CredentialSource::Interactive);
            }
            sources
        }
        KeySource::Prompt => vec![CredentialSource::Interactive],
        KeySource::Secrets => vec![CredentialSource::SecretStore {
            path: secrets_file,
            key: provider
                .secret_key
                .clone()
                .unwrap_or_else(|| DEFAULT_SECRET_KEY.to_string()),
        }],
        KeySource::Env => vec![CredentialSource::Environment {
            var: provider
                .api_key_env
                .clone()
                .unwrap_or_else(|| DEFAULT_SECRET_KEY.to_string()),
        }],
    }
}

/// Manages loading and saving configuration files.
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Creates a new config manager.
    ///
    /// Configuration is stored at `$XDG_CONFIG_HOME/convo/config.toml`
    /// or `~/.config/convo/config.toml` if `XDG_CONFIG_HOME` is not set.
    pub fn new() -> Self {
        Self {
            config_path: paths::config_dir().join("config.toml"),
        }
    }

    pub const fn config_path(&self) -> &PathBuf {
        &self.config_path
    }

    pub fn load(&self) -> Result<ConfigFile> {
        let contents = fs::read_to_string(&self.config_path).with_context(|| {
            format!("Failed to read config file: {}", self.config_path.display())
        })?;

        let config_file: ConfigFile =
            toml::from_str(&contents).with_context(|| "Failed to parse config file")?;

        Ok(config_file)
    }

    pub fn save(&self, config: &ConfigFile) -> Result<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let contents = toml::to_string_pretty(config).context("Failed to serialize config")?;

        fs::write(&self.config_path, contents).with_context(|| {
            format!(
                "Failed to write config file: {}",
                self.config_path.display()
            )
        })?;

        Ok(())
    }

    /// Loads the config file; a missing file yields defaults, a broken one is an error.
    pub fn load_or_default(&self) -> Result<ConfigFile> {
        if self.config_path.exists() {
            self.load()
        } else {
            Ok(ConfigFile::default())
        }
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}
