//! Where the backend credential comes from.
//!
//! A credential is either typed in by the user (never written anywhere) or
//! read from something provisioned before the session starts: a secrets
//! file, an environment variable, or the config file itself.

use inquire::{InquireError, Password, PasswordDisplayMode};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use crate::conversation::SessionError;

/// Default key looked up in the secrets file and environment.
pub const DEFAULT_SECRET_KEY: &str = "GOOGLE_API_KEY";

/// A single place a credential may be read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialSource {
    /// Masked prompt on the terminal.
    Interactive,
    /// A key in a flat `KEY = "value"` TOML file.
    SecretStore { path: PathBuf, key: String },
    Environment { var: String },
    /// `api_key` written directly in config.toml.
    Inline(String),
}

impl CredentialSource {
    /// Reads the credential. `Ok(None)` means the source has no value.
    pub fn fetch(&self) -> Result<Option<String>, SessionError> {
        match self {
            Self::Interactive => prompt_for_key(),
            Self::SecretStore { path, key } => SecretStore::open(path.clone())?.get(key),
            Self::Environment { var } => Ok(std::env::var(var).ok().filter(|v| !v.is_empty())),
            Self::Inline(value) => Ok(Some(value.clone()).filter(|v| !v.is_empty())),
        }
    }

    /// Actionable hint for error messages when this source had no value.
    pub fn hint(&self) -> String {
        match self {
            Self::Interactive => "Enter your API key when prompted".to_string(),
            Self::SecretStore { path, key } => format!(
                "Add it to {}:\n  {key} = \"your-api-key\"",
                path.display()
            ),
            Self::Environment { var } => {
                format!("Set the {var} environment variable:\n  export {var}=\"your-api-key\"")
            }
            Self::Inline(_) => "Set api_key for the provider in config.toml".to_string(),
        }
    }
}

impl fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Interactive => f.write_str("interactive prompt"),
            Self::SecretStore { path, key } => write!(f, "{key} in {}", path.display()),
            Self::Environment { var } => write!(f, "${var}"),
            Self::Inline(_) => f.write_str("config file"),
        }
    }
}

/// Tries each source in order and returns the first value found, together
/// with the source it came from.
pub fn fetch_first(
    sources: &[CredentialSource],
) -> Result<Option<(String, &CredentialSource)>, SessionError> {
    for source in sources {
        if let Some(value) = source.fetch()? {
            tracing::debug!(source = %source, "credential found");
            return Ok(Some((value, source)));
        }
    }
    Ok(None)
}

fn prompt_for_key() -> Result<Option<String>, SessionError> {
    let answer = Password::new("API key:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .with_help_message("Used for this session only, never saved")
        .prompt();

    match answer {
        Ok(key) => Ok(Some(key).filter(|k| !k.trim().is_empty())),
        Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => Ok(None),
        Err(e) => Err(SessionError::Configuration(format!(
            "Failed to read the API key from the terminal: {e}"
        ))),
    }
}

/// Read-only key-value secrets file.
#[derive(Debug, Default)]
pub struct SecretStore {
    path: PathBuf,
    values: HashMap<String, toml::Value>,
}

impl SecretStore {
    /// Loads the file. A missing file is an empty store.
    pub fn open(path: PathBuf) -> Result<Self, SessionError> {
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Ok(Self {
                    path,
                    values: HashMap::new(),
                });
            }
            Err(e) => {
                return Err(SessionError::Configuration(format!(
                    "Failed to read secrets file {}: {e}",
                    path.display()
                )));
            }
        };

        let values = toml::from_str(&contents).map_err(|e| {
            SessionError::Configuration(format!(
                "Failed to parse secrets file {}: {e}",
                path.display()
            ))
        })?;

        Ok(Self { path, values })
    }

    pub fn get(&self, key: &str) -> Result<Option<String>, SessionError> {
        match self.values.get(key) {
            None => Ok(None),
            Some(toml::Value::String(value)) => Ok(Some(value.clone()).filter(|v| !v.is_empty())),
            Some(other) => Err(SessionError::Configuration(format!(
                "Secret '{key}' in {} must be a string, found {}",
                self.path.display(),
                other.type_str()
            ))),
        }
    }
}
