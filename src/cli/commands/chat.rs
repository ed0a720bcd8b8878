//! Chat command handler.

use anyhow::Result;

use crate::chat::ChatSession;
use crate::cli::ChatArgs;
use crate::config::{ConfigManager, ResolveOptions, ResolvedConfig, resolve_config};
use crate::conversation::{ConversationSession, SessionError};
use crate::credential::{self, CredentialSource};
use crate::ui::Spinner;

/// Resolves configuration, obtains the credential, initializes the
/// conversation and runs the chat loop.
///
/// Every failure before the loop starts is a [`SessionError`] setup error.
pub async fn run_chat(args: &ChatArgs) -> Result<()> {
    let config = load_config(args)?;
    let found = credential::fetch_first(&config.credential_sources)?;

    let (credential, source) = match found {
        Some((value, source)) => (Some(value), Some(source.clone())),
        None if config.backend.requires_credential => {
            return Err(missing_credential(&config.credential_sources).into());
        }
        None => (None, None),
    };

    let mut conversation = ConversationSession::new(Box::new(config.backend.clone()))
        .with_verification(!args.no_verify);

    let initialized = {
        let _spinner = Spinner::new("Connecting...");
        conversation.initialize(credential.as_deref()).await
    };
    initialized.map_err(|e| name_source(e, source.as_ref()))?;

    ChatSession::new(config, conversation, credential).run().await
}

fn load_config(args: &ChatArgs) -> Result<ResolvedConfig, SessionError> {
    let setup_error = |e: anyhow::Error| SessionError::Configuration(format!("{e:#}"));

    let config_file = ConfigManager::new().load_or_default().map_err(setup_error)?;
    let options = ResolveOptions {
        provider: args.provider.clone(),
        model: args.model.clone(),
        mode: args.mode,
        key_source: args.key_source,
    };

    resolve_config(&options, &config_file).map_err(setup_error)
}

fn missing_credential(sources: &[CredentialSource]) -> SessionError {
    let hints: Vec<String> = sources
        .iter()
        .filter(|s| **s != CredentialSource::Interactive)
        .map(CredentialSource::hint)
        .collect();

    if hints.is_empty() {
        return SessionError::Authentication("No API key provided".to_string());
    }

    SessionError::Authentication(format!(
        "No API key provided\n\n{}",
        hints.join("\n\nor ")
    ))
}

fn name_source(err: SessionError, source: Option<&CredentialSource>) -> SessionError {
    match (err, source) {
        (SessionError::Authentication(message), Some(source)) => {
            SessionError::Authentication(format!("{message}\n\nThe key was read from {source}."))
        }
        (err, _) => err,
    }
}
