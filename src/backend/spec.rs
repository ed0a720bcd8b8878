use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use super::{
    AgentBackend, AgentSettings, BackendFactory, ChatBackend, DirectBackend, GeminiClient,
    ModelClient, OpenAiClient,
};
use crate::conversation::SessionError;

/// Wire protocol spoken by a provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Gemini,
    /// Any OpenAI-compatible `/v1/chat/completions` endpoint.
    Openai,
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gemini => f.write_str("gemini"),
            Self::Openai => f.write_str("openai"),
        }
    }
}

/// How the conversation reaches the model.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum AccessStyle {
    /// Raw model call with the conversation as-is.
    #[default]
    Direct,
    /// Agent wrapper with a system prompt and an empty tool list.
    Agent,
}

impl fmt::Display for AccessStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Direct => f.write_str("direct"),
            Self::Agent => f.write_str("agent"),
        }
    }
}

/// Everything needed to build a backend except the credential.
#[derive(Debug, Clone)]
pub struct BackendSpec {
    pub kind: ProviderKind,
    pub endpoint: String,
    pub model: String,
    pub style: AccessStyle,
    pub agent: AgentSettings,
    pub timeout: Duration,
    pub requires_credential: bool,
}

impl BackendSpec {
    fn build_client(&self, credential: Option<&str>) -> Result<Box<dyn ModelClient>, SessionError> {
        let client: Box<dyn ModelClient> = match self.kind {
            ProviderKind::Gemini => {
                let api_key = credential.ok_or_else(|| {
                    SessionError::Authentication("The Gemini API requires an API key".to_string())
                })?;
                Box::new(
                    GeminiClient::new(&self.endpoint, &self.model, api_key.to_string(), self.timeout)
                        .map_err(client_error)?,
                )
            }
            ProviderKind::Openai => Box::new(
                OpenAiClient::new(
                    &self.endpoint,
                    &self.model,
                    credential.map(str::to_string),
                    self.timeout,
                )
                .map_err(client_error)?,
            ),
        };
        Ok(client)
    }
}

fn client_error(err: reqwest::Error) -> SessionError {
    SessionError::Configuration(format!("Failed to create HTTP client: {err}"))
}

impl BackendFactory for BackendSpec {
    fn requires_credential(&self) -> bool {
        self.requires_credential
    }

    fn create(&self, credential: Option<&str>) -> Result<Box<dyn ChatBackend>, SessionError> {
        let client = self.build_client(credential)?;

        Ok(match self.style {
            AccessStyle::Direct => Box::new(DirectBackend::new(client)),
            AccessStyle::Agent => Box::new(AgentBackend::new(client, self.agent.clone())),
        })
    }
}
