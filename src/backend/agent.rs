use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{BackendFault, ChatBackend, ModelClient, ModelRequest};
use crate::conversation::Turn;

pub const DEFAULT_SYSTEM_PROMPT: &str =
    "You are a helpful, friendly assistant. Respond concisely and clearly.";

pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// The agent's answer when the model produced no message.
pub const NO_ANSWER: &str = "I'm sorry, I couldn't generate a response.";

/// Agent settings from the `[agent]` section of config.toml.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSettings {
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

fn default_system_prompt() -> String {
    DEFAULT_SYSTEM_PROMPT.to_string()
}

const fn default_temperature() -> f32 {
    DEFAULT_TEMPERATURE
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            system_prompt: default_system_prompt(),
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

/// Wraps a model in a single-step agent with a system prompt and no tools.
///
/// With an empty tool list the model can never request a tool call, so the
/// agent loop ends after the first model message and that message is the
/// answer.
pub struct AgentBackend {
    client: Box<dyn ModelClient>,
    settings: AgentSettings,
}

impl AgentBackend {
    pub fn new(client: Box<dyn ModelClient>, settings: AgentSettings) -> Self {
        Self { client, settings }
    }
}

#[async_trait]
impl ChatBackend for AgentBackend {
    fn describe(&self) -> String {
        format!("agent {}", self.client.model())
    }

    async fn verify(&self) -> Result<(), BackendFault> {
        self.client.verify().await
    }

    async fn send(&self, history: &[Turn]) -> Result<String, BackendFault> {
        let request = ModelRequest {
            system: Some(&self.settings.system_prompt),
            messages: history,
            temperature: Some(self.settings.temperature),
        };

        let answer = self.client.generate(&request).await?;
        Ok(answer.unwrap_or_else(|| NO_ANSWER.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::backend::FaultKind;
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Clone, PartialEq)]
    struct Seen {
        system: Option<String>,
        temperature: Option<f32>,
        messages: Vec<String>,
    }

    struct ScriptedModel {
        reply: Result<Option<String>, FaultKind>,
        seen: Arc<Mutex<Option<Seen>>>,
    }

    #[async_trait]
    impl ModelClient for ScriptedModel {
        fn model(&self) -> &str {
            "scripted"
        }

        async fn verify(&self) -> Result<(), BackendFault> {
            Ok(())
        }

        async fn generate(
            &self,
            request: &ModelRequest<'_>,
        ) -> Result<Option<String>, BackendFault> {
            *self.seen.lock().unwrap() = Some(Seen {
                system: request.system.map(str::to_string),
                temperature: request.temperature,
                messages: request
                    .messages
                    .iter()
                    .map(|t| t.content().to_string())
                    .collect(),
            });
            self.reply
                .clone()
                .map_err(|kind| BackendFault::new(kind, "scripted fault"))
        }
    }

    fn agent(reply: Result<Option<String>, FaultKind>) -> (AgentBackend, Arc<Mutex<Option<Seen>>>) {
        let seen = Arc::new(Mutex::new(None));
        let client = ScriptedModel {
            reply,
            seen: Arc::clone(&seen),
        };
        (
            AgentBackend::new(Box::new(client), AgentSettings::default()),
            seen,
        )
    }

    #[tokio::test]
    async fn test_agent_adds_system_prompt_and_temperature() {
        let (backend, seen) = agent(Ok(Some("Sure!".to_string())));
        let history = [Turn::user("hi"), Turn::assistant("hello"), Turn::user("help me")];

        let answer = backend.send(&history).await.unwrap();

        assert_eq!(answer, "Sure!");
        let seen = seen.lock().unwrap().clone().unwrap();
        assert_eq!(seen.system.as_deref(), Some(DEFAULT_SYSTEM_PROMPT));
        assert_eq!(seen.temperature, Some(DEFAULT_TEMPERATURE));
        assert_eq!(seen.messages, vec!["hi", "hello", "help me"]);
    }

    #[tokio::test]
    async fn test_agent_without_content_answers_apology() {
        let (backend, _) = agent(Ok(None));
        let answer = backend.send(&[Turn::user("hi")]).await.unwrap();
        assert_eq!(answer, NO_ANSWER);
    }

    #[tokio::test]
    async fn test_agent_propagates_faults() {
        let (backend, _) = agent(Err(FaultKind::RateLimit));
        let fault = backend.send(&[Turn::user("hi")]).await.unwrap_err();
        assert_eq!(fault.kind, FaultKind::RateLimit);
    }

    #[test]
    fn test_agent_settings_defaults_from_empty_toml() {
        let settings: AgentSettings = toml::from_str("").unwrap();
        assert_eq!(settings, AgentSettings::default());
    }

    #[test]
    fn test_agent_settings_partial_toml() {
        let settings: AgentSettings = toml::from_str("temperature = 0.2").unwrap();
        assert_eq!(settings.system_prompt, DEFAULT_SYSTEM_PROMPT);
        assert!((settings.temperature - 0.2).abs() < f32::EPSILON);
    }
}
