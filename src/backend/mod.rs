//! Remote chat backends.
//!
//! A [`ChatBackend`] answers a conversation given its full history. Two access
//! styles are provided on top of a [`ModelClient`]:
//!
//! - [`DirectBackend`] sends the history straight to the model.
//! - [`AgentBackend`] wraps the model in an agent with a system prompt and an
//!   empty tool list.
//!
//! Model clients exist for the Gemini API ([`GeminiClient`]) and for
//! OpenAI-compatible endpoints ([`OpenAiClient`]).

use async_trait::async_trait;

use crate::conversation::{SessionError, Turn};

mod agent;
mod direct;
mod fault;
mod gemini;
mod openai;
mod spec;

pub use agent::{AgentBackend, AgentSettings, DEFAULT_SYSTEM_PROMPT, DEFAULT_TEMPERATURE, NO_ANSWER};
pub use direct::DirectBackend;
pub use fault::{BackendFault, FaultKind};
pub use gemini::{DEFAULT_GEMINI_ENDPOINT, GeminiClient};
pub use openai::OpenAiClient;
pub use spec::{AccessStyle, BackendSpec, ProviderKind};

/// Answers a conversation.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Short human-readable description, e.g. `direct gemini-2.5-flash`.
    fn describe(&self) -> String;

    /// Checks that the backend accepts the credential it was built with.
    async fn verify(&self) -> Result<(), BackendFault> {
        Ok(())
    }

    /// Sends the full conversation so far and returns the answer text.
    ///
    /// The last turn in `history` is the user turn being answered.
    async fn send(&self, history: &[Turn]) -> Result<String, BackendFault>;
}

/// One request to a model.
#[derive(Debug, Clone, Copy)]
pub struct ModelRequest<'a> {
    pub system: Option<&'a str>,
    pub messages: &'a [Turn],
    pub temperature: Option<f32>,
}

impl<'a> ModelRequest<'a> {
    pub const fn new(messages: &'a [Turn]) -> Self {
        Self {
            system: None,
            messages,
            temperature: None,
        }
    }
}

/// Low-level access to a hosted model.
#[async_trait]
pub trait ModelClient: Send + Sync {
    fn model(&self) -> &str;

    async fn verify(&self) -> Result<(), BackendFault>;

    /// Returns the generated text, or `None` if the response carried no text.
    async fn generate(&self, request: &ModelRequest<'_>) -> Result<Option<String>, BackendFault>;
}

/// Builds a backend from a credential.
///
/// Held by the session so that a reset followed by a fresh initialize can
/// build a new backend.
pub trait BackendFactory: Send + Sync {
    /// Whether [`create`](Self::create) needs a credential at all. Local
    /// OpenAI-compatible servers usually don't.
    fn requires_credential(&self) -> bool {
        true
    }

    fn create(&self, credential: Option<&str>) -> Result<Box<dyn ChatBackend>, SessionError>;
}
