use async_trait::async_trait;

use super::{BackendFault, ChatBackend, ModelClient, ModelRequest};
use crate::conversation::Turn;

/// Sends the conversation straight to the model.
pub struct DirectBackend {
    client: Box<dyn ModelClient>,
}

impl DirectBackend {
    pub fn new(client: Box<dyn ModelClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ChatBackend for DirectBackend {
    fn describe(&self) -> String {
        format!("direct {}", self.client.model())
    }

    async fn verify(&self) -> Result<(), BackendFault> {
        self.client.verify().await
    }

    async fn send(&self, history: &[Turn]) -> Result<String, BackendFault> {
        self.client
            .generate(&ModelRequest::new(history))
            .await?
            .ok_or_else(BackendFault::empty_response)
    }
}
