//! Client for OpenAI-compatible `/v1/chat/completions` endpoints
//! (OpenAI, OpenRouter, Ollama, llama.cpp server, ...).

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::fault::error_detail;
use super::{BackendFault, ModelClient, ModelRequest};

pub struct OpenAiClient {
    client: Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
}

impl OpenAiClient {
    /// Local servers such as Ollama need no key, so it is optional here.
    pub fn new(
        endpoint: &str,
        model: &str,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v1/{path}", self.endpoint)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(api_key) => request.header("Authorization", format!("Bearer {api_key}")),
            None => request,
        }
    }
}

#[async_trait]
impl ModelClient for OpenAiClient {
    fn model(&self) -> &str {
        &self.model
    }

    async fn verify(&self) -> Result<(), BackendFault> {
        let url = self.url("models");
        let response = self
            .authorize(self.client.get(&url))
            .send()
            .await
            .map_err(|e| BackendFault::from_transport(&e, &url))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(BackendFault::from_status(status, &error_detail(&body)))
    }

    async fn generate(&self, request: &ModelRequest<'_>) -> Result<Option<String>, BackendFault> {
        let url = self.url("chat/completions");
        let body = build_request(&self.model, request);

        debug!(
            model = %self.model,
            messages = body.messages.len(),
            "sending chat completion request"
        );

        let response = self
            .authorize(self.client.post(&url).json(&body))
            .send()
            .await
            .map_err(|e| BackendFault::from_transport(&e, &url))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| BackendFault::network(format!("Failed to read response body: {e}")))?;

        if !status.is_success() {
            return Err(BackendFault::from_status(status, &error_detail(&text)));
        }

        parse_response(&text)
    }
}

fn build_request<'a>(model: &'a str, request: &ModelRequest<'a>) -> ChatCompletionRequest<'a> {
    let system = request.system.map(|content| Message {
        role: "system",
        content,
    });

    let messages = system
        .into_iter()
        .chain(request.messages.iter().map(|turn| Message {
            role: turn.role().as_str(),
            content: turn.content(),
        }))
        .collect();

    ChatCompletionRequest {
        model,
        messages,
        temperature: request.temperature,
        stream: false,
    }
}

fn parse_response(body: &str) -> Result<Option<String>, BackendFault> {
    let response: ChatCompletionResponse = serde_json::from_str(body)
        .map_err(|e| BackendFault::malformed(format!("Failed to parse response: {e}")))?;

    Ok(response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .filter(|c| !c.is_empty()))
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}
