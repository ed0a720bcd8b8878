//! Google Gemini `generateContent` client.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::fault::error_detail;
use super::{BackendFault, ModelClient, ModelRequest};
use crate::conversation::Role;

pub const DEFAULT_GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com";

pub struct GeminiClient {
    client: Client,
    endpoint: String,
    model: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(
        endpoint: &str,
        model: &str,
        api_key: String,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            // Accept both "gemini-2.5-flash" and "models/gemini-2.5-flash"
            model: model.trim_start_matches("models/").to_string(),
            api_key,
        })
    }

    fn model_url(&self) -> String {
        format!("{}/v1beta/models/{}", self.endpoint, self.model)
    }

    fn generate_url(&self) -> String {
        format!("{}:generateContent", self.model_url())
    }
}

#[async_trait]
impl ModelClient for GeminiClient {
    fn model(&self) -> &str {
        &self.model
    }

    async fn verify(&self) -> Result<(), BackendFault> {
        let url = self.model_url();
        let response = self
            .client
            .get(&url)
            .header("x-goog-api-key", &self.api_key)
            .send()
            .await
            .map_err(|e| BackendFault::from_transport(&e, &url))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(classify_error(status, &body))
    }

    async fn generate(&self, request: &ModelRequest<'_>) -> Result<Option<String>, BackendFault> {
        let url = self.generate_url();
        let body = build_request(request);

        debug!(
            model = %self.model,
            messages = request.messages.len(),
            "sending generateContent request"
        );

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| BackendFault::from_transport(&e, &url))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| BackendFault::network(format!("Failed to read response body: {e}")))?;

        if !status.is_success() {
            return Err(classify_error(status, &text));
        }

        parse_response(&text)
    }
}

/// Gemini reports a bad key as 400 INVALID_ARGUMENT rather than 401.
fn classify_error(status: reqwest::StatusCode, body: &str) -> BackendFault {
    let detail = error_detail(body);
    if status == reqwest::StatusCode::BAD_REQUEST && detail.contains("API key") {
        return BackendFault::auth(format!("Authentication failed: {detail}"));
    }
    BackendFault::from_status(status, &detail)
}

fn build_request<'a>(request: &ModelRequest<'a>) -> GenerateContentRequest<'a> {
    let contents = request
        .messages
        .iter()
        .map(|turn| Content {
            role: Some(match turn.role() {
                Role::User => "user",
                Role::Assistant => "model",
            }),
            parts: vec![Part {
                text: turn.content(),
            }],
        })
        .collect();

    GenerateContentRequest {
        contents,
        system_instruction: request.system.map(|text| Content {
            role: None,
            parts: vec![Part { text }],
        }),
        generation_config: request
            .temperature
            .map(|temperature| GenerationConfig { temperature }),
    }
}

fn parse_response(body: &str) -> Result<Option<String>, BackendFault> {
    let response: GenerateContentResponse = serde_json::from_str(body)
        .map_err(|e| BackendFault::malformed(format!("Failed to parse response: {e}")))?;

    let Some(candidate) = response.candidates.into_iter().next() else {
        if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
            return Err(BackendFault::invalid_request(format!(
                "The prompt was blocked by the model ({reason})"
            )));
        }
        return Ok(None);
    };

    let text: String = candidate
        .content
        .map(|c| c.parts)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|p| p.text)
        .collect();

    if text.is_empty() {
        debug!(finish_reason = ?candidate.finish_reason, "candidate carried no text");
        Ok(None)
    } else {
        Ok(Some(text))
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::backend::FaultKind;
    use crate::conversation::Turn;

    fn client() -> GeminiClient {
        GeminiClient::new(
            "https://example.test/",
            "models/gemini-2.5-flash",
            "key".to_string(),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[test]
    fn test_urls() {
        let client = client();
        assert_eq!(client.model(), "gemini-2.5-flash");
        assert_eq!(
            client.generate_url(),
            "https://example.test/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }

    #[test]
    fn test_build_request_maps_roles() {
        let history = [Turn::user("hi"), Turn::assistant("hello"), Turn::user("bye")];
        let request = ModelRequest::new(&history);

        let json = serde_json::to_value(build_request(&request)).unwrap();

        assert_eq!(json["contents"][0]["role"], "user");
        assert_eq!(json["contents"][1]["role"], "model");
        assert_eq!(json["contents"][1]["parts"][0]["text"], "hello");
        assert_eq!(json["contents"][2]["parts"][0]["text"], "bye");
        assert!(json.get("systemInstruction").is_none());
        assert!(json.get("generationConfig").is_none());
    }

    #[test]
    fn test_build_request_with_system_and_temperature() {
        let history = [Turn::user("hi")];
        let request = ModelRequest {
            system: Some("Be brief."),
            messages: &history,
            temperature: Some(0.5),
        };

        let json = serde_json::to_value(build_request(&request)).unwrap();

        assert_eq!(json["systemInstruction"]["parts"][0]["text"], "Be brief.");
        assert!(json["systemInstruction"].get("role").is_none());
        assert_eq!(json["generationConfig"]["temperature"], 0.5);
    }

    #[test]
    fn test_parse_response_joins_parts() {
        let body = r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"Hello"},{"text":" there"}]},"finishReason":"STOP"}]}"#;
        assert_eq!(parse_response(body).unwrap(), Some("Hello there".to_string()));
    }

    #[test]
    fn test_parse_response_without_text() {
        let body = r#"{"candidates":[{"finishReason":"MAX_TOKENS"}]}"#;
        assert_eq!(parse_response(body).unwrap(), None);

        let body = r#"{"candidates":[]}"#;
        assert_eq!(parse_response(body).unwrap(), None);
    }

    #[test]
    fn test_parse_response_blocked_prompt() {
        let body = r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#;
        let fault = parse_response(body).unwrap_err();
        assert_eq!(fault.kind, FaultKind::InvalidRequest);
        assert!(fault.to_string().contains("SAFETY"));
    }

    #[test]
    fn test_parse_response_malformed() {
        let fault = parse_response("<html>").unwrap_err();
        assert_eq!(fault.kind, FaultKind::MalformedResponse);
    }

    #[test]
    fn test_invalid_key_is_auth_fault() {
        let body = r#"{"error":{"code":400,"message":"API key not valid. Please pass a valid API key.","status":"INVALID_ARGUMENT"}}"#;
        let fault = classify_error(reqwest::StatusCode::BAD_REQUEST, body);
        assert_eq!(fault.kind, FaultKind::Auth);
    }

    #[test]
    fn test_other_bad_request_stays_invalid_request() {
        let body = r#"{"error":{"code":400,"message":"Invalid JSON payload","status":"INVALID_ARGUMENT"}}"#;
        let fault = classify_error(reqwest::StatusCode::BAD_REQUEST, body);
        assert_eq!(fault.kind, FaultKind::InvalidRequest);
    }
}
