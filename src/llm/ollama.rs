//! Ollama provider implementation
//!
//! Talks to the `/api/chat` endpoint of a local or remote Ollama server.
//! Structured output is requested through the `format` field, which accepts a
//! JSON schema.

use super::types::{LlmRequest, LlmResponse, Usage};
use super::{LlmError, LlmService};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_OLLAMA_HOST: &str = "http://localhost:11434";

/// Ollama service implementation
pub struct OllamaService {
    client: Client,
    api_url: String,
    model: String,
}

impl OllamaService {
    pub fn new(host: &str, model: impl Into<String>, timeout: Duration) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LlmError::unknown(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_url: format!("{}/api/chat", host.trim_end_matches('/')),
            model: model.into(),
        })
    }

    fn translate_request(&self, request: &LlmRequest) -> OllamaRequest {
        OllamaRequest {
            model: self.model.clone(),
            messages: request
                .messages
                .iter()
                .map(|m| OllamaMessage {
                    role: m.role.as_str().to_string(),
                    content: m.content.clone(),
                })
                .collect(),
            stream: false,
            format: request.schema.clone(),
            options: OllamaOptions {
                temperature: request.temperature,
                num_predict: request.max_tokens,
            },
        }
    }

    fn normalize_response(resp: OllamaResponse) -> LlmResponse {
        LlmResponse {
            text: resp.message.content,
            usage: Usage {
                input_tokens: resp.prompt_eval_count.unwrap_or(0),
                output_tokens: resp.eval_count.unwrap_or(0),
            },
        }
    }
}

#[async_trait]
impl LlmService for OllamaService {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        let ollama_request = self.translate_request(request);

        let response = self
            .client
            .post(&self.api_url)
            .header("content-type", "application/json")
            .json(&ollama_request)
            .send()
            .await
            .map_err(|e| LlmError::from_reqwest(&e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| LlmError::network(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            // Ollama reports failures as {"error": "..."}
            let message = serde_json::from_str::<OllamaErrorResponse>(&body)
                .map_or(body, |e| e.error);
            return Err(LlmError::from_status(status.as_u16(), &message));
        }

        let ollama_response: OllamaResponse = serde_json::from_str(&body).map_err(|e| {
            LlmError::unknown(format!("Failed to parse response: {e} - body: {body}"))
        })?;

        Ok(Self::normalize_response(ollama_response))
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}

// Ollama API types

#[derive(Debug, Serialize)]
struct OllamaRequest {
    model: String,
    messages: Vec<OllamaMessage>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<serde_json::Value>,
    options: OllamaOptions,
}

#[derive(Debug, Serialize, Deserialize)]
struct OllamaMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Debug, Deserialize)]
struct OllamaResponse {
    message: OllamaMessage,
    #[serde(default)]
    prompt_eval_count: Option<u64>,
    #[serde(default)]
    eval_count: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct OllamaErrorResponse {
    error: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::LlmMessage;
    use serde_json::json;

    fn service() -> OllamaService {
        OllamaService::new("http://localhost:11434/", "llama3.1:8b", Duration::from_secs(5))
            .unwrap()
    }

    #[test]
    fn test_api_url_strips_trailing_slash() {
        assert_eq!(service().api_url, "http://localhost:11434/api/chat");
    }

    #[test]
    fn test_translate_request_carries_schema_and_options() {
        let schema = json!({"type": "object"});
        let request = LlmRequest {
            messages: vec![LlmMessage::system("sys"), LlmMessage::user("hi")],
            temperature: 0.2,
            max_tokens: 300,
            schema: Some(schema.clone()),
        };

        let body = serde_json::to_value(service().translate_request(&request)).unwrap();
        assert_eq!(body["model"], "llama3.1:8b");
        assert_eq!(body["stream"], false);
        assert_eq!(body["format"], schema);
        assert_eq!(body["options"]["num_predict"], 300);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "hi");
    }

    #[test]
    fn test_format_omitted_without_schema() {
        let request = LlmRequest {
            messages: vec![LlmMessage::user("hi")],
            temperature: 0.2,
            max_tokens: 10,
            schema: None,
        };
        let body = serde_json::to_value(service().translate_request(&request)).unwrap();
        assert!(body.get("format").is_none());
    }

    #[test]
    fn test_normalize_response() {
        let resp: OllamaResponse = serde_json::from_value(json!({
            "model": "llama3.1:8b",
            "message": {"role": "assistant", "content": "{\"title\":\"x\"}"},
            "done": true,
            "prompt_eval_count": 12,
            "eval_count": 7
        }))
        .unwrap();

        let normalized = OllamaService::normalize_response(resp);
        assert_eq!(normalized.text, "{\"title\":\"x\"}");
        assert_eq!(normalized.usage.input_tokens, 12);
        assert_eq!(normalized.usage.output_tokens, 7);
    }
}
