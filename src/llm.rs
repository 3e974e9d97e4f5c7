//! LLM provider abstraction
//!
//! The model collaborator: a chat-style completion call that takes a message
//! log, a sampling temperature, an output budget, and an optional JSON schema.

mod config;
mod error;
mod ollama;
mod openai;
mod types;

pub use config::{ConfigError, LlmConfig, Provider, REQUEST_TIMEOUT};
pub use error::{LlmError, LlmErrorKind};
pub use ollama::OllamaService;
pub use openai::OpenAIService;
pub use types::*;

use async_trait::async_trait;
use std::sync::Arc;

/// Common interface for LLM providers
#[async_trait]
pub trait LlmService: Send + Sync {
    /// Make a completion request
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError>;

    /// Get the model ID
    fn model_id(&self) -> &str;
}

#[async_trait]
impl<T: LlmService + ?Sized> LlmService for Arc<T> {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        (**self).complete(request).await
    }

    fn model_id(&self) -> &str {
        (**self).model_id()
    }
}

/// Logging wrapper for LLM services
pub struct LoggingService {
    inner: Arc<dyn LlmService>,
    model_id: String,
}

impl LoggingService {
    pub fn new(inner: Arc<dyn LlmService>) -> Self {
        let model_id = inner.model_id().to_string();
        Self { inner, model_id }
    }
}

#[async_trait]
impl LlmService for LoggingService {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        let start = std::time::Instant::now();
        let result = self.inner.complete(request).await;
        let duration = start.elapsed();

        match &result {
            Ok(response) => {
                tracing::info!(
                    model = %self.model_id,
                    duration_ms = %duration.as_millis(),
                    messages = request.messages.len(),
                    max_tokens = request.max_tokens,
                    input_tokens = response.usage.input_tokens,
                    output_tokens = response.usage.output_tokens,
                    "LLM request completed"
                );
                if response.usage.is_zero() {
                    tracing::debug!(model = %self.model_id, "Backend reported no token usage");
                }
            }
            Err(e) => {
                tracing::error!(
                    model = %self.model_id,
                    duration_ms = %duration.as_millis(),
                    error = %e.message,
                    transient = e.kind.is_transient(),
                    "LLM request failed"
                );
            }
        }

        result
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockLlmService;

    #[tokio::test]
    async fn test_logging_service_passes_through() {
        let mock = Arc::new(MockLlmService::new("mock-model"));
        mock.queue_text("hello");
        mock.queue_error(LlmError::network("down"));

        let logged = LoggingService::new(mock.clone());
        assert_eq!(logged.model_id(), "mock-model");

        let request = LlmRequest {
            messages: vec![LlmMessage::user("hi")],
            temperature: 0.2,
            max_tokens: 10,
            schema: None,
        };
        assert_eq!(logged.complete(&request).await.unwrap().text, "hello");
        let err = logged.complete(&request).await.unwrap_err();
        assert_eq!(err.kind, LlmErrorKind::Network);
        assert_eq!(mock.recorded_requests().len(), 2);
    }
}
