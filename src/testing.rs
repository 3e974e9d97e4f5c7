//! Mock implementations for testing
//!
//! These mocks enable driving the reasoning loop without real I/O.

use crate::llm::{LlmError, LlmRequest, LlmResponse, LlmService};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

/// Mock LLM service that returns queued responses
pub struct MockLlmService {
    responses: Mutex<VecDeque<Result<LlmResponse, LlmError>>>,
    /// Returned once the queue is exhausted
    fallback: Mutex<Option<String>>,
    model_id: String,
    /// Record of all requests made
    pub requests: Mutex<Vec<LlmRequest>>,
}

impl MockLlmService {
    pub fn new(model_id: impl Into<String>) -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            fallback: Mutex::new(None),
            model_id: model_id.into(),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue a successful response with the given text
    pub fn queue_text(&self, text: impl Into<String>) {
        self.responses
            .lock()
            .unwrap()
            .push_back(Ok(LlmResponse::text(text)));
    }

    /// Queue an error response
    pub fn queue_error(&self, error: LlmError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    /// Answer with this text forever once the queue runs dry
    pub fn repeat_text(&self, text: impl Into<String>) {
        *self.fallback.lock().unwrap() = Some(text.into());
    }

    /// Get recorded requests
    pub fn recorded_requests(&self) -> Vec<LlmRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl LlmService for MockLlmService {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        self.requests.lock().unwrap().push(request.clone());
        if let Some(queued) = self.responses.lock().unwrap().pop_front() {
            return queued;
        }
        match self.fallback.lock().unwrap().as_ref() {
            Some(text) => Ok(LlmResponse::text(text.clone())),
            None => Err(LlmError::network("No mock response queued")),
        }
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

/// Wire-format reasoning step
pub fn step_json(title: &str, content: &str, next_action: &str) -> String {
    serde_json::json!({
        "title": title,
        "content": content,
        "next_action": next_action,
    })
    .to_string()
}

/// Wire-format final answer
pub fn answer_json(title: &str, content: &str) -> String {
    serde_json::json!({ "title": title, "content": content }).to_string()
}
