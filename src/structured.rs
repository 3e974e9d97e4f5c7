//! Schema-constrained model calls with bounded retry
//!
//! A call moves through three states: attempting (the model is invoked),
//! validating (its text is checked against the schema), and terminal. A
//! transport failure or a validation failure sends it back to attempting
//! after the policy's backoff while the shared attempt budget lasts; once the
//! budget is spent the call degrades to an error-shaped result instead of
//! returning an error.

use crate::llm::{LlmError, LlmMessage, LlmRequest, LlmService};
use crate::schema::{
    schema_for, validate_as, FinalAnswer, OutputKind, ReasoningStep, StructuredOutput,
    StructuredValue, ValidationError,
};
use crate::system_prompt::corrective_message;
use std::time::Duration;

/// Retry and sampling parameters for structured calls
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts shared by transport and validation failures
    pub max_attempts: u32,
    /// Pause after a failed invocation before the next attempt
    pub backoff: Duration,
    pub temperature: f32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_secs(1),
            temperature: 0.2,
        }
    }
}

/// What made the final attempt fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The model invocation itself failed
    Transport,
    /// The model answered, but not in the required shape
    Validation,
}

/// A structured call that exhausted its attempts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallFailure {
    pub kind: FailureKind,
    /// User-facing description
    pub message: String,
    /// Underlying error of the last attempt
    pub detail: String,
    pub attempts: u32,
}

impl CallFailure {
    fn transport(output: OutputKind, attempts: u32, error: &LlmError) -> Self {
        Self {
            kind: FailureKind::Transport,
            message: format!(
                "Failed to generate {} after {attempts} attempts. Error: {error}",
                output.short_name()
            ),
            detail: error.to_string(),
            attempts,
        }
    }

    fn validation(attempts: u32, error: &ValidationError) -> Self {
        Self {
            kind: FailureKind::Validation,
            message: format!(
                "Failed to generate properly formatted response after {attempts} attempts"
            ),
            detail: error.to_string(),
            attempts,
        }
    }
}

/// Outcome of a structured call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StructuredResult<T> {
    Valid(T),
    Failed(CallFailure),
}

impl<T> StructuredResult<T> {
    pub fn is_failed(&self) -> bool {
        matches!(self, StructuredResult::Failed(_))
    }

    pub fn failure(&self) -> Option<&CallFailure> {
        match self {
            StructuredResult::Valid(_) => None,
            StructuredResult::Failed(failure) => Some(failure),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> StructuredResult<U> {
        match self {
            StructuredResult::Valid(value) => StructuredResult::Valid(f(value)),
            StructuredResult::Failed(failure) => StructuredResult::Failed(failure),
        }
    }
}

impl<T: StructuredOutput> StructuredResult<T> {
    /// The validated value, or the error-shaped stand-in for a failure
    pub fn into_value(self) -> T {
        match self {
            StructuredResult::Valid(value) => value,
            StructuredResult::Failed(failure) => T::error_shaped(failure.message),
        }
    }
}

impl StructuredResult<StructuredValue> {
    /// Untyped counterpart of [`StructuredResult::into_value`]
    pub fn into_structured_value(self, kind: OutputKind) -> StructuredValue {
        match self {
            StructuredResult::Valid(value) => value,
            StructuredResult::Failed(failure) => {
                StructuredValue::error_shaped(kind, failure.message)
            }
        }
    }
}

/// Obtains one valid structured response from the model, masking transient
/// failures
pub struct StructuredClient<L> {
    llm: L,
    policy: RetryPolicy,
}

impl<L: LlmService> StructuredClient<L> {
    pub fn new(llm: L) -> Self {
        Self {
            llm,
            policy: RetryPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn model_id(&self) -> &str {
        self.llm.model_id()
    }

    /// Request a value of type `T` from the model.
    ///
    /// On a validation failure with attempts remaining, a corrective system
    /// message is appended to `messages` so the retry sees it.
    pub async fn call<T: StructuredOutput>(
        &self,
        messages: &mut Vec<LlmMessage>,
        max_tokens: u32,
    ) -> StructuredResult<T> {
        let kind = T::KIND;
        let descriptor = schema_for(kind);
        let schema = descriptor.to_json_schema();
        let max_attempts = self.policy.max_attempts.max(1);
        let mut last_failure = None;

        for attempt in 1..=max_attempts {
            let request = LlmRequest {
                messages: messages.clone(),
                temperature: self.policy.temperature,
                max_tokens,
                schema: Some(schema.clone()),
            };
            let retries_left = attempt < max_attempts;

            match self.llm.complete(&request).await {
                Ok(response) => match validate_as::<T>(&response.text) {
                    Ok(value) => {
                        tracing::debug!(%kind, attempt, "Structured call succeeded");
                        return StructuredResult::Valid(value);
                    }
                    Err(e) => {
                        tracing::warn!(
                            %kind,
                            attempt,
                            max_attempts,
                            error = %e,
                            "Model output failed schema validation"
                        );
                        if retries_left {
                            messages.push(LlmMessage::system(corrective_message(descriptor)));
                            tokio::time::sleep(self.policy.backoff).await;
                        }
                        last_failure = Some(CallFailure::validation(attempt, &e));
                    }
                },
                Err(e) => {
                    tracing::warn!(
                        %kind,
                        attempt,
                        max_attempts,
                        error = %e.message,
                        "Model invocation failed"
                    );
                    if retries_left {
                        tokio::time::sleep(self.policy.backoff).await;
                    }
                    last_failure = Some(CallFailure::transport(kind, attempt, &e));
                }
            }
        }

        let failure = last_failure.unwrap_or_else(|| CallFailure {
            kind: FailureKind::Transport,
            message: format!("Failed to generate {kind}"),
            detail: String::new(),
            attempts: 0,
        });
        tracing::error!(
            %kind,
            attempts = failure.attempts,
            detail = %failure.detail,
            "Structured call exhausted its attempts"
        );
        StructuredResult::Failed(failure)
    }

    /// Like [`StructuredClient::call`], with the shape chosen at runtime
    pub async fn call_kind(
        &self,
        messages: &mut Vec<LlmMessage>,
        max_tokens: u32,
        kind: OutputKind,
    ) -> StructuredResult<StructuredValue> {
        match kind {
            OutputKind::ReasoningStep => self
                .call::<ReasoningStep>(messages, max_tokens)
                .await
                .map(StructuredValue::Step),
            OutputKind::FinalAnswer => self
                .call::<FinalAnswer>(messages, max_tokens)
                .await
                .map(StructuredValue::Answer),
        }
    }
}
