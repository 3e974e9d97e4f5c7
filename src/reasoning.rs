//! Multi-step reasoning orchestration
//!
//! A run seeds a conversation log, asks the model for one structured
//! reasoning step at a time until it signals it is done (or the step ceiling
//! is reached), then asks for a final answer. Progress is exposed as a lazy
//! stream of snapshots; the stream is finite and cannot be restarted, and
//! dropping it abandons the run.

mod progress;

#[cfg(test)]
mod proptests;

pub use progress::{Progress, StepKind, StepRecord, FINAL_ANSWER_TITLE, WARNING_MARKER};

use crate::llm::{LlmMessage, LlmService};
use crate::schema::{FinalAnswer, NextAction, ReasoningStep, StructuredOutput};
use crate::structured::{StructuredClient, StructuredResult};
use crate::system_prompt::{ACKNOWLEDGEMENT, FINAL_ANSWER_REQUEST, REASONING_SYSTEM_PROMPT};
use futures::stream::{self, Stream};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::Instrument;

/// Step ceiling and output budgets of a run
#[derive(Debug, Clone)]
pub struct ReasoningLimits {
    /// Reasoning stops once the step counter exceeds this
    pub max_steps: u32,
    pub step_max_tokens: u32,
    pub final_max_tokens: u32,
}

impl Default for ReasoningLimits {
    fn default() -> Self {
        Self {
            max_steps: 25,
            step_max_tokens: 300,
            final_max_tokens: 4000,
        }
    }
}

/// Drives reasoning runs against one structured client
pub struct Reasoner<L> {
    client: Arc<StructuredClient<L>>,
    limits: ReasoningLimits,
}

impl<L> Clone for Reasoner<L> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
            limits: self.limits.clone(),
        }
    }
}

impl<L: LlmService> Reasoner<L> {
    pub fn new(client: StructuredClient<L>) -> Self {
        Self {
            client: Arc::new(client),
            limits: ReasoningLimits::default(),
        }
    }

    pub fn with_limits(mut self, limits: ReasoningLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn limits(&self) -> &ReasoningLimits {
        &self.limits
    }

    /// Start a run for `prompt`.
    ///
    /// Every item carries all records so far. Intermediate items have no
    /// total; the last item carries the total elapsed time and is followed by
    /// nothing.
    pub fn run(&self, prompt: impl Into<String>) -> impl Stream<Item = Progress> {
        let run_id = uuid::Uuid::new_v4();
        let span = tracing::info_span!("reasoning_run", %run_id, model = %self.client.model_id());
        let state = RunState::new(
            Arc::clone(&self.client),
            self.limits.clone(),
            prompt.into(),
        );

        stream::unfold(state, move |mut state| {
            let span = span.clone();
            async move {
                let progress = match state.phase {
                    Phase::Reasoning => state.reason_step().await,
                    Phase::FinalAnswer => state.final_answer().await,
                    Phase::Done => return None,
                };
                Some((progress, state))
            }
            .instrument(span)
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Reasoning,
    FinalAnswer,
    Done,
}

/// Mutable state of a single run; owns the conversation log
struct RunState<L> {
    client: Arc<StructuredClient<L>>,
    limits: ReasoningLimits,
    messages: Vec<LlmMessage>,
    steps: Vec<StepRecord>,
    step_count: u32,
    total: Duration,
    phase: Phase,
}

impl<L: LlmService> RunState<L> {
    fn new(client: Arc<StructuredClient<L>>, limits: ReasoningLimits, prompt: String) -> Self {
        let messages = vec![
            LlmMessage::system(REASONING_SYSTEM_PROMPT),
            LlmMessage::user(prompt),
            LlmMessage::assistant(ACKNOWLEDGEMENT),
        ];

        Self {
            client,
            limits,
            messages,
            steps: Vec::new(),
            step_count: 1,
            total: Duration::ZERO,
            phase: Phase::Reasoning,
        }
    }

    async fn reason_step(&mut self) -> Progress {
        let number = self.step_count;
        let start = Instant::now();
        let result = self
            .client
            .call::<ReasoningStep>(&mut self.messages, self.limits.step_max_tokens)
            .await;
        let elapsed = start.elapsed();
        self.total += elapsed;

        let (record, step) = match result {
            StructuredResult::Valid(step) => (
                StepRecord::reasoning(number, &step.title, &step.content, elapsed),
                step,
            ),
            StructuredResult::Failed(failure) => (
                StepRecord::failed(number, &failure.message, elapsed),
                ReasoningStep::error_shaped(failure.message),
            ),
        };
        tracing::info!(
            step = number,
            title = %record.title,
            elapsed_ms = %elapsed.as_millis(),
            "Reasoning step recorded"
        );

        self.messages.push(LlmMessage::assistant(step.to_wire()));
        self.steps.push(record);

        if step.next_action == NextAction::FinalAnswer {
            self.phase = Phase::FinalAnswer;
        } else if number > self.limits.max_steps {
            tracing::info!(
                steps = number,
                max_steps = self.limits.max_steps,
                "Step ceiling reached, requesting final answer"
            );
            self.phase = Phase::FinalAnswer;
        } else {
            self.step_count += 1;
        }

        self.snapshot(None)
    }

    async fn final_answer(&mut self) -> Progress {
        self.messages.push(LlmMessage::user(FINAL_ANSWER_REQUEST));

        let start = Instant::now();
        let result = self
            .client
            .call::<FinalAnswer>(&mut self.messages, self.limits.final_max_tokens)
            .await;
        let elapsed = start.elapsed();
        self.total += elapsed;

        let record = match &result {
            StructuredResult::Valid(answer) => {
                StepRecord::final_answer(answer.content(), None, elapsed)
            }
            StructuredResult::Failed(failure) => {
                StepRecord::final_answer("", Some(failure.message.as_str()), elapsed)
            }
        };
        self.steps.push(record);
        self.phase = Phase::Done;

        tracing::info!(
            steps = self.step_count,
            total_ms = %self.total.as_millis(),
            failed = result.is_failed(),
            "Reasoning run finished"
        );

        self.snapshot(Some(self.total.as_secs_f64()))
    }

    fn snapshot(&self, total_elapsed_secs: Option<f64>) -> Progress {
        Progress {
            steps: self.steps.clone(),
            total_elapsed_secs,
        }
    }
}
