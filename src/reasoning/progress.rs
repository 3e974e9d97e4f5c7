//! Presentation-facing progress snapshots

use serde::Serialize;
use std::time::Duration;

/// Reserved title of the terminal record
pub const FINAL_ANSWER_TITLE: &str = "Final Answer";

/// Prefix marking content that describes a failure
pub const WARNING_MARKER: &str = "⚠️ ";

/// What a record stands for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    Reasoning,
    /// A reasoning step that could not be obtained from the model
    Failed,
    FinalAnswer,
}

/// One displayable entry of a reasoning run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepRecord {
    pub title: String,
    pub content: String,
    pub elapsed_secs: f64,
    pub kind: StepKind,
    /// Set when the model could not supply this record
    pub failed: bool,
}

impl StepRecord {
    pub fn reasoning(number: u32, title: &str, content: &str, elapsed: Duration) -> Self {
        Self {
            title: format!("Step {number}: {title}"),
            content: content.to_string(),
            elapsed_secs: elapsed.as_secs_f64(),
            kind: StepKind::Reasoning,
            failed: false,
        }
    }

    pub fn failed(number: u32, message: &str, elapsed: Duration) -> Self {
        Self {
            title: format!("Step {number}: Error"),
            content: format!("{WARNING_MARKER}{message}"),
            elapsed_secs: elapsed.as_secs_f64(),
            kind: StepKind::Failed,
            failed: true,
        }
    }

    /// The terminal record; `failure` replaces the content with a warning
    pub fn final_answer(content: &str, failure: Option<&str>, elapsed: Duration) -> Self {
        let content = match failure {
            Some(message) => format!("{WARNING_MARKER}{message}"),
            None => content.to_string(),
        };
        Self {
            title: FINAL_ANSWER_TITLE.to_string(),
            content,
            elapsed_secs: elapsed.as_secs_f64(),
            kind: StepKind::FinalAnswer,
            failed: failure.is_some(),
        }
    }

    pub fn is_final_answer(&self) -> bool {
        self.kind == StepKind::FinalAnswer
    }

    pub fn is_failed(&self) -> bool {
        self.failed
    }
}

/// Snapshot handed to the presentation layer after each step
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Progress {
    /// Every record so far, in order
    pub steps: Vec<StepRecord>,
    /// Set only on the last snapshot of a run
    pub total_elapsed_secs: Option<f64>,
}

impl Progress {
    pub fn is_complete(&self) -> bool {
        self.total_elapsed_secs.is_some()
    }

    pub fn latest(&self) -> Option<&StepRecord> {
        self.steps.last()
    }

    pub fn final_answer(&self) -> Option<&StepRecord> {
        self.steps.iter().find(|s| s.is_final_answer())
    }

    pub fn intermediate_steps(&self) -> impl Iterator<Item = &StepRecord> {
        self.steps.iter().filter(|s| !s.is_final_answer())
    }
}
