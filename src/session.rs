//! Per-session chat history kept by the presentation layer
//!
//! Lives only as long as the process; nothing is persisted.

use crate::reasoning::Progress;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// One completed query and its answer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatTurn {
    pub prompt: String,
    pub answer: String,
    pub elapsed_secs: f64,
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct SessionHistory {
    turns: Vec<ChatTurn>,
}

impl SessionHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a finished run. Returns `None` for a snapshot that is not the
    /// terminal one.
    pub fn record(&mut self, prompt: &str, progress: &Progress) -> Option<&ChatTurn> {
        let elapsed_secs = progress.total_elapsed_secs?;
        let answer = progress.final_answer()?.content.clone();

        self.turns.push(ChatTurn {
            prompt: prompt.to_string(),
            answer,
            elapsed_secs,
            completed_at: Utc::now(),
        });
        self.turns.last()
    }

    pub fn turns(&self) -> &[ChatTurn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}
