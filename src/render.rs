//! Terminal rendering of reasoning progress

use crate::reasoning::{Progress, StepRecord};
use crate::session::ChatTurn;
use std::io::{self, Write};

/// Writes each record once as snapshots arrive
#[derive(Debug, Default)]
pub struct ProgressRenderer {
    shown: usize,
}

impl ProgressRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Render the records of `progress` not shown yet
    pub fn render(&mut self, out: &mut impl Write, progress: &Progress) -> io::Result<()> {
        for record in progress.steps.iter().skip(self.shown) {
            if record.is_final_answer() {
                write_final_answer(out, record)?;
            } else {
                write_step(out, record)?;
            }
        }
        self.shown = progress.steps.len();

        if let Some(total) = progress.total_elapsed_secs {
            writeln!(out, "Total thinking time: {total:.2} seconds")?;
        }
        out.flush()
    }
}

fn write_step(out: &mut impl Write, record: &StepRecord) -> io::Result<()> {
    writeln!(out, "▸ {} ({:.2}s)", record.title, record.elapsed_secs)?;
    for line in record.content.lines() {
        writeln!(out, "    {line}")?;
    }
    writeln!(out)
}

fn write_final_answer(out: &mut impl Write, record: &StepRecord) -> io::Result<()> {
    writeln!(out, "### {}", record.title)?;
    writeln!(out, "{}", record.content)?;
    writeln!(out)
}

/// One-line summary of a past turn
pub fn history_line(index: usize, turn: &ChatTurn) -> String {
    let answer = turn.answer.lines().next().unwrap_or_default();
    format!(
        "{:>3}. [{}] {} → {} ({:.2}s)",
        index + 1,
        turn.completed_at.format("%H:%M:%S"),
        turn.prompt,
        answer,
        turn.elapsed_secs
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::time::Duration;

    fn render_all(snapshots: &[Progress]) -> String {
        let mut renderer = ProgressRenderer::new();
        let mut out = Vec::new();
        for progress in snapshots {
            renderer.render(&mut out, progress).unwrap();
        }
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_each_record_rendered_once() {
        let first = StepRecord::reasoning(1, "Decompose", "split\nit", Duration::from_secs(1));
        let answer = StepRecord::final_answer("42", None, Duration::from_secs(2));
        let snapshots = vec![
            Progress {
                steps: vec![first.clone()],
                total_elapsed_secs: None,
            },
            Progress {
                steps: vec![first, answer],
                total_elapsed_secs: Some(3.0),
            },
        ];

        let text = render_all(&snapshots);
        assert_eq!(text.matches("Step 1: Decompose").count(), 1);
        assert!(text.contains("    split\n    it\n"));
        assert!(text.contains("### Final Answer\n42\n"));
        assert!(text.ends_with("Total thinking time: 3.00 seconds\n"));
    }

    #[test]
    fn test_history_line() {
        let turn = ChatTurn {
            prompt: "capital of France?".to_string(),
            answer: "Paris\nbecause reasons".to_string(),
            elapsed_secs: 1.234,
            completed_at: Utc::now(),
        };
        let line = history_line(0, &turn);
        assert!(line.starts_with("  1. ["));
        assert!(line.ends_with("capital of France? → Paris (1.23s)"));
    }
}
