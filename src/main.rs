//! Reasoning chain CLI
//!
//! Asks a language model to reason step by step about each prompt, printing
//! the steps as they arrive. Prompts come from the command line, or one per
//! line on stdin when none are given.

use futures::StreamExt;
use reasoning_chain::llm::{LlmConfig, LlmService};
use reasoning_chain::render::{history_line, ProgressRenderer};
use reasoning_chain::session::SessionHistory;
use reasoning_chain::{Reasoner, StructuredClient};
use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logs go to stderr; stdout is for the reasoning itself
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "reasoning_chain=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let config = LlmConfig::from_env()?;
    let service = config.build_service()?;
    tracing::info!(
        provider = config.provider.display_name(),
        model = %service.model_id(),
        "LLM service initialized"
    );

    let reasoner: Reasoner<Arc<dyn LlmService>> = Reasoner::new(StructuredClient::new(service));
    let mut history = SessionHistory::new();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.is_empty() {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        prompt_marker()?;
        while let Some(line) = lines.next_line().await? {
            let prompt = line.trim();
            match prompt {
                "" => {}
                "exit" | "quit" => break,
                "history" => print_history(&history),
                _ => ask(&reasoner, &mut history, prompt).await?,
            }
            prompt_marker()?;
        }
    } else {
        ask(&reasoner, &mut history, &args.join(" ")).await?;
    }

    Ok(())
}

async fn ask(
    reasoner: &Reasoner<Arc<dyn LlmService>>,
    history: &mut SessionHistory,
    prompt: &str,
) -> std::io::Result<()> {
    let mut renderer = ProgressRenderer::new();
    let mut stdout = std::io::stdout();

    let mut progress = std::pin::pin!(reasoner.run(prompt));
    while let Some(snapshot) = progress.next().await {
        renderer.render(&mut stdout, &snapshot)?;
        if let Some(record) = snapshot.latest() {
            tracing::debug!(
                title = %record.title,
                failed = record.is_failed(),
                "Progress received"
            );
        }
        if let Some(turn) = history.record(prompt, &snapshot) {
            tracing::debug!(elapsed_secs = turn.elapsed_secs, "Turn added to history");
        }
    }
    Ok(())
}

fn print_history(history: &SessionHistory) {
    if history.is_empty() {
        println!("(no completed questions yet)");
        return;
    }
    for (i, turn) in history.turns().iter().enumerate() {
        println!("{}", history_line(i, turn));
    }
}

fn prompt_marker() -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    write!(stdout, "> ")?;
    stdout.flush()
}
