//! Property-based tests for the reasoning loop
//!
//! For any finite script of model behaviour:
//! - the run terminates with exactly one item carrying a total
//! - no more than 26 reasoning records precede the final answer
//! - each structured call makes at most 3 model invocations
//! - snapshots grow by exactly one record per item

use super::*;
use crate::llm::LlmError;
use crate::structured::RetryPolicy;
use crate::testing::{answer_json, step_json, MockLlmService};
use futures::StreamExt;
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Scripted {
    Continue,
    Finish,
    Answer,
    Garbage,
    TransportError,
}

fn arb_scripted() -> impl Strategy<Value = Scripted> {
    prop_oneof![
        6 => Just(Scripted::Continue),
        1 => Just(Scripted::Finish),
        1 => Just(Scripted::Answer),
        2 => Just(Scripted::Garbage),
        2 => Just(Scripted::TransportError),
    ]
}

fn run_script(script: &[Scripted], fallback: Option<&str>) -> (Vec<Progress>, usize) {
    let mock = Arc::new(MockLlmService::new("mock"));
    for entry in script {
        match entry {
            Scripted::Continue => mock.queue_text(step_json("More", "thinking", "continue")),
            Scripted::Finish => mock.queue_text(step_json("Done", "enough", "final_answer")),
            Scripted::Answer => mock.queue_text(answer_json("Answer", "result")),
            Scripted::Garbage => mock.queue_text("{not json"),
            Scripted::TransportError => mock.queue_error(LlmError::network("flaky")),
        }
    }
    if let Some(text) = fallback {
        mock.repeat_text(text);
    }

    let reasoner = Reasoner::new(StructuredClient::new(mock.clone()).with_policy(RetryPolicy {
        backoff: Duration::ZERO,
        ..RetryPolicy::default()
    }));

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .unwrap();
    let items: Vec<Progress> = runtime.block_on(reasoner.run("prompt").collect());
    (items, mock.call_count())
}

fn check_run(items: &[Progress], calls: usize) -> Result<(), TestCaseError> {
    prop_assert!(!items.is_empty());

    let (last, rest) = items.split_last().unwrap();
    prop_assert!(last.is_complete(), "last item must carry the total");
    prop_assert!(rest.iter().all(|p| !p.is_complete()));

    for (i, item) in items.iter().enumerate() {
        prop_assert_eq!(item.steps.len(), i + 1);
    }

    let reasoning = last.intermediate_steps().count();
    prop_assert!(reasoning >= 1);
    prop_assert!(reasoning <= 26, "too many reasoning steps: {}", reasoning);
    prop_assert!(last.latest().unwrap().is_final_answer());
    prop_assert_eq!(last.steps.iter().filter(|s| s.is_final_answer()).count(), 1);

    // One structured call per record, each at most three invocations
    prop_assert!(calls <= items.len() * 3);
    prop_assert!(calls >= items.len());
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Once the script runs out, the mock fails every call
    #[test]
    fn prop_run_terminates_when_model_goes_away(
        script in proptest::collection::vec(arb_scripted(), 0..60)
    ) {
        let (items, calls) = run_script(&script, None);
        check_run(&items, calls)?;
    }

    /// A model that never stops asking for more is cut off by the ceiling
    #[test]
    fn prop_run_terminates_when_model_never_finishes(
        script in proptest::collection::vec(arb_scripted(), 0..30)
    ) {
        let never_done = step_json("More", "thinking", "continue");
        let (items, calls) = run_script(&script, Some(&never_done));
        check_run(&items, calls)?;
    }

    /// Error records appear only as the last reasoning record
    #[test]
    fn prop_failed_step_ends_reasoning(
        script in proptest::collection::vec(arb_scripted(), 0..60)
    ) {
        let (items, _) = run_script(&script, None);
        let last = items.last().unwrap();
        let reasoning: Vec<_> = last.intermediate_steps().collect();
        if let Some(pos) = reasoning.iter().position(|s| s.is_failed()) {
            prop_assert_eq!(pos, reasoning.len() - 1);
        }
    }
}
