//! Run a candidate against a set of test cases and record correctness.
//!
//! A gateway failure or a `null` tool selection never raises; it is
//! recorded as an incorrect result. Every test case fans out as its own
//! concurrent task under the shared [`ConcurrencyGate`].

use futures::future::join_all;
use tracing::warn;

use crate::core::gateway::LlmGateway;
use crate::domain::{Candidate, EvalResult, EvaluatedCandidate, TestCase};
use crate::gepa::events::{EvalOutcome, Event, EventEmitter};
use crate::gepa::rate_limiter::ConcurrencyGate;

async fn run_evaluations(
    candidate: &Candidate,
    test_cases: &[TestCase],
    model: &str,
    gateway: &dyn LlmGateway,
    gate: &ConcurrencyGate,
    emitter: &dyn EventEmitter,
) -> Vec<EvalResult> {
    let futures = test_cases.iter().map(|test_case| async move {
        let _permit = gate.acquire().await;
        let selected = match gateway.tool_selection(model, &test_case.query, &candidate.tools).await {
            Ok(selection) => selection.selected_tool_name,
            Err(err) => {
                warn!(error = %err, test_case_id = %test_case.id, "tool_selection failed, recording as incorrect");
                None
            }
        };
        let result = EvalResult::new(
            test_case.id.clone(),
            test_case.query.clone(),
            test_case.expected_tool_name.clone(),
            selected.clone(),
        );
        emitter.emit(Event::Evaluation {
            candidate_id: candidate.id,
            test_case_id: test_case.id.clone(),
            query: test_case.query.clone(),
            result: EvalOutcome { correct: result.correct, selected, expected: test_case.expected_tool_name.clone() },
        });
        result
    });
    join_all(futures).await
}

/// Evaluate `candidate` against every test case in the run's test set,
/// exactly once, and compute its accuracy and average description length.
pub async fn evaluate_full(
    candidate: &Candidate,
    test_cases: &[TestCase],
    model: &str,
    gateway: &dyn LlmGateway,
    gate: &ConcurrencyGate,
    emitter: &dyn EventEmitter,
) -> EvaluatedCandidate {
    let evaluations = run_evaluations(candidate, test_cases, model, gateway, gate, emitter).await;
    EvaluatedCandidate::new(candidate.clone(), evaluations)
}

/// Evaluate `candidate` against a subsample and return its accuracy on
/// exactly that subset, without requiring coverage of the full test set.
pub async fn evaluate_subsample_accuracy(
    candidate: &Candidate,
    subsample: &[TestCase],
    model: &str,
    gateway: &dyn LlmGateway,
    gate: &ConcurrencyGate,
    emitter: &dyn EventEmitter,
) -> f64 {
    let evaluations = run_evaluations(candidate, subsample, model, gateway, gate, emitter).await;
    if evaluations.is_empty() {
        return 0.0;
    }
    let correct = evaluations.iter().filter(|r| r.correct).count();
    correct as f64 / evaluations.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Tool;
    use crate::gepa::events::NoOpEmitter;
    use crate::providers::{FailingGateway, StubGateway};

    fn tool(name: &str) -> Tool {
        Tool {
            id: format!("id-{name}"),
            name: name.to_string(),
            description: "d".into(),
            input_schema: serde_json::json!({}),
            server_id: "srv".into(),
        }
    }

    fn test_case(id: &str, query: &str, expected: &str) -> TestCase {
        TestCase { id: id.to_string(), query: query.to_string(), expected_tool_name: expected.to_string() }
    }

    #[tokio::test]
    async fn records_correct_and_incorrect_selections() {
        let candidate = Candidate::baseline(vec![tool("weather"), tool("math")]);
        let cases = vec![
            test_case("t1", "what is the temperature", "weather"),
            test_case("t2", "compute this", "math"),
        ];
        let gateway = StubGateway::new(vec![("temperature", "weather"), ("compute", "math")]);
        let gate = ConcurrencyGate::new(2);
        let evaluated = evaluate_full(&candidate, &cases, "m", &gateway, &gate, &NoOpEmitter).await;
        assert_eq!(evaluated.accuracy, 1.0);
        assert_eq!(evaluated.evaluations.len(), 2);
    }

    #[tokio::test]
    async fn gateway_failure_degrades_to_incorrect_never_panics() {
        let candidate = Candidate::baseline(vec![tool("weather")]);
        let cases = vec![test_case("t1", "anything", "weather")];
        let gateway = FailingGateway;
        let gate = ConcurrencyGate::new(1);
        let evaluated = evaluate_full(&candidate, &cases, "m", &gateway, &gate, &NoOpEmitter).await;
        assert_eq!(evaluated.accuracy, 0.0);
        assert!(!evaluated.evaluations[0].correct);
        assert!(evaluated.evaluations[0].selected_tool_name.is_none());
    }

    #[tokio::test]
    async fn subsample_accuracy_is_independent_of_full_coverage() {
        let candidate = Candidate::baseline(vec![tool("weather"), tool("math")]);
        let cases = vec![test_case("t1", "temperature check", "weather")];
        let gateway = StubGateway::new(vec![("temperature", "weather")]);
        let gate = ConcurrencyGate::new(1);
        let accuracy = evaluate_subsample_accuracy(&candidate, &cases, "m", &gateway, &gate, &NoOpEmitter).await;
        assert_eq!(accuracy, 1.0);
    }
}
