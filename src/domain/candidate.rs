//! Candidates and their evaluation results.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::tool::Tool;

/// Stable identifier for a [`Candidate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CandidateId(pub Uuid);

impl CandidateId {
    /// Mint a fresh, random candidate id.
    pub fn new() -> Self {
        CandidateId(Uuid::new_v4())
    }
}

impl Default for CandidateId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CandidateId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An alternative description assignment over the fixed tool inventory.
///
/// Two candidates differ only in the `description` field of their tools.
/// Immutable once created — either the caller-supplied baseline, or the
/// output of the Reflective Mutator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    pub id: CandidateId,
    pub tools: Vec<Tool>,
}

impl Candidate {
    /// Construct the baseline candidate from the caller-supplied inventory.
    pub fn baseline(tools: Vec<Tool>) -> Self {
        Candidate {
            id: CandidateId::new(),
            tools,
        }
    }

    /// Construct an offspring candidate carrying a fresh id.
    pub fn offspring(tools: Vec<Tool>) -> Self {
        Candidate {
            id: CandidateId::new(),
            tools,
        }
    }

    /// Look up a tool by name.
    pub fn tool_named(&self, name: &str) -> Option<&Tool> {
        self.tools.iter().find(|t| t.name == name)
    }

    /// Mean description length across all tools (the "conciseness" signal).
    pub fn avg_description_length(&self) -> f64 {
        if self.tools.is_empty() {
            return 0.0;
        }
        let total: usize = self.tools.iter().map(|t| t.description.chars().count()).sum();
        total as f64 / self.tools.len() as f64
    }
}

/// The outcome of running one candidate against one test case.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalResult {
    pub test_case_id: String,
    /// The test case's natural-language query, carried alongside the id so
    /// the Mutator can recover the failing query text without re-threading
    /// the full test-case list through every call site.
    pub query: String,
    /// `None` when the gateway returned no tool call or a `ProviderError`
    /// degraded the selection.
    pub selected_tool_name: Option<String>,
    pub expected_tool_name: String,
    pub correct: bool,
}

impl EvalResult {
    pub fn new(
        test_case_id: impl Into<String>,
        query: impl Into<String>,
        expected: impl Into<String>,
        selected: Option<String>,
    ) -> Self {
        let expected_tool_name = expected.into();
        let correct = selected.as_deref() == Some(expected_tool_name.as_str());
        EvalResult {
            test_case_id: test_case_id.into(),
            query: query.into(),
            selected_tool_name: selected,
            expected_tool_name,
            correct,
        }
    }
}

/// A candidate plus the outcome of evaluating it against every test case in
/// the run's test set, exactly once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluatedCandidate {
    pub candidate: Candidate,
    pub accuracy: f64,
    pub avg_description_length: f64,
    pub evaluations: Vec<EvalResult>,
}

impl EvaluatedCandidate {
    /// Build from a candidate and its full-set evaluation results.
    pub fn new(candidate: Candidate, evaluations: Vec<EvalResult>) -> Self {
        let accuracy = if evaluations.is_empty() {
            0.0
        } else {
            evaluations.iter().filter(|r| r.correct).count() as f64 / evaluations.len() as f64
        };
        let avg_description_length = candidate.avg_description_length();
        EvaluatedCandidate {
            candidate,
            accuracy,
            avg_description_length,
            evaluations,
        }
    }

    pub fn id(&self) -> CandidateId {
        self.candidate.id
    }

    /// Look up the cached result for a specific test case, used to read the
    /// parent's score on a subsample without re-evaluating it.
    pub fn result_for(&self, test_case_id: &str) -> Option<&EvalResult> {
        self.evaluations.iter().find(|r| r.test_case_id == test_case_id)
    }

    /// Accuracy restricted to a subset of test case ids, read from cached
    /// results rather than recomputed.
    pub fn accuracy_on(&self, test_case_ids: &[String]) -> f64 {
        if test_case_ids.is_empty() {
            return 0.0;
        }
        let correct = test_case_ids
            .iter()
            .filter(|id| self.result_for(id).map(|r| r.correct).unwrap_or(false))
            .count();
        correct as f64 / test_case_ids.len() as f64
    }

    /// All failing evaluations, for the Mutator's failure-directed mode.
    pub fn failures(&self) -> Vec<&EvalResult> {
        self.evaluations.iter().filter(|r| !r.correct).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tool(name: &str, desc: &str) -> Tool {
        Tool {
            id: format!("id-{name}"),
            name: name.to_string(),
            description: desc.to_string(),
            input_schema: serde_json::json!({}),
            server_id: "srv".into(),
        }
    }

    #[test]
    fn avg_description_length_is_mean_char_count() {
        let c = Candidate::baseline(vec![tool("a", "ab"), tool("b", "abcd")]);
        assert_eq!(c.avg_description_length(), 3.0);
    }

    #[test]
    fn evaluated_candidate_computes_accuracy() {
        let c = Candidate::baseline(vec![tool("weather", "x"), tool("math", "y")]);
        let evals = vec![
            EvalResult::new("t1", "what is the temperature", "weather", Some("weather".into())),
            EvalResult::new("t2", "compute 2+2", "math", Some("weather".into())),
        ];
        let ec = EvaluatedCandidate::new(c, evals);
        assert_eq!(ec.accuracy, 0.5);
        assert_eq!(ec.failures().len(), 1);
    }

    #[test]
    fn accuracy_on_subsample_reads_cached_results() {
        let c = Candidate::baseline(vec![tool("weather", "x")]);
        let evals = vec![
            EvalResult::new("t1", "q1", "weather", Some("weather".into())),
            EvalResult::new("t2", "q2", "weather", None),
            EvalResult::new("t3", "q3", "weather", Some("weather".into())),
        ];
        let ec = EvaluatedCandidate::new(c, evals);
        let subsample = vec!["t1".to_string(), "t2".to_string()];
        assert_eq!(ec.accuracy_on(&subsample), 0.5);
    }
}
