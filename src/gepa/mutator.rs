//! Reflective mutation: given a candidate, produce a new candidate by
//! rewriting one tool's description via an LLM reflection prompt.
//!
//! Failure-directed mode fires when the parent has at least one incorrect
//! evaluation; conciseness-directed mode fires when it has none. A
//! `ProviderError` from the gateway degrades to a no-op mutation (a fresh
//! id, identical descriptions) rather than propagating, since a single bad
//! reflection call should cost a mutation slot, not the run.

use tracing::warn;

use crate::core::gateway::LlmGateway;
use crate::domain::{Candidate, EvalResult, EvaluatedCandidate};
use crate::gepa::events::{Event, EventEmitter, FailureContext};
use crate::gepa::prompts::ReflectionPrompts;

const DISAMBIGUATION_MAX_CHARS: usize = 200;
const MIN_SHORTEN_TARGET: usize = 50;

/// Rewrite one tool's description and return the resulting candidate.
/// Always succeeds: a gateway error yields a no-op offspring rather than an
/// error, since a mutation failure must still consume a mutation slot.
pub async fn mutate(
    parent: &EvaluatedCandidate,
    model: &str,
    gateway: &dyn LlmGateway,
    emitter: &dyn EventEmitter,
    rng: &mut crate::gepa::rng::RunRng,
) -> Candidate {
    let Ok(prompts) = ReflectionPrompts::new() else {
        warn!("failed to register reflection prompt templates, emitting no-op offspring");
        return Candidate::offspring(parent.candidate.tools.clone());
    };
    let failures = parent.failures();
    if let Some(failure) = rng.pick(&failures).copied() {
        return mutate_failure_directed(parent, failure, model, gateway, emitter, &prompts).await;
    }
    mutate_conciseness_directed(parent, model, gateway, emitter, rng, &prompts).await
}

async fn mutate_failure_directed(
    parent: &EvaluatedCandidate,
    failure: &EvalResult,
    model: &str,
    gateway: &dyn LlmGateway,
    emitter: &dyn EventEmitter,
    prompts: &ReflectionPrompts,
) -> Candidate {
    let parent_id = parent.id();
    let Some(tool) = parent.candidate.tool_named(&failure.expected_tool_name) else {
        return Candidate::offspring(parent.candidate.tools.clone());
    };

    let others: Vec<&crate::domain::Tool> =
        parent.candidate.tools.iter().filter(|t| t.name != tool.name).collect();

    let Ok(prompt) = prompts.disambiguate(
        tool,
        &others,
        &failure.query,
        &failure.expected_tool_name,
        failure.selected_tool_name.as_deref().unwrap_or("none"),
        DISAMBIGUATION_MAX_CHARS,
    ) else {
        warn!(tool = %tool.name, "failed to render disambiguation prompt, emitting no-op offspring");
        return Candidate::offspring(parent.candidate.tools.clone());
    };

    emitter.emit(Event::ReflectionStart {
        candidate_id: parent_id,
        tool: tool.name.clone(),
        failure: Some(FailureContext {
            query: failure.query.clone(),
            expected_tool_name: failure.expected_tool_name.clone(),
            selected_tool_name: failure.selected_tool_name.clone(),
        }),
    });

    let tool_name = tool.name.clone();
    let old_desc = tool.description.clone();
    match gateway.text_completion(model, &prompt, 128).await {
        Ok(text) => {
            let new_desc = text.trim().to_string();
            emitter.emit(Event::ReflectionDone {
                candidate_id: parent_id,
                tool: tool_name.clone(),
                old_desc: old_desc.clone(),
                new_desc: new_desc.clone(),
            });
            rewrite_tool(parent, &tool_name, new_desc)
        }
        Err(err) => {
            warn!(error = %err, tool = %tool_name, "reflective mutation failed, emitting no-op offspring");
            Candidate::offspring(parent.candidate.tools.clone())
        }
    }
}

async fn mutate_conciseness_directed(
    parent: &EvaluatedCandidate,
    model: &str,
    gateway: &dyn LlmGateway,
    emitter: &dyn EventEmitter,
    rng: &mut crate::gepa::rng::RunRng,
    prompts: &ReflectionPrompts,
) -> Candidate {
    let parent_id = parent.id();
    let Some(tool) = rng.pick(&parent.candidate.tools) else {
        return Candidate::offspring(parent.candidate.tools.clone());
    };
    let current_len = tool.description.chars().count();
    let target_length = MIN_SHORTEN_TARGET.max((current_len as f64 * 0.75).floor() as usize);

    let Ok(prompt) = prompts.shorten(tool, target_length) else {
        warn!(tool = %tool.name, "failed to render shorten prompt, emitting no-op offspring");
        return Candidate::offspring(parent.candidate.tools.clone());
    };

    emitter.emit(Event::ReflectionStart { candidate_id: parent_id, tool: tool.name.clone(), failure: None });

    let tool_name = tool.name.clone();
    let old_desc = tool.description.clone();
    match gateway.text_completion(model, &prompt, 128).await {
        Ok(text) => {
            let new_desc = text.trim().to_string();
            emitter.emit(Event::ReflectionDone {
                candidate_id: parent_id,
                tool: tool_name.clone(),
                old_desc: old_desc.clone(),
                new_desc: new_desc.clone(),
            });
            rewrite_tool(parent, &tool_name, new_desc)
        }
        Err(err) => {
            warn!(error = %err, tool = %tool_name, "reflective mutation failed, emitting no-op offspring");
            Candidate::offspring(parent.candidate.tools.clone())
        }
    }
}

fn rewrite_tool(parent: &EvaluatedCandidate, tool_name: &str, new_description: String) -> Candidate {
    let tools = parent
        .candidate
        .tools
        .iter()
        .map(|t| if t.name == tool_name { t.with_description(new_description.clone()) } else { t.clone() })
        .collect();
    Candidate::offspring(tools)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Tool;
    use crate::gepa::events::NoOpEmitter;
    use crate::gepa::rng::RunRng;
    use crate::providers::{FailingGateway, StubGateway};

    fn tool(name: &str, desc: &str) -> Tool {
        Tool {
            id: format!("id-{name}"),
            name: name.to_string(),
            description: desc.to_string(),
            input_schema: serde_json::json!({}),
            server_id: "srv".into(),
        }
    }

    #[tokio::test]
    async fn failure_directed_mode_rewrites_only_the_failing_tool() {
        let candidate = Candidate::baseline(vec![tool("search_docs", "search"), tool("search_web", "search")]);
        let evals = vec![
            EvalResult::new("t1", "find the documentation", "search_docs", Some("search_web".into())),
            EvalResult::new("t2", "browse the web", "search_web", Some("search_web".into())),
        ];
        let parent = EvaluatedCandidate::new(candidate, evals);
        let gateway = StubGateway::new(vec![]);
        let mut rng = RunRng::from_seed(1);
        let offspring = mutate(&parent, "m", &gateway, &NoOpEmitter, &mut rng).await;

        let docs = offspring.tool_named("search_docs").unwrap();
        let web = offspring.tool_named("search_web").unwrap();
        assert!(docs.description.contains("search_docs"));
        assert!(docs.description.contains("find the documentation"), "{}", docs.description);
        assert!(!docs.description.contains("t1"), "leaked test_case_id instead of query text: {}", docs.description);
        assert_eq!(web.description, "search");
        assert_ne!(offspring.id, parent.id());
    }

    #[tokio::test]
    async fn conciseness_mode_fires_when_parent_has_no_failures() {
        let candidate = Candidate::baseline(vec![tool("weather", "fetches current weather conditions for a city")]);
        let evals = vec![EvalResult::new("t1", "what is the weather", "weather", Some("weather".into()))];
        let parent = EvaluatedCandidate::new(candidate, evals);
        let gateway = StubGateway::new(vec![]);
        let mut rng = RunRng::from_seed(2);
        let offspring = mutate(&parent, "m", &gateway, &NoOpEmitter, &mut rng).await;

        let weather = offspring.tool_named("weather").unwrap();
        assert!(weather.description.len() <= parent.candidate.tool_named("weather").unwrap().description.len());
    }

    #[tokio::test]
    async fn provider_error_yields_noop_mutation_with_fresh_id() {
        let candidate = Candidate::baseline(vec![tool("weather", "x")]);
        let evals = vec![EvalResult::new("t1", "what is the weather", "weather", Some("weather".into()))];
        let parent = EvaluatedCandidate::new(candidate, evals);
        let gateway = FailingGateway;
        let mut rng = RunRng::from_seed(3);
        let offspring = mutate(&parent, "m", &gateway, &NoOpEmitter, &mut rng).await;

        assert_ne!(offspring.id, parent.id());
        assert_eq!(offspring.tools, parent.candidate.tools);
    }
}
