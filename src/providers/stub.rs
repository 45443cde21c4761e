//! Deterministic in-memory [`LlmGateway`] implementations.
//!
//! Reproducing a run bit-for-bit from its seed only holds if every source of
//! external nondeterminism, including the model itself, can be swapped for
//! something deterministic. `StubGateway` is that swap: a keyword-routing
//! `tool_selection` and a marker-driven `text_completion` that plays the
//! reflective mutator's own prompt format back at it, so optimization runs
//! are exercisable in tests without network access.

use async_trait::async_trait;

use crate::core::gateway::{LlmGateway, ToolSelection};
use crate::domain::Tool;
use crate::error::{Error, Result};

/// Picks a tool by scanning the query for the first matching keyword rule,
/// falling back to the first tool in the inventory if nothing matches (or
/// to `None` when `strict` is set, matching "model produced text without a
/// tool call").
pub struct StubGateway {
    /// `(keyword, tool_name)` pairs, checked in order; the query is matched
    /// case-insensitively as a substring.
    rules: Vec<(String, String)>,
    /// When true, no match means `None` rather than the first tool.
    strict: bool,
}

impl StubGateway {
    /// Build a router from `(keyword, tool_name)` pairs.
    pub fn new(rules: Vec<(&str, &str)>) -> Self {
        StubGateway {
            rules: rules.into_iter().map(|(k, t)| (k.to_lowercase(), t.to_string())).collect(),
            strict: false,
        }
    }

    /// Like [`StubGateway::new`] but returns `None` instead of falling back
    /// to the first tool when no keyword matches.
    pub fn strict(rules: Vec<(&str, &str)>) -> Self {
        StubGateway { strict: true, ..Self::new(rules) }
    }
}

#[async_trait]
impl LlmGateway for StubGateway {
    async fn tool_selection(&self, _model: &str, query: &str, tools: &[Tool]) -> Result<ToolSelection> {
        let query_lower = query.to_lowercase();
        for (keyword, tool_name) in &self.rules {
            if query_lower.contains(keyword.as_str()) {
                return Ok(ToolSelection { selected_tool_name: Some(tool_name.clone()), arguments: Some(serde_json::json!({})) });
            }
        }
        if self.strict {
            Ok(ToolSelection::none())
        } else {
            Ok(ToolSelection {
                selected_tool_name: tools.first().map(|t| t.name.clone()),
                arguments: Some(serde_json::json!({})),
            })
        }
    }

    async fn text_completion(&self, _model: &str, prompt: &str, max_output_tokens: u32) -> Result<String> {
        Ok(reflect_on_prompt(prompt, max_output_tokens as usize))
    }
}

/// Deterministically "reflects" on a mutator prompt by reading the markers
/// the mutator embeds (see `crate::mutator::build_prompt`) instead of
/// calling out to a model. Disambiguation mode injects the failing query's
/// distinguishing word into the description; shorten mode truncates the
/// current description to the target length at a word boundary.
fn reflect_on_prompt(prompt: &str, max_chars: usize) -> String {
    let field = |key: &str| -> Option<String> {
        prompt.lines().find_map(|line| {
            line.strip_prefix(key).map(|rest| rest.trim().to_string())
        })
    };

    let rewritten = if field("MODE:").as_deref() == Some("shorten") {
        let current = field("CURRENT_DESCRIPTION:").unwrap_or_default();
        let target: usize = field("TARGET_LENGTH:").and_then(|s| s.parse().ok()).unwrap_or(50);
        truncate_at_word_boundary(&current, target)
    } else {
        let name = field("TOOL_NAME:").unwrap_or_default();
        let query = field("FAILING_QUERY:").unwrap_or_default();
        format!("Use this tool specifically for: {name} — handles requests like '{query}'.")
    };

    truncate_at_word_boundary(&rewritten, max_chars)
}

fn truncate_at_word_boundary(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.trim().to_string();
    }
    let truncated: String = s.chars().take(max_chars).collect();
    match truncated.rfind(' ') {
        Some(idx) => truncated[..idx].trim().to_string(),
        None => truncated.trim().to_string(),
    }
}

/// A gateway that always fails with `Error::Provider`, used to exercise the
/// evaluator's and mutator's degradation paths.
pub struct FailingGateway;

#[async_trait]
impl LlmGateway for FailingGateway {
    async fn tool_selection(&self, _model: &str, _query: &str, _tools: &[Tool]) -> Result<ToolSelection> {
        Err(Error::Provider("simulated transport failure".into()))
    }

    async fn text_completion(&self, _model: &str, _prompt: &str, _max_output_tokens: u32) -> Result<String> {
        Err(Error::Provider("simulated transport failure".into()))
    }
}
