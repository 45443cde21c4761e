//! Uniform adapter over chat+tools and plain-text LLM calls. Any backend
//! that can present tools to a model and return a structured tool-call
//! result satisfies this trait; the core never depends on a specific
//! provider.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::Tool;
use crate::error::Result;

/// Outcome of a `tool_selection` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSelection {
    /// Name of the first tool the model chose, or `None` if it produced
    /// text without a tool call.
    pub selected_tool_name: Option<String>,
    /// Arguments the model supplied for the selected tool, if any.
    pub arguments: Option<serde_json::Value>,
}

impl ToolSelection {
    pub fn none() -> Self {
        ToolSelection { selected_tool_name: None, arguments: None }
    }
}

/// Abstract interface for LLM backends used by the Evaluator and Mutator.
///
/// Implementations must never execute a tool: presenting `tools` to the
/// model is purely informational bait for a tool-call decision. `Tool` here
/// is pure metadata with no associated behavior, so there is nothing to
/// invoke even if the model asks for it.
#[async_trait]
pub trait LlmGateway: Send + Sync {
    /// Present `tools` to `model` with `query` as a single user turn and
    /// return the name of the first tool chosen, under deterministic
    /// decoding (temperature 0). Fails with `Error::Provider` on transport
    /// or protocol errors — callers (the Evaluator) degrade this to a
    /// `null` selection rather than propagating it.
    async fn tool_selection(&self, model: &str, query: &str, tools: &[Tool]) -> Result<ToolSelection>;

    /// One-shot prompt returning the assistant's text. Used by the
    /// Reflective Mutator. Fails with `Error::Provider`, propagated to the
    /// Mutator's no-op-mutation fallback.
    async fn text_completion(&self, model: &str, prompt: &str, max_output_tokens: u32) -> Result<String>;
}
