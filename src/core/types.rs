//! Wire-level chat types shared by every LLM gateway backend.

use serde::{Deserialize, Serialize};

/// Role of a message in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// A single conversation turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Message { role: Role::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Message { role: Role::User, content: content.into() }
    }
}

/// A tool presented to the model as a callable function.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    #[serde(rename = "type")]
    pub tool_type: String,
    pub function: FunctionDefinition,
}

/// Function half of a [`ToolDefinition`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionDefinition {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

impl ToolDefinition {
    pub fn from_tool(tool: &crate::domain::Tool) -> Self {
        ToolDefinition {
            tool_type: "function".to_string(),
            function: FunctionDefinition {
                name: tool.name.clone(),
                description: tool.description.clone(),
                parameters: tool.input_schema.clone(),
            },
        }
    }
}

/// Generation options for a chat completion call.
///
/// The Evaluator always uses `precise()` for deterministic tool-selection
/// decoding.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

impl GenerationOptions {
    /// Deterministic decoding, used for every `tool_selection` call.
    pub fn precise() -> Self {
        GenerationOptions { temperature: Some(0.0), ..Default::default() }
    }

    /// Used for `text_completion` reflection/mutation calls.
    pub fn reflection(max_tokens: u32) -> Self {
        GenerationOptions { temperature: Some(0.7), max_tokens: Some(max_tokens) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn precise_options_are_deterministic() {
        let opts = GenerationOptions::precise();
        assert_eq!(opts.temperature, Some(0.0));
    }
}
