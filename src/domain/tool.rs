//! Tool and candidate-description data types.

use serde::{Deserialize, Serialize};

/// A callable tool exposed to the LLM.
///
/// `name` is unique within a run and `description` is the only field the
/// optimizer is allowed to rewrite — `input_schema` is opaque JSON passed
/// through to the LLM gateway untouched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Tool {
    /// Stable identifier, independent of `name`.
    pub id: String,
    /// Unique name within the run; this is what `TestCase::expected_tool_name`
    /// and the gateway's tool-call result refer to.
    pub name: String,
    /// The mutable natural-language description shown to the LLM.
    pub description: String,
    /// Opaque JSON Schema for the tool's parameters, passed through verbatim.
    pub input_schema: serde_json::Value,
    /// Identifier of the server that originally exposed this tool.
    pub server_id: String,
}

impl Tool {
    /// Create a tool with a freshly rewritten description, leaving every
    /// other field identical. Used by the Reflective Mutator.
    pub fn with_description(&self, description: impl Into<String>) -> Self {
        Tool {
            description: description.into(),
            ..self.clone()
        }
    }
}
