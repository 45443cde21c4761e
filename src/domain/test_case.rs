//! Labelled test queries.

use serde::{Deserialize, Serialize};

/// A natural-language query labelled with the single tool that should be
/// invoked. Immutable for the duration of a run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct TestCase {
    /// Stable identifier.
    pub id: String,
    /// The user-facing query text.
    pub query: String,
    /// Name of the tool expected to be selected; must match exactly one tool
    /// in the run's inventory.
    pub expected_tool_name: String,
}

impl TestCase {
    /// Validate that `expected_tool_name` names exactly one tool in
    /// `tool_names`. Returns the unmatched test case id on failure.
    pub fn validate_against<'a>(
        &self,
        tool_names: impl IntoIterator<Item = &'a str>,
    ) -> std::result::Result<(), String> {
        let matches = tool_names
            .into_iter()
            .filter(|n| *n == self.expected_tool_name)
            .count();
        if matches == 1 {
            Ok(())
        } else {
            Err(format!(
                "test case '{}' expects tool '{}' which matches {} tools (must match exactly 1)",
                self.id, self.expected_tool_name, matches
            ))
        }
    }
}
