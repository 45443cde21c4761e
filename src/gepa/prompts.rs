//! Handlebars-rendered reflection prompts for the mutator.
//!
//! Kept as a thin registry over two fixed templates rather than building
//! prompt strings inline, so the marker format (`MODE:`, `TOOL_NAME:`, ...)
//! lives in one place instead of being duplicated across call sites.

use handlebars::Handlebars;
use serde::Serialize;

use crate::domain::Tool;
use crate::error::{Error, Result};

const DISAMBIGUATE_TEMPLATE: &str = "\
MODE: disambiguate
TOOL_NAME: {{tool_name}}
CURRENT_DESCRIPTION: {{current_description}}
OTHER_TOOLS:
{{#each other_tools}}- {{this.name}}: {{this.description}}
{{/each}}FAILING_QUERY: {{failing_query}}
EXPECTED_TOOL: {{expected_tool}}
SELECTED_TOOL: {{selected_tool}}

Rewrite only this tool's description so the model would pick it for the failing query above, without causing it to be picked for queries meant for the other tools. Keep it under {{max_chars}} characters. Return only the new description, no preamble.";

const SHORTEN_TEMPLATE: &str = "\
MODE: shorten
TOOL_NAME: {{tool_name}}
CURRENT_DESCRIPTION: {{current_description}}
TARGET_LENGTH: {{target_length}}

Shorten this tool's description to at most {{target_length}} characters while preserving its meaning. Return only the new description, no preamble.";

#[derive(Serialize)]
struct OtherTool<'a> {
    name: &'a str,
    description: &'a str,
}

#[derive(Serialize)]
struct DisambiguateContext<'a> {
    tool_name: &'a str,
    current_description: &'a str,
    other_tools: Vec<OtherTool<'a>>,
    failing_query: &'a str,
    expected_tool: &'a str,
    selected_tool: &'a str,
    max_chars: usize,
}

#[derive(Serialize)]
struct ShortenContext<'a> {
    tool_name: &'a str,
    current_description: &'a str,
    target_length: usize,
}

/// Registry of the two reflection prompt templates, built once and reused
/// across every mutation call.
pub struct ReflectionPrompts {
    registry: Handlebars<'static>,
}

impl ReflectionPrompts {
    pub fn new() -> Result<Self> {
        let mut registry = Handlebars::new();
        registry.set_strict_mode(true);
        registry
            .register_template_string("disambiguate", DISAMBIGUATE_TEMPLATE)
            .map_err(Box::new)?;
        registry.register_template_string("shorten", SHORTEN_TEMPLATE).map_err(Box::new)?;
        Ok(ReflectionPrompts { registry })
    }

    pub fn disambiguate(
        &self,
        tool: &Tool,
        others: &[&Tool],
        failing_query: &str,
        expected_tool: &str,
        selected_tool: &str,
        max_chars: usize,
    ) -> Result<String> {
        let context = DisambiguateContext {
            tool_name: &tool.name,
            current_description: &tool.description,
            other_tools: others.iter().map(|t| OtherTool { name: &t.name, description: &t.description }).collect(),
            failing_query,
            expected_tool,
            selected_tool,
            max_chars,
        };
        self.registry.render("disambiguate", &context).map_err(Error::from)
    }

    pub fn shorten(&self, tool: &Tool, target_length: usize) -> Result<String> {
        let context = ShortenContext { tool_name: &tool.name, current_description: &tool.description, target_length };
        self.registry.render("shorten", &context).map_err(Error::from)
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
    fn disambiguate_prompt_lists_other_tools_and_markers() {
        let prompts = ReflectionPrompts::new().unwrap();
        let a = tool("search_docs", "search docs");
        let b = tool("search_web", "search web");
        let rendered = prompts.disambiguate(&a, &[&b], "q1", "search_docs", "search_web", 200).unwrap();
        assert!(rendered.contains("MODE: disambiguate"));
        assert!(rendered.contains("TOOL_NAME: search_docs"));
        assert!(rendered.contains("- search_web: search web"));
        assert!(rendered.contains("FAILING_QUERY: q1"));
    }

    #[test]
    fn shorten_prompt_includes_target_length() {
        let prompts = ReflectionPrompts::new().unwrap();
        let a = tool("weather", "fetches the current weather for a city");
        let rendered = prompts.shorten(&a, 20).unwrap();
        assert!(rendered.contains("MODE: shorten"));
        assert!(rendered.contains("TARGET_LENGTH: 20"));
    }
}
