//! Prompt assembly for tool-using agents.
//!
//! A prompt is laid out as
//!
//! ```text
//! {prefix}
//!
//! tool_a: what tool_a does
//! tool_b: what tool_b does
//!
//! {format instructions, with {tool_names} filled in}
//!
//! {suffix}
//! ```
//!
//! Partial bindings (the CSV agent's table preview, for example) are moved
//! out of the required inputs but left as placeholders in the text; they are
//! substituted each time the prompt is formatted.

use agentry_core::error::{Error, Result};
use agentry_core::prompt::PromptTemplate;
use agentry_core::tool::Tool;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use crate::templates;

/// The inputs to [`assemble`].
#[derive(Debug, Clone, PartialEq)]
pub struct PromptParts {
    pub prefix: String,
    pub suffix: String,
    pub format_instructions: Option<String>,
    /// Variables the caller provides; defaults to `input` and `agent_scratchpad`.
    pub input_variables: Option<Vec<String>>,
    pub partial_bindings: BTreeMap<String, String>,
    /// Written before each tool line (`"> "` for conversational prompts).
    pub tool_bullet: String,
}

impl PromptParts {
    /// Zero-shot layout with the default suffix and format instructions.
    pub fn zero_shot(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            suffix: templates::SUFFIX.to_string(),
            format_instructions: Some(templates::FORMAT_INSTRUCTIONS.to_string()),
            input_variables: None,
            partial_bindings: BTreeMap::new(),
            tool_bullet: String::new(),
        }
    }

    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }

    pub fn with_format_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.format_instructions = Some(instructions.into());
        self
    }

    pub fn without_format_instructions(mut self) -> Self {
        self.format_instructions = None;
        self
    }

    pub fn with_input_variables<I, S>(mut self, variables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.input_variables = Some(variables.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_partial(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.partial_bindings.insert(name.into(), value.into());
        self
    }

    pub fn with_tool_bullet(mut self, bullet: impl Into<String>) -> Self {
        self.tool_bullet = bullet.into();
        self
    }
}

/// An assembled agent prompt: the template plus the parts it was built from.
#[derive(Debug, Clone, PartialEq)]
pub struct AssembledPrompt {
    template: PromptTemplate,
    prefix: String,
    suffix: String,
    format_instructions: Option<String>,
    tool_names: Vec<String>,
}

impl AssembledPrompt {
    pub fn template(&self) -> &PromptTemplate {
        &self.template
    }

    /// Full template text, placeholders included.
    pub fn text(&self) -> &str {
        self.template.template()
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    /// Format instructions as rendered into the prompt.
    pub fn format_instructions(&self) -> Option<&str> {
        self.format_instructions.as_deref()
    }

    /// Tool names in prompt order.
    pub fn tool_names(&self) -> &[String] {
        &self.tool_names
    }

    pub fn input_variables(&self) -> &[String] {
        self.template.input_variables()
    }

    pub fn partial_bindings(&self) -> &BTreeMap<String, String> {
        self.template.partial_bindings()
    }
}

/// Braces in tool descriptions are literal text, not placeholders.
fn escape_braces(text: &str) -> String {
    text.replace('{', "{{").replace('}', "}}")
}

/// Build the prompt for `tools`. Fails with [`Error::ToolNameCollision`] when
/// two tools share a name, and with [`Error::Prompt`] when the text references
/// a variable that is neither an input nor a partial binding.
pub fn assemble(tools: &[Arc<dyn Tool>], parts: &PromptParts) -> Result<AssembledPrompt> {
    let mut seen = HashSet::new();
    for tool in tools {
        if !seen.insert(tool.name()) {
            return Err(Error::ToolNameCollision(tool.name().to_string()));
        }
    }

    let tool_names: Vec<String> = tools.iter().map(|t| t.name().to_string()).collect();
    let tool_lines = tools
        .iter()
        .map(|t| {
            format!(
                "{}{}: {}",
                parts.tool_bullet,
                escape_braces(t.name()),
                escape_braces(t.description())
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let format_instructions = parts
        .format_instructions
        .as_ref()
        .map(|f| f.replace("{tool_names}", &escape_braces(&tool_names.join(", "))));

    let mut sections = vec![parts.prefix.clone(), tool_lines];
    if let Some(instructions) = &format_instructions {
        sections.push(instructions.clone());
    }
    sections.push(parts.suffix.clone());
    let text = sections.join("\n\n");

    let mut input_variables = parts
        .input_variables
        .clone()
        .unwrap_or_else(|| vec!["input".into(), "agent_scratchpad".into()]);
    // Bound names must be declared so the template validates before binding.
    for name in parts.partial_bindings.keys() {
        if !input_variables.contains(name) {
            input_variables.push(name.clone());
        }
    }

    let mut template = PromptTemplate::new(text, input_variables)?;
    for (name, value) in &parts.partial_bindings {
        template = template.partial(name, value.clone())?;
    }

    Ok(AssembledPrompt {
        template,
        prefix: parts.prefix.clone(),
        suffix: parts.suffix.clone(),
        format_instructions,
        tool_names,
    })
}
