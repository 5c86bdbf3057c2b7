//! Prompt templates with `{variable}` placeholders.
//!
//! `{{` and `}}` render as literal braces. Any other brace that does not
//! enclose an identifier is kept verbatim, so templates may embed JSON or
//! code samples without escaping every brace.
//!
//! Partially bound variables are stored next to the raw template text; the
//! text itself is only substituted when [`PromptTemplate::format`] runs.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptTemplate {
    template: String,
    input_variables: Vec<String>,
    partial_bindings: BTreeMap<String, String>,
}

impl PromptTemplate {
    /// Create a template, checking that every placeholder is declared.
    pub fn new(template: impl Into<String>, input_variables: Vec<String>) -> Result<Self> {
        let prompt = Self {
            template: template.into(),
            input_variables,
            partial_bindings: BTreeMap::new(),
        };
        prompt.validate()?;
        Ok(prompt)
    }

    /// Create a template whose input variables are inferred from its text.
    pub fn from_template(template: impl Into<String>) -> Self {
        let template = template.into();
        let input_variables = placeholders(&template);
        Self {
            template,
            input_variables,
            partial_bindings: BTreeMap::new(),
        }
    }

    /// Bind a variable now; it stops being a required input.
    pub fn partial(mut self, name: &str, value: impl Into<String>) -> Result<Self> {
        let Some(pos) = self.input_variables.iter().position(|v| v == name) else {
            return Err(Error::Prompt(format!(
                "cannot bind '{name}': not an input variable"
            )));
        };
        self.input_variables.remove(pos);
        self.partial_bindings.insert(name.to_string(), value.into());
        Ok(self)
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    /// Variables the caller still has to provide.
    pub fn input_variables(&self) -> &[String] {
        &self.input_variables
    }

    pub fn partial_bindings(&self) -> &BTreeMap<String, String> {
        &self.partial_bindings
    }

    /// Substitute partial bindings and `values` into the template.
    pub fn format(&self, values: &HashMap<String, String>) -> Result<String> {
        for var in &self.input_variables {
            if !values.contains_key(var) {
                return Err(Error::Prompt(format!("missing value for '{var}'")));
            }
        }
        Ok(render(&self.template, |name| {
            values
                .get(name)
                .or_else(|| self.partial_bindings.get(name))
                .map(String::as_str)
        }))
    }

    fn validate(&self) -> Result<()> {
        for name in placeholders(&self.template) {
            let declared = self.input_variables.contains(&name)
                || self.partial_bindings.contains_key(&name);
            if !declared {
                return Err(Error::Prompt(format!(
                    "template references undeclared variable '{name}'"
                )));
            }
        }
        Ok(())
    }
}

fn is_ident(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

enum Segment<'a> {
    Text(&'a str),
    Var(&'a str),
}

fn segments(template: &str) -> Vec<Segment<'_>> {
    let bytes = template.as_bytes();
    let mut out = Vec::new();
    let mut i = 0;
    let mut literal_start = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'{' | b'}' if bytes.get(i + 1) == Some(&bytes[i]) => {
                out.push(Segment::Text(&template[literal_start..i]));
                out.push(Segment::Text(&template[i..i + 1]));
                i += 2;
                literal_start = i;
            }
            b'{' => match template[i + 1..].find('}') {
                Some(end) if is_ident(&template[i + 1..i + 1 + end]) => {
                    out.push(Segment::Text(&template[literal_start..i]));
                    out.push(Segment::Var(&template[i + 1..i + 1 + end]));
                    i += end + 2;
                    literal_start = i;
                }
                _ => i += 1,
            },
            _ => i += 1,
        }
    }
    out.push(Segment::Text(&template[literal_start..]));
    out
}

/// Placeholder names in order of first appearance.
pub fn placeholders(template: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for segment in segments(template) {
        if let Segment::Var(name) = segment {
            if !names.iter().any(|n| n == name) {
                names.push(name.to_string());
            }
        }
    }
    names
}

fn render<'a>(template: &str, lookup: impl Fn(&str) -> Option<&'a str>) -> String {
    let mut out = String::with_capacity(template.len());
    for segment in segments(template) {
        match segment {
            Segment::Text(text) => out.push_str(text),
            Segment::Var(name) => match lookup(name) {
                Some(value) => out.push_str(value),
                None => {
                    out.push('{');
                    out.push_str(name);
                    out.push('}');
                }
            },
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn placeholders_skip_escapes_and_non_identifiers() {
        let names = placeholders("Q: {input}\n{{\"a\": 1}} {agent_scratchpad} { not a var } {input}");
        assert_eq!(names, vec!["input", "agent_scratchpad"]);
    }

    #[test]
    fn new_rejects_undeclared_variables() {
        let err = PromptTemplate::new("Hello {name} from {place}", vec!["name".into()]).unwrap_err();
        assert!(err.to_string().contains("place"));
    }

    #[test]
    fn partial_moves_variable_out_of_inputs_without_touching_text() {
        let prompt = PromptTemplate::new(
            "Table:\n{df}\nQuestion: {input}",
            vec!["df".into(), "input".into()],
        )
        .unwrap()
        .partial("df", "id value\n1 10")
        .unwrap();

        assert_eq!(prompt.input_variables(), &["input".to_string()]);
        assert!(prompt.template().contains("{df}"));
        assert_eq!(prompt.partial_bindings()["df"], "id value\n1 10");

        let text = prompt.format(&values(&[("input", "sum")])).unwrap();
        assert_eq!(text, "Table:\nid value\n1 10\nQuestion: sum");
    }

    #[test]
    fn partial_unknown_variable_fails() {
        let prompt = PromptTemplate::from_template("{input}");
        assert!(prompt.partial("df", "x").is_err());
    }

    #[test]
    fn format_requires_every_input() {
        let prompt = PromptTemplate::from_template("{a} and {b}");
        let err = prompt.format(&values(&[("a", "1")])).unwrap_err();
        assert!(err.to_string().contains("'b'"));
    }

    #[test]
    fn format_renders_escaped_braces() {
        let prompt = PromptTemplate::from_template("{{\"cmd\": \"{name}\"}}");
        let text = prompt.format(&values(&[("name", "finish")])).unwrap();
        assert_eq!(text, "{\"cmd\": \"finish\"}");
    }
}
