//! JSON exploration tools.
//!
//! The model navigates a JSON document with paths written like
//! `data["key"][0]["field"]`. Bad paths are answered with error text, never
//! with a tool failure, so the model can try another path.

use async_trait::async_trait;
use agentry_core::error::{Error, ToolError};
use agentry_core::tool::{Tool, Toolkit};
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// A JSON document plus the limit on how much of a value is shown at once.
#[derive(Debug, Clone)]
pub struct JsonSpec {
    value: Value,
    max_value_length: usize,
}

#[derive(Debug, Clone, PartialEq)]
enum PathKey {
    Key(String),
    Index(usize),
}

impl JsonSpec {
    pub fn new(value: Value) -> Self {
        Self {
            value,
            max_value_length: 200,
        }
    }

    pub fn with_max_value_length(mut self, max: usize) -> Self {
        self.max_value_length = max;
        self
    }

    /// Load a JSON document from disk.
    pub fn from_path(path: &Path) -> Result<Self, Error> {
        let load_error = |reason: String| Error::DataLoad {
            location: path.display().to_string(),
            reason,
        };
        let text = std::fs::read_to_string(path).map_err(|e| load_error(e.to_string()))?;
        let value: Value = serde_json::from_str(&text).map_err(|e| load_error(e.to_string()))?;
        debug!(path = %path.display(), "JSON spec loaded");
        Ok(Self::new(value))
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn max_value_length(&self) -> usize {
        self.max_value_length
    }

    /// Split `data["a"][0]` into its bracketed keys. Digits become indices.
    fn parse_path(text: &str) -> Vec<PathKey> {
        let mut keys = Vec::new();
        let mut rest = text;
        while let Some(open) = rest.find('[') {
            let Some(close) = rest[open..].find(']') else {
                break;
            };
            let raw: String = rest[open + 1..open + close]
                .chars()
                .filter(|c| *c != '"' && *c != '\'')
                .collect();
            keys.push(match raw.parse::<usize>() {
                Ok(i) => PathKey::Index(i),
                Err(_) => PathKey::Key(raw),
            });
            rest = &rest[open + close + 1..];
        }
        keys
    }

    fn resolve(&self, text: &str) -> Result<&Value, String> {
        let mut current = &self.value;
        for key in Self::parse_path(text) {
            current = match (&key, current) {
                (PathKey::Key(k), _) if k.is_empty() => current,
                (PathKey::Key(k), Value::Object(map)) => {
                    map.get(k).ok_or_else(|| format!("KeyError('{k}')"))?
                }
                (PathKey::Index(i), Value::Array(items)) => items
                    .get(*i)
                    .ok_or_else(|| "IndexError('list index out of range')".to_string())?,
                (PathKey::Index(i), Value::Object(map)) => map
                    .get(&i.to_string())
                    .ok_or_else(|| format!("KeyError({i})"))?,
                (PathKey::Key(_), Value::Array(_)) => {
                    return Err("TypeError('list indices must be integers or slices, not str')".into());
                }
                (_, other) => {
                    return Err(format!(
                        "TypeError(\"'{}' object is not subscriptable\")",
                        type_name(other)
                    ));
                }
            };
        }
        Ok(current)
    }

    /// The keys of the object at `text`, as a list.
    pub fn keys(&self, text: &str) -> String {
        match self.resolve(text) {
            Ok(Value::Object(map)) => {
                let keys: Vec<String> = map.keys().map(|k| format!("'{k}'")).collect();
                format!("[{}]", keys.join(", "))
            }
            Ok(_) => format!(
                "ValueError('Value at path `{text}` is not a dict, get the value directly.')"
            ),
            Err(e) => e,
        }
    }

    /// The value at `text`, cut to `max_value_length` characters.
    pub fn value_at(&self, text: &str) -> String {
        let value = match self.resolve(text) {
            Ok(v) => v,
            Err(e) => return e,
        };
        let rendered = match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        if value.is_object() && rendered.chars().count() > self.max_value_length {
            return "Value is a large dictionary, should explore its keys directly".into();
        }
        if rendered.chars().count() > self.max_value_length {
            let cut: String = rendered.chars().take(self.max_value_length).collect();
            return format!("{cut}...");
        }
        rendered
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "NoneType",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "int",
        Value::String(_) => "str",
        Value::Array(_) => "list",
        Value::Object(_) => "dict",
    }
}

pub struct JsonListKeysTool {
    spec: Arc<JsonSpec>,
}

#[async_trait]
impl Tool for JsonListKeysTool {
    fn name(&self) -> &str {
        "json_spec_list_keys"
    }

    fn description(&self) -> &str {
        "Lists all keys at a given path. Only call this when you are SURE the path exists. \
         The input is the path to a dict written in Python syntax, e.g. data[\"key1\"][0][\"key2\"]."
    }

    async fn call(&self, input: &str) -> Result<String, ToolError> {
        Ok(self.spec.keys(input.trim()))
    }
}

pub struct JsonGetValueTool {
    spec: Arc<JsonSpec>,
}

#[async_trait]
impl Tool for JsonGetValueTool {
    fn name(&self) -> &str {
        "json_spec_get_value"
    }

    fn description(&self) -> &str {
        "Returns the value of the dict at a given path. Only call this when you are SURE the \
         path exists. The input is the path written in Python syntax, e.g. data[\"key1\"][0][\"key2\"]."
    }

    async fn call(&self, input: &str) -> Result<String, ToolError> {
        Ok(self.spec.value_at(input.trim()))
    }
}

/// Key listing and value lookup over one JSON document.
pub struct JsonToolkit {
    spec: Arc<JsonSpec>,
}

impl JsonToolkit {
    pub fn new(spec: JsonSpec) -> Self {
        Self {
            spec: Arc::new(spec),
        }
    }

    pub fn spec(&self) -> &JsonSpec {
        &self.spec
    }
}

impl Toolkit for JsonToolkit {
    fn tools(&self) -> Vec<Arc<dyn Tool>> {
        vec![
            Arc::new(JsonListKeysTool {
                spec: self.spec.clone(),
            }),
            Arc::new(JsonGetValueTool {
                spec: self.spec.clone(),
            }),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn openapi() -> JsonSpec {
        JsonSpec::new(json!({
            "openapi": "3.0.0",
            "paths": {
                "/pets": {"get": {"summary": "List all pets"}},
                "/pets/{id}": {"get": {"summary": "Info for a pet"}}
            },
            "servers": [{"url": "https://petstore.example.com/v1"}],
            "description": "x".repeat(300)
        }))
    }

    #[test]
    fn parse_path_handles_quotes_and_indices() {
        assert_eq!(
            JsonSpec::parse_path(r#"data["servers"][0]['url']"#),
            vec![
                PathKey::Key("servers".into()),
                PathKey::Index(0),
                PathKey::Key("url".into())
            ]
        );
        assert!(JsonSpec::parse_path("data").is_empty());
    }

    #[test]
    fn keys_at_root_and_nested() {
        let spec = openapi();
        assert_eq!(spec.keys("data"), "['description', 'openapi', 'paths', 'servers']");
        assert_eq!(spec.keys(r#"data["paths"]"#), "['/pets', '/pets/{id}']");
    }

    #[test]
    fn keys_on_non_dict_is_value_error() {
        let spec = openapi();
        assert_eq!(
            spec.keys(r#"data["openapi"]"#),
            "ValueError('Value at path `data[\"openapi\"]` is not a dict, get the value directly.')"
        );
    }

    #[test]
    fn missing_key_and_index() {
        let spec = openapi();
        assert_eq!(spec.value_at(r#"data["nope"]"#), "KeyError('nope')");
        assert_eq!(
            spec.value_at(r#"data["servers"][3]"#),
            "IndexError('list index out of range')"
        );
    }

    #[test]
    fn values_are_truncated() {
        let spec = openapi();
        assert_eq!(
            spec.value_at(r#"data["servers"][0]["url"]"#),
            "https://petstore.example.com/v1"
        );
        let long = spec.value_at(r#"data["description"]"#);
        assert_eq!(long.len(), 203);
        assert!(long.ends_with("..."));
        assert_eq!(
            spec.clone().with_max_value_length(20).value_at(r#"data["paths"]"#),
            "Value is a large dictionary, should explore its keys directly"
        );
    }

    #[test]
    fn from_path_reports_bad_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("spec.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(JsonSpec::from_path(&path), Err(Error::DataLoad { .. })));

        std::fs::write(&path, r#"{"a": 1}"#).unwrap();
        assert_eq!(JsonSpec::from_path(&path).unwrap().keys("data"), "['a']");
    }

    #[tokio::test]
    async fn toolkit_exposes_two_tools() {
        let toolkit = JsonToolkit::new(openapi());
        let tools = toolkit.tools();
        assert_eq!(tools[0].name(), "json_spec_list_keys");
        assert_eq!(tools[1].name(), "json_spec_get_value");
        assert_eq!(tools[1].call(" data[\"openapi\"] ").await.unwrap(), "3.0.0");
    }
}
