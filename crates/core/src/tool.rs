//! Tool trait: the abstraction over agent capabilities.
//!
//! A tool is a named capability the reasoning loop may invoke with a string
//! input, getting a string observation back. Toolkits bundle related tools.
//!
//! Every input that can produce tools (a toolkit, a list of tools, a single
//! tool) is normalized through [`IntoTools`] into one canonical ordered
//! sequence before any agent logic sees it.

use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use crate::error::{Error, ToolError};

/// The core Tool trait.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name of this tool (e.g., "sql_db_query").
    fn name(&self) -> &str;

    /// A description of what this tool does (rendered into the prompt).
    fn description(&self) -> &str;

    /// Invoke the tool with the model-provided input.
    async fn call(&self, input: &str) -> std::result::Result<String, ToolError>;
}

/// A bundle producing a list of related tools.
pub trait Toolkit: Send + Sync {
    fn tools(&self) -> Vec<Arc<dyn Tool>>;
}

/// Conversion into the canonical ordered tool sequence.
pub trait IntoTools {
    fn into_tools(self) -> Vec<Arc<dyn Tool>>;
}

impl IntoTools for Vec<Arc<dyn Tool>> {
    fn into_tools(self) -> Vec<Arc<dyn Tool>> {
        self
    }
}

impl IntoTools for &[Arc<dyn Tool>] {
    fn into_tools(self) -> Vec<Arc<dyn Tool>> {
        self.to_vec()
    }
}

impl IntoTools for Arc<dyn Tool> {
    fn into_tools(self) -> Vec<Arc<dyn Tool>> {
        vec![self]
    }
}

impl IntoTools for Arc<dyn Toolkit> {
    fn into_tools(self) -> Vec<Arc<dyn Tool>> {
        self.tools()
    }
}

impl<T: Toolkit> IntoTools for &T {
    fn into_tools(self) -> Vec<Arc<dyn Tool>> {
        self.tools()
    }
}

/// A tool backed by a plain closure.
pub struct FnTool<F> {
    name: String,
    description: String,
    func: F,
}

impl<F> FnTool<F>
where
    F: Fn(&str) -> std::result::Result<String, ToolError> + Send + Sync + 'static,
{
    pub fn new(name: impl Into<String>, description: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            func,
        }
    }

    pub fn shared(self) -> Arc<dyn Tool> {
        Arc::new(self)
    }
}

#[async_trait]
impl<F> Tool for FnTool<F>
where
    F: Fn(&str) -> std::result::Result<String, ToolError> + Send + Sync + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    async fn call(&self, input: &str) -> std::result::Result<String, ToolError> {
        (self.func)(input)
    }
}

/// An ordered set of uniquely named tools.
///
/// Registration order is preserved (it determines the order tools are listed
/// in prompts). A second tool with an already registered name is rejected
/// rather than replacing the first.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry, failing on the first duplicate name.
    pub fn from_tools(tools: impl IntoTools) -> Result<Self, Error> {
        let mut registry = Self::new();
        for tool in tools.into_tools() {
            registry.register(tool)?;
        }
        Ok(registry)
    }

    /// Register a tool. Fails with [`Error::ToolNameCollision`] if the name is taken.
    pub fn register(&mut self, tool: Arc<dyn Tool>) -> Result<(), Error> {
        let name = tool.name().to_string();
        if self.index.contains_key(&name) {
            return Err(Error::ToolNameCollision(name));
        }
        self.index.insert(name, self.tools.len());
        self.tools.push(tool);
        Ok(())
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.index.get(name).map(|&i| &self.tools[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Tool names in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    /// The allow-list view: tool names as an ordered set.
    pub fn allowed(&self) -> BTreeSet<String> {
        self.index.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Tool>> {
        self.tools.iter()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Invoke a tool by name.
    pub async fn call(&self, name: &str, input: &str) -> std::result::Result<String, ToolError> {
        let tool = self
            .get(name)
            .ok_or_else(|| ToolError::NotFound(name.to_string()))?;
        tool.call(input).await
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn echo(name: &str) -> Arc<dyn Tool> {
        FnTool::new(name, "Echoes back the input", |input: &str| Ok(input.to_string())).shared()
    }

    struct PairToolkit;

    impl Toolkit for PairToolkit {
        fn tools(&self) -> Vec<Arc<dyn Tool>> {
            vec![echo("first"), echo("second")]
        }
    }

    #[test]
    fn registry_register_and_lookup() {
        let registry = ToolRegistry::from_tools(vec![echo("echo")]).unwrap();
        assert!(registry.get("echo").is_some());
        assert!(registry.get("nonexistent").is_none());
    }

    #[test]
    fn registry_rejects_duplicate_names() {
        let err = ToolRegistry::from_tools(vec![echo("echo"), echo("echo")]).unwrap_err();
        assert!(matches!(err, Error::ToolNameCollision(name) if name == "echo"));
    }

    #[test]
    fn registry_preserves_registration_order() {
        let registry =
            ToolRegistry::from_tools(vec![echo("zeta"), echo("alpha"), echo("mid")]).unwrap();
        assert_eq!(registry.names(), vec!["zeta", "alpha", "mid"]);
        let allowed: Vec<_> = registry.allowed().into_iter().collect();
        assert_eq!(allowed, vec!["alpha", "mid", "zeta"]);
    }

    #[test]
    fn toolkit_and_list_normalize_identically() {
        let from_kit = ToolRegistry::from_tools(&PairToolkit).unwrap();
        let from_list = ToolRegistry::from_tools(PairToolkit.tools()).unwrap();
        assert_eq!(from_kit.names(), from_list.names());
    }

    #[tokio::test]
    async fn registry_call_tool() {
        let registry = ToolRegistry::from_tools(vec![echo("echo")]).unwrap();
        let out = registry.call("echo", "hello world").await.unwrap();
        assert_eq!(out, "hello world");
    }

    #[tokio::test]
    async fn registry_call_missing_tool() {
        let registry = ToolRegistry::new();
        let err = registry.call("nonexistent", "").await.unwrap_err();
        assert!(matches!(err, ToolError::NotFound(_)));
    }
}
