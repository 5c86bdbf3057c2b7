//! Construction recipes, one per agent kind.
//!
//! Every recipe turns a language model plus [`AgentOptions`] into an
//! [`AgentExecutor`]. Recipes hold no state: constructing twice with the same
//! options yields executors with the same prompt and allow-list. Any failure
//! opening a resource aborts construction; no partial executor is returned.

mod autogpt;
mod csv;
mod initializer;
mod json;
mod sql;
mod vectorstore;

pub use autogpt::AutoGptAgentRecipe;
pub use csv::CsvAgentRecipe;
pub use initializer::AgentInitializerRecipe;
pub use json::JsonAgentRecipe;
pub use sql::SqlAgentRecipe;
pub use vectorstore::{VectorStoreAgentRecipe, VectorStoreRouterAgentRecipe};

use agentry_core::agent::{AgentKind, ExecutorLimits};
use agentry_core::error::{Error, Result};
use agentry_core::memory::{ConversationMemory, VectorStoreInfo};
use agentry_core::provider::LanguageModel;
use agentry_core::tool::{IntoTools, Tool, ToolRegistry};
use agentry_tools::CsvOptions;
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;

use crate::agents::Agent;
use crate::executor::AgentExecutor;

/// Kind-specific construction options. Each recipe reads the fields it needs
/// and ignores the rest.
#[derive(Clone)]
pub struct AgentOptions {
    /// Source file (CSVAgent, JsonAgent).
    pub path: Option<PathBuf>,
    pub csv_options: CsvOptions,
    /// An already parsed document (JsonAgent); takes precedence over `path`.
    pub json: Option<serde_json::Value>,
    pub database_uri: Option<String>,
    /// One store for VectorStoreAgent, one or more for VectorStoreRouterAgent.
    pub vector_stores: Vec<VectorStoreInfo>,
    /// Strategy name (AgentInitializer).
    pub strategy: Option<String>,
    pub memory: Option<Arc<dyn ConversationMemory>>,
    pub tools: Vec<Arc<dyn Tool>>,
    pub ai_name: Option<String>,
    pub ai_role: Option<String>,
    /// Overrides the recipe's default limits.
    pub limits: Option<ExecutorLimits>,
    /// Log each step at `info`. On unless turned off.
    pub verbose: bool,
}

impl Default for AgentOptions {
    fn default() -> Self {
        Self {
            path: None,
            csv_options: CsvOptions::default(),
            json: None,
            database_uri: None,
            vector_stores: Vec::new(),
            strategy: None,
            memory: None,
            tools: Vec::new(),
            ai_name: None,
            ai_role: None,
            limits: None,
            verbose: true,
        }
    }
}

impl AgentOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_csv_options(mut self, options: CsvOptions) -> Self {
        self.csv_options = options;
        self
    }

    pub fn with_json(mut self, value: serde_json::Value) -> Self {
        self.json = Some(value);
        self
    }

    pub fn with_database_uri(mut self, uri: impl Into<String>) -> Self {
        self.database_uri = Some(uri.into());
        self
    }

    pub fn with_vector_store(mut self, info: VectorStoreInfo) -> Self {
        self.vector_stores.push(info);
        self
    }

    pub fn with_strategy(mut self, strategy: impl Into<String>) -> Self {
        self.strategy = Some(strategy.into());
        self
    }

    pub fn with_memory(mut self, memory: Arc<dyn ConversationMemory>) -> Self {
        self.memory = Some(memory);
        self
    }

    /// Append tools from a toolkit, a list, or a single tool.
    pub fn with_tools(mut self, tools: impl IntoTools) -> Self {
        self.tools.extend(tools.into_tools());
        self
    }

    pub fn with_persona(mut self, name: impl Into<String>, role: impl Into<String>) -> Self {
        self.ai_name = Some(name.into());
        self.ai_role = Some(role.into());
        self
    }

    pub fn with_limits(mut self, limits: ExecutorLimits) -> Self {
        self.limits = Some(limits);
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}

impl std::fmt::Debug for AgentOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentOptions")
            .field("path", &self.path)
            .field("csv_options", &self.csv_options)
            .field("json", &self.json.is_some())
            .field("database_uri", &self.database_uri)
            .field("vector_stores", &self.vector_stores)
            .field("strategy", &self.strategy)
            .field("memory", &self.memory.is_some())
            .field("tools", &self.tools.iter().map(|t| t.name()).collect::<Vec<_>>())
            .field("ai_name", &self.ai_name)
            .field("ai_role", &self.ai_role)
            .field("limits", &self.limits)
            .field("verbose", &self.verbose)
            .finish()
    }
}

/// Builds executors of one agent kind.
#[async_trait]
pub trait AgentRecipe: Send + Sync {
    /// The kind this recipe is registered under.
    fn describe(&self) -> AgentKind;

    /// One-line summary for listings.
    fn summary(&self) -> &'static str;

    /// Options that must be present for [`construct`](Self::construct) to succeed.
    fn required_options(&self) -> &'static [&'static str] {
        &[]
    }

    async fn construct(&self, llm: LanguageModel, options: AgentOptions) -> Result<AgentExecutor>;
}

fn missing(kind: &AgentKind, option: &str) -> Error {
    Error::MissingOption {
        kind: kind.to_string(),
        option: option.to_string(),
    }
}

/// Fail with [`Error::MissingOption`] when `value` is absent.
fn require<T>(value: Option<T>, kind: &AgentKind, option: &str) -> Result<T> {
    value.ok_or_else(|| missing(kind, option))
}

/// Bind `agent` to `tools` and apply the shared executor options.
fn build_executor(
    kind: AgentKind,
    agent: impl Agent + 'static,
    tools: Vec<Arc<dyn Tool>>,
    default_limits: ExecutorLimits,
    options: &AgentOptions,
) -> Result<AgentExecutor> {
    let registry = ToolRegistry::from_tools(tools)?;
    Ok(AgentExecutor::new(kind, Box::new(agent), registry)?
        .with_limits(options.limits.unwrap_or(default_limits))
        .with_verbose(options.verbose))
}
