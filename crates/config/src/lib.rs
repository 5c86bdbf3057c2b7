//! Configuration loading, validation, and management for Agentry.
//!
//! Loads configuration from `~/.agentry/config.toml` with environment
//! variable overrides. Validates all settings at startup.
//!
//! Named agents are declared as `[agents.<name>]` tables: a `kind` plus the
//! options that kind's recipe recognizes.
//!
//! ```toml
//! [agents.sales]
//! kind = "CSVAgent"
//! path = "data/sales.csv"
//!
//! [agents.warehouse]
//! kind = "SQLAgent"
//! database_uri = "sqlite://warehouse.db"
//! ```

use agentry_core::agent::{EarlyStopping, ExecutorLimits};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.agentry/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key (can be overridden per-provider)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Default LLM provider
    #[serde(default = "default_provider")]
    pub default_provider: String,

    /// Default model
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Default temperature
    #[serde(default = "default_temperature")]
    pub default_temperature: f32,

    /// Default max tokens per LLM response
    #[serde(default = "default_max_tokens")]
    pub default_max_tokens: u32,

    /// Embedding model used by vector stores (keyword search when unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding_model: Option<String>,

    /// Executor defaults
    #[serde(default)]
    pub executor: ExecutorConfig,

    /// Provider-specific configurations
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,

    /// Named agent definitions
    #[serde(default)]
    pub agents: BTreeMap<String, AgentDefinition>,
}

fn default_provider() -> String {
    "openai".into()
}
fn default_model() -> String {
    "gpt-4o-mini".into()
}
fn default_temperature() -> f32 {
    0.0
}
fn default_max_tokens() -> u32 {
    1024
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("default_provider", &self.default_provider)
            .field("default_model", &self.default_model)
            .field("default_temperature", &self.default_temperature)
            .field("default_max_tokens", &self.default_max_tokens)
            .field("embedding_model", &self.embedding_model)
            .field("executor", &self.executor)
            .field("providers", &self.providers)
            .field("agents", &self.agents)
            .finish()
    }
}

/// Per-provider overrides.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("default_model", &self.default_model)
            .finish()
    }
}

/// Defaults applied to every executor the CLI builds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutorConfig {
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    #[serde(default)]
    pub early_stopping: EarlyStopping,

    #[serde(default = "default_true")]
    pub verbose: bool,
}

fn default_max_iterations() -> u32 {
    15
}
fn default_true() -> bool {
    true
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            early_stopping: EarlyStopping::default(),
            verbose: true,
        }
    }
}

impl ExecutorConfig {
    pub fn limits(&self) -> ExecutorLimits {
        ExecutorLimits::default()
            .with_max_iterations(self.max_iterations)
            .with_early_stopping(self.early_stopping)
    }
}

/// A named agent: its kind plus the options that kind's recipe reads.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentDefinition {
    /// Registered agent kind (e.g. "CSVAgent")
    pub kind: String,

    /// Source file for CSVAgent / JsonAgent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    /// Table parsing options for CSVAgent
    #[serde(default)]
    pub csv: CsvSettings,

    /// Connection string for SQLAgent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_uri: Option<String>,

    /// Strategy name for AgentInitializer
    #[serde(default, rename = "agent", skip_serializing_if = "Option::is_none")]
    pub strategy: Option<String>,

    /// Persona for AutoGPTAgent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_role: Option<String>,

    /// Built-in tool names handed to AgentInitializer / AutoGPTAgent
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<String>,

    /// Document collections for the vector-store agents
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub vector_stores: Vec<VectorStoreSettings>,

    /// Attach a conversational buffer memory
    #[serde(default)]
    pub memory: bool,
}

/// Table parsing options (delimiter, header row).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CsvSettings {
    #[serde(default = "default_delimiter")]
    pub delimiter: char,

    #[serde(default = "default_true")]
    pub has_headers: bool,
}

fn default_delimiter() -> char {
    ','
}

impl Default for CsvSettings {
    fn default() -> Self {
        Self {
            delimiter: default_delimiter(),
            has_headers: true,
        }
    }
}

/// A directory or file of text documents exposed as a named vector store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorStoreSettings {
    pub name: String,
    pub description: String,
    pub path: PathBuf,
}

impl AppConfig {
    /// Load configuration from the default path (~/.agentry/config.toml).
    ///
    /// Also checks environment variables:
    /// - `AGENTRY_API_KEY` (highest priority), then `OPENAI_API_KEY`
    /// - `AGENTRY_PROVIDER`, `AGENTRY_MODEL`, `AGENTRY_API_URL`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides using the given lookup.
    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if self.api_key.is_none() {
            self.api_key = lookup("AGENTRY_API_KEY").or_else(|| lookup("OPENAI_API_KEY"));
        }

        if let Some(provider) = lookup("AGENTRY_PROVIDER") {
            self.default_provider = provider;
        }

        if let Some(model) = lookup("AGENTRY_MODEL") {
            self.default_model = model;
        }

        if let Some(url) = lookup("AGENTRY_API_URL") {
            self.providers
                .entry(self.default_provider.clone())
                .or_default()
                .api_url = Some(url);
        }
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".agentry")
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.default_temperature < 0.0 || self.default_temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "default_temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.executor.max_iterations == 0 {
            return Err(ConfigError::ValidationError(
                "executor.max_iterations must be at least 1".into(),
            ));
        }

        for (name, agent) in &self.agents {
            if agent.kind.trim().is_empty() {
                return Err(ConfigError::ValidationError(format!(
                    "agents.{name}.kind must not be empty"
                )));
            }
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Look up a named agent definition.
    pub fn agent(&self, name: &str) -> Option<&AgentDefinition> {
        self.agents.get(name)
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            default_provider: default_provider(),
            default_model: default_model(),
            default_temperature: default_temperature(),
            default_max_tokens: default_max_tokens(),
            embedding_model: None,
            executor: ExecutorConfig::default(),
            providers: HashMap::new(),
            agents: BTreeMap::new(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert_eq!(config.default_provider, "openai");
        assert_eq!(config.executor.max_iterations, 15);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.default_model, config.default_model);
        assert_eq!(parsed.executor.early_stopping, EarlyStopping::Force);
    }

    #[test]
    fn invalid_temperature_rejected() {
        let mut config = AppConfig::default();
        config.default_temperature = 5.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_iterations_rejected() {
        let mut config = AppConfig::default();
        config.executor.max_iterations = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let config = AppConfig::load_from(Path::new("/nonexistent/agentry.toml")).unwrap();
        assert_eq!(config.default_model, "gpt-4o-mini");
    }

    #[test]
    fn load_from_file_validates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "default_temperature = 3.5\n").unwrap();
        let err = AppConfig::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));

        std::fs::write(&path, "default_model = \"gpt-4o\"\n").unwrap();
        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.default_model, "gpt-4o");
    }

    #[test]
    fn agent_definitions_parse() {
        let toml_str = r#"
            [executor]
            max_iterations = 8
            early_stopping = "generate"

            [agents.sales]
            kind = "CSVAgent"
            path = "data/sales.csv"
            csv = { delimiter = ";" }

            [agents.helper]
            kind = "AgentInitializer"
            agent = "zero-shot-react-description"
            tools = ["calculator"]
            memory = true

            [agents.docs]
            kind = "VectorStoreRouterAgent"

            [[agents.docs.vector_stores]]
            name = "handbook"
            description = "Company handbook"
            path = "docs/handbook"
        "#;
        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.executor.limits().max_iterations, Some(8));
        assert_eq!(config.executor.early_stopping, EarlyStopping::Generate);

        let sales = config.agent("sales").unwrap();
        assert_eq!(sales.kind, "CSVAgent");
        assert_eq!(sales.csv.delimiter, ';');
        assert!(sales.csv.has_headers);

        let helper = config.agent("helper").unwrap();
        assert_eq!(helper.strategy.as_deref(), Some("zero-shot-react-description"));
        assert_eq!(helper.tools, vec!["calculator".to_string()]);
        assert!(helper.memory);

        let docs = config.agent("docs").unwrap();
        assert_eq!(docs.vector_stores.len(), 1);
        assert_eq!(docs.vector_stores[0].name, "handbook");
    }

    #[test]
    fn env_overrides_apply() {
        let mut config = AppConfig::default();
        config.apply_env(|key| match key {
            "OPENAI_API_KEY" => Some("sk-test".into()),
            "AGENTRY_MODEL" => Some("gpt-4o".into()),
            "AGENTRY_API_URL" => Some("http://localhost:11434/v1".into()),
            _ => None,
        });
        assert!(config.has_api_key());
        assert_eq!(config.default_model, "gpt-4o");
        assert_eq!(
            config.providers["openai"].api_url.as_deref(),
            Some("http://localhost:11434/v1")
        );
    }

    #[test]
    fn debug_redacts_api_key() {
        let mut config = AppConfig::default();
        config.api_key = Some("sk-secret".into());
        let dbg = format!("{config:?}");
        assert!(!dbg.contains("sk-secret"));
        assert!(dbg.contains("[REDACTED]"));
    }
}
