//! Agent identity, execution limits, and run state types.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::str::FromStr;

/// Stable string identifier of an agent construction recipe
/// (e.g. "JsonAgent", "SQLAgent").
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentKind(String);

impl AgentKind {
    pub fn new(kind: impl Into<String>) -> Self {
        Self(kind.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AgentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AgentKind {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Borrow<str> for AgentKind {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// What to do when the iteration budget runs out before a final answer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EarlyStopping {
    /// Return a fixed "stopped" answer (default)
    #[default]
    Force,
    /// Ask the model once more for a final answer from the steps so far
    Generate,
}

impl FromStr for EarlyStopping {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "force" => Ok(Self::Force),
            "generate" => Ok(Self::Generate),
            other => Err(format!("unknown early stopping method: {other}")),
        }
    }
}

/// Bounds on a single run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutorLimits {
    /// Maximum reasoning steps; `None` means unbounded.
    #[serde(default = "default_max_iterations")]
    pub max_iterations: Option<u32>,

    #[serde(default)]
    pub early_stopping: EarlyStopping,
}

fn default_max_iterations() -> Option<u32> {
    Some(15)
}

impl Default for ExecutorLimits {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            early_stopping: EarlyStopping::Force,
        }
    }
}

impl ExecutorLimits {
    pub fn with_max_iterations(mut self, max: u32) -> Self {
        self.max_iterations = Some(max);
        self
    }

    pub fn with_early_stopping(mut self, method: EarlyStopping) -> Self {
        self.early_stopping = method;
        self
    }

    /// Whether `iterations` completed steps still leave room for another one.
    pub fn allows(&self, iterations: u32) -> bool {
        self.max_iterations.is_none_or(|max| iterations < max)
    }
}

/// Lifecycle of one executor run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutorState {
    Idle,
    Running,
    Succeeded,
    Failed,
    StoppedByLimit,
}

impl ExecutorState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::StoppedByLimit)
    }
}

/// Name and role of an autonomous agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Persona {
    pub name: String,
    pub role: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limits_default_to_fifteen_forced() {
        let limits = ExecutorLimits::default();
        assert_eq!(limits.max_iterations, Some(15));
        assert_eq!(limits.early_stopping, EarlyStopping::Force);
        assert!(limits.allows(14));
        assert!(!limits.allows(15));
    }

    #[test]
    fn unbounded_limits_always_allow() {
        let limits = ExecutorLimits {
            max_iterations: None,
            ..Default::default()
        };
        assert!(limits.allows(u32::MAX));
    }

    #[test]
    fn early_stopping_parses() {
        assert_eq!("generate".parse::<EarlyStopping>().unwrap(), EarlyStopping::Generate);
        assert!("halt".parse::<EarlyStopping>().is_err());
    }

    #[test]
    fn terminal_states() {
        assert!(!ExecutorState::Idle.is_terminal());
        assert!(!ExecutorState::Running.is_terminal());
        assert!(ExecutorState::StoppedByLimit.is_terminal());
    }
}
