//! Error types for the Agentry domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Construction-time failures and run-time failures share one top-level
//! [`Error`]; each external collaborator has its own bounded error type.

use thiserror::Error;

/// The top-level error type for all Agentry operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Registry errors ---
    #[error("Unknown agent kind: {0}")]
    UnknownKind(String),

    #[error("Agent kind already registered: {0}")]
    DuplicateKind(String),

    // --- Construction errors ---
    #[error("Tool name collision: '{0}' is registered more than once")]
    ToolNameCollision(String),

    #[error("Failed to load data from {location}: {reason}")]
    DataLoad { location: String, reason: String },

    #[error("Unsupported agent strategy '{strategy}' (supported: {supported})")]
    UnsupportedStrategy { strategy: String, supported: String },

    #[error("Failed to open {resource}: {reason}")]
    ResourceOpen { resource: String, reason: String },

    #[error("Invalid tools for {strategy}: {reason}")]
    InvalidToolset { strategy: String, reason: String },

    #[error("Agent kind {kind} requires option '{option}'")]
    MissingOption { kind: String, option: String },

    #[error("Prompt error: {0}")]
    Prompt(String),

    // --- Run-time errors ---
    #[error("Tool invocation failed: {0}")]
    ToolInvocation(#[from] ToolError),

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Memory error: {0}")]
    Memory(#[from] MemoryError),

    #[error("Run cancelled")]
    Cancelled,

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Whether this error can only happen while constructing an executor.
    pub fn is_construction_error(&self) -> bool {
        matches!(
            self,
            Error::UnknownKind(_)
                | Error::DuplicateKind(_)
                | Error::ToolNameCollision(_)
                | Error::DataLoad { .. }
                | Error::UnsupportedStrategy { .. }
                | Error::ResourceOpen { .. }
                | Error::InvalidToolset { .. }
                | Error::MissingOption { .. }
        )
    }
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Network error: {0}")]
    Network(String),
}

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    NotFound(String),

    #[error("Tool execution failed: {tool_name}: {reason}")]
    ExecutionFailed { tool_name: String, reason: String },

    #[error("Invalid tool input: {0}")]
    InvalidInput(String),
}

#[derive(Debug, Error)]
pub enum MemoryError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Embedding generation failed: {0}")]
    EmbeddingFailed(String),
}
