//! Memory traits: conversational memory and vector retrieval.
//!
//! Conversational memory carries chat history between runs of one executor;
//! it is always passed explicitly as a handle, never shared implicitly.
//! Vector stores back the retrieval tools of the vector-store agents.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use crate::error::MemoryError;

/// Chat history exposed to prompts as named variables.
#[async_trait]
pub trait ConversationMemory: Send + Sync {
    /// Names of the prompt variables this memory fills (e.g. `chat_history`).
    fn memory_variables(&self) -> Vec<String>;

    /// Current values for each memory variable.
    async fn load(&self) -> std::result::Result<HashMap<String, String>, MemoryError>;

    /// Record one exchange.
    async fn save_context(&self, input: &str, output: &str) -> std::result::Result<(), MemoryError>;

    /// Forget everything.
    async fn clear(&self) -> std::result::Result<(), MemoryError>;
}

/// A retrievable piece of text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub content: String,

    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl Document {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            metadata: serde_json::Map::new(),
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.metadata
            .insert("source".into(), serde_json::Value::String(source.into()));
        self
    }

    /// The `source` metadata entry, if any.
    pub fn source(&self) -> Option<&str> {
        self.metadata.get("source").and_then(|v| v.as_str())
    }
}

/// A store that can find documents similar to a query.
#[async_trait]
pub trait VectorStore: Send + Sync {
    async fn similarity_search(
        &self,
        query: &str,
        k: usize,
    ) -> std::result::Result<Vec<Document>, MemoryError>;
}

/// A named vector store plus a description of what it contains.
///
/// The name becomes a tool name; the description tells the model when to use it.
#[derive(Clone)]
pub struct VectorStoreInfo {
    pub name: String,
    pub description: String,
    pub store: Arc<dyn VectorStore>,
}

impl VectorStoreInfo {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        store: Arc<dyn VectorStore>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            store,
        }
    }
}

impl std::fmt::Debug for VectorStoreInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VectorStoreInfo")
            .field("name", &self.name)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}
