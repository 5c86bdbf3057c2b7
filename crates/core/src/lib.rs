//! # Agentry Core
//!
//! Domain types, traits, and error definitions for the Agentry agent
//! construction toolkit. This crate has **no framework dependencies**: it
//! defines the model every other crate implements against.
//!
//! ## Design Philosophy
//!
//! Every external collaborator (language model provider, tool, memory,
//! vector store) is a trait here. Implementations live in their own crates,
//! which keeps the dependency graph pointing inward and lets tests swap in
//! scripted stubs.

pub mod agent;
pub mod chain;
pub mod error;
pub mod event;
pub mod memory;
pub mod message;
pub mod prompt;
pub mod provider;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use agent::{AgentKind, EarlyStopping, ExecutorLimits, ExecutorState, Persona};
pub use chain::LlmChain;
pub use error::{Error, MemoryError, ProviderError, Result, ToolError};
pub use event::{AgentEvent, Callbacks, EventBus, RunCallback};
pub use memory::{ConversationMemory, Document, VectorStore, VectorStoreInfo};
pub use message::{Conversation, Message, Role};
pub use prompt::PromptTemplate;
pub use provider::{LanguageModel, Provider, ProviderRequest, ProviderResponse, Usage};
pub use tool::{FnTool, IntoTools, Tool, ToolRegistry, Toolkit};
