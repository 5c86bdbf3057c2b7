//! LLM Provider implementations for Agentry.
//!
//! All providers implement the `agentry_core::Provider` trait.
//! The router selects the configured provider and binds it to a model.

pub mod openai_compat;
pub mod router;

pub use openai_compat::OpenAiCompatProvider;
pub use router::{ProviderRouter, build_from_config, language_model_from_config};
