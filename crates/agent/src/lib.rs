//! Agent construction and the reasoning loop.
//!
//! An agent kind (`"CSVAgent"`, `"SQLAgent"`, ...) names a recipe in the
//! [`AgentRegistry`]. The recipe gathers tools, assembles a prompt around
//! them and binds the result to a language model, returning an
//! [`AgentExecutor`]. Every executor runs the same loop:
//!
//! 1. **Plan**: the model proposes a tool call or a final answer
//! 2. **Act**: the tool is called if the allow-list permits it
//! 3. **Observe**: the result goes back to the model as the next observation
//!
//! The loop ends with an answer, with a marked partial answer when the
//! iteration limit is hit, or with a typed error carrying the steps so far.

pub mod agents;
pub mod executor;
pub mod output_parser;
pub mod prompt;
pub mod recipes;
pub mod registry;
pub mod templates;

#[cfg(test)]
mod test_helpers;

pub use agents::{Agent, AgentAction, AgentDecision, AgentFinish, AgentStep, AgentStrategy};
pub use agents::{AutonomousAgent, ReactAgent};
pub use executor::{AgentExecutor, BlockingAgentExecutor, RunFailure, RunResult};
pub use output_parser::{OutputParser, ParseError};
pub use prompt::{AssembledPrompt, PromptParts, assemble};
pub use recipes::{AgentOptions, AgentRecipe};
pub use registry::AgentRegistry;
