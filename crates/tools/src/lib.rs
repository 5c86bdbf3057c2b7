//! Toolkits the agent recipes build on.
//!
//! - [`json`]: key listing and value lookup over a JSON document
//! - [`table`]: CSV tables and dataframe-style queries over them
//! - [`sql`]: SQLite access plus query, schema, listing and checking tools
//! - [`vectorstore`]: question answering over one or several vector stores
//! - [`calculator`]: plain arithmetic

pub mod calculator;
pub mod expr;
pub mod json;
pub mod sql;
pub mod table;
pub mod vectorstore;

use agentry_core::tool::Tool;
use std::sync::Arc;

pub use calculator::CalculatorTool;
pub use json::{JsonSpec, JsonToolkit};
pub use sql::{SqlDatabase, SqlDatabaseToolkit};
pub use table::{CsvOptions, Table, TableQueryTool};
pub use vectorstore::{VectorStoreQaTool, VectorStoreRouterToolkit, VectorStoreToolkit};

/// Names accepted by [`builtin_tool`].
pub const BUILTIN_TOOLS: &[&str] = &["calculator"];

/// Look up a standalone built-in tool by name.
pub fn builtin_tool(name: &str) -> Option<Arc<dyn Tool>> {
    match name {
        "calculator" => Some(Arc::new(CalculatorTool)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_listed_builtin_resolves() {
        for name in BUILTIN_TOOLS {
            assert_eq!(builtin_tool(name).unwrap().name(), *name);
        }
        assert!(builtin_tool("shell").is_none());
    }
}
