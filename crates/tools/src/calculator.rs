//! Calculator tool: evaluates arithmetic expressions.
//!
//! Shares the evaluator with the table query tool, without a table bound.

use async_trait::async_trait;
use agentry_core::error::ToolError;
use agentry_core::tool::Tool;
use crate::expr;
use crate::table::sanitize_input;

pub struct CalculatorTool;

#[async_trait]
impl Tool for CalculatorTool {
    fn name(&self) -> &str {
        "calculator"
    }

    fn description(&self) -> &str {
        "Useful for when you need to answer questions about math. \
         Input is an arithmetic expression using +, -, *, / and parentheses, e.g. (2 + 3) * 4."
    }

    async fn call(&self, input: &str) -> Result<String, ToolError> {
        Ok(match expr::evaluate(sanitize_input(input)) {
            Ok(value) => expr::format_number(value),
            Err(e) => format!("Error: {e}"),
        })
    }
}
