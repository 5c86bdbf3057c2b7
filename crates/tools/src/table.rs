//! Tabular data loaded from CSV, and the tool that queries it.
//!
//! The query tool binds the table to `df` and evaluates dataframe-style
//! expressions over it (see [`crate::expr`]). Evaluation errors come back to
//! the model as `Error: ...` observations so it can correct itself.

use async_trait::async_trait;
use agentry_core::error::{Error, ToolError};
use agentry_core::tool::Tool;
use std::fmt;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;
use crate::expr;

/// CSV reader settings.
#[derive(Debug, Clone, Copy)]
pub struct CsvOptions {
    pub delimiter: u8,
    pub has_headers: bool,
    pub quote: u8,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            has_headers: true,
            quote: b'"',
        }
    }
}

/// A typed table cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Int(i64),
    Float(f64),
    Text(String),
    Null,
}

impl Cell {
    fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            Cell::Null
        } else if let Ok(i) = trimmed.parse::<i64>() {
            Cell::Int(i)
        } else if let Ok(f) = trimmed.parse::<f64>() {
            Cell::Float(f)
        } else {
            Cell::Text(raw.to_string())
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Int(i) => Some(*i as f64),
            Cell::Float(f) => Some(*f),
            _ => None,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Int(i) => write!(f, "{i}"),
            Cell::Float(x) if x.fract() == 0.0 && x.abs() < 1e15 => write!(f, "{x:.1}"),
            Cell::Float(x) => write!(f, "{x}"),
            Cell::Text(s) => f.write_str(s),
            Cell::Null => f.write_str("NaN"),
        }
    }
}

/// An in-memory table with named columns.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    /// Load a CSV file. Fails with [`Error::DataLoad`] if it can't be read or parsed.
    pub fn from_path(path: &Path, options: &CsvOptions) -> Result<Self, Error> {
        let load_error = |reason: String| Error::DataLoad {
            location: path.display().to_string(),
            reason,
        };
        let file = std::fs::File::open(path).map_err(|e| load_error(e.to_string()))?;
        let table = Self::from_reader(file, options).map_err(|e| load_error(e.to_string()))?;
        debug!(path = %path.display(), rows = table.len(), columns = table.columns.len(), "Table loaded");
        Ok(table)
    }

    /// Parse CSV from any reader. Short rows are padded with nulls.
    pub fn from_reader<R: Read>(reader: R, options: &CsvOptions) -> Result<Self, csv::Error> {
        let mut rdr = csv::ReaderBuilder::new()
            .delimiter(options.delimiter)
            .quote(options.quote)
            .has_headers(options.has_headers)
            .flexible(true)
            .from_reader(reader);

        let mut columns: Vec<String> = if options.has_headers {
            rdr.headers()?.iter().map(|h| h.trim().to_string()).collect()
        } else {
            Vec::new()
        };

        let mut rows = Vec::new();
        for record in rdr.records() {
            let record = record?;
            rows.push(record.iter().map(Cell::parse).collect::<Vec<_>>());
        }

        let width = rows.iter().map(Vec::len).max().unwrap_or(0).max(columns.len());
        for i in columns.len()..width {
            columns.push(i.to_string());
        }
        for row in &mut rows {
            row.resize(width, Cell::Null);
        }

        Ok(Self { columns, rows })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn column_cells(&self, idx: usize) -> impl Iterator<Item = &Cell> {
        self.rows.iter().filter_map(move |row| row.get(idx))
    }

    /// Aligned preview of the first `n` rows with a leading index column.
    pub fn head(&self, n: usize) -> String {
        let shown = &self.rows[..n.min(self.rows.len())];
        let index_width = shown.len().saturating_sub(1).to_string().len();

        let rendered: Vec<Vec<String>> = shown
            .iter()
            .map(|row| row.iter().map(Cell::to_string).collect())
            .collect();
        let widths: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, name)| {
                rendered
                    .iter()
                    .map(|r| r[i].chars().count())
                    .chain(std::iter::once(name.chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let mut lines = Vec::with_capacity(shown.len() + 1);
        let header: Vec<String> = self
            .columns
            .iter()
            .zip(&widths)
            .map(|(name, w)| format!("{name:>w$}"))
            .collect();
        lines.push(format!("{:index_width$}  {}", "", header.join("  ")));

        for (i, row) in rendered.iter().enumerate() {
            let cells: Vec<String> = row
                .iter()
                .zip(&widths)
                .map(|(cell, w)| format!("{cell:>w$}"))
                .collect();
            lines.push(format!("{i:<index_width$}  {}", cells.join("  ")));
        }
        lines.join("\n")
    }

    /// One column as index/value lines followed by its name.
    pub fn render_column(&self, idx: usize) -> String {
        let mut lines: Vec<String> = self
            .column_cells(idx)
            .enumerate()
            .map(|(i, cell)| format!("{i:<4}{cell}"))
            .collect();
        if let Some(name) = self.columns.get(idx) {
            lines.push(format!("Name: {name}, Length: {}", self.len()));
        }
        lines.join("\n")
    }
}

/// Evaluates dataframe expressions over a table bound to `df`.
pub struct TableQueryTool {
    table: Arc<Table>,
}

impl TableQueryTool {
    pub const NAME: &'static str = "table_query";

    pub fn new(table: Arc<Table>) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &Table {
        &self.table
    }
}

/// Strip code fences and surrounding whitespace the model tends to add.
pub fn sanitize_input(input: &str) -> &str {
    let trimmed = input.trim().trim_matches('`').trim();
    trimmed
        .strip_prefix("python")
        .map(str::trim_start)
        .unwrap_or(trimmed)
}

#[async_trait]
impl Tool for TableQueryTool {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn description(&self) -> &str {
        "Evaluates an expression over the dataframe `df` and returns the result. \
         Supports df.head(n), df.shape, df.columns, len(df), df['column'] with \
         sum(), mean(), min(), max(), count() and unique(), and arithmetic on the results. \
         Input should be a single valid expression."
    }

    async fn call(&self, input: &str) -> Result<String, ToolError> {
        let expression = sanitize_input(input);
        Ok(match expr::evaluate_with(expression, Some(&self.table)) {
            Ok(value) => value.render(Some(&self.table)),
            Err(e) => format!("Error: {e}"),
        })
    }
}
