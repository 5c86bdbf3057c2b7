//! SQL database access and the four tools the SQL agent works with.
//!
//! Only SQLite is supported (`sqlite:` URIs). Query failures never abort a
//! run; they are returned to the model as `Error: ...` observations.

use async_trait::async_trait;
use agentry_core::chain::LlmChain;
use agentry_core::error::{Error, ToolError};
use agentry_core::prompt::PromptTemplate;
use agentry_core::provider::LanguageModel;
use agentry_core::tool::{Tool, Toolkit};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool, TypeInfo, ValueRef};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, info};

/// Rows of sample data included with each table's schema.
const SAMPLE_ROWS: usize = 3;

/// Sample values longer than this are cut.
const SAMPLE_VALUE_CHARS: usize = 100;

pub const QUERY_CHECKER: &str = "{query}
Review the {dialect} query above for the usual mistakes:
- NOT IN used against columns that may hold NULL
- UNION where UNION ALL was intended
- BETWEEN used for a range that should be exclusive
- mismatched data types in predicates
- identifiers that need quoting
- functions called with the wrong number of arguments
- casts to the wrong data type
- joins on the wrong columns

If you find any of these, rewrite the query. Otherwise return the original query unchanged.

Query: ";

/// A handle to a SQL database.
#[derive(Debug, Clone)]
pub struct SqlDatabase {
    pool: SqlitePool,
}

impl SqlDatabase {
    /// Open a database from a URI such as `sqlite:///data/chinook.db` or
    /// `sqlite::memory:`. Other schemes fail with [`Error::ResourceOpen`].
    pub async fn from_uri(uri: &str) -> Result<Self, Error> {
        let open_error = |reason: String| Error::ResourceOpen {
            resource: uri.to_string(),
            reason,
        };

        if !uri.starts_with("sqlite:") {
            let scheme = uri.split(':').next().unwrap_or(uri);
            return Err(open_error(format!(
                "unsupported database scheme '{scheme}' (only sqlite is available)"
            )));
        }

        let options = SqliteConnectOptions::from_str(uri)
            .map_err(|e| open_error(format!("invalid SQLite URI: {e}")))?;

        // Every connection to an in-memory database is a separate database.
        let in_memory = uri.contains(":memory:") || uri.contains("mode=memory");
        let pool = SqlitePoolOptions::new()
            .max_connections(if in_memory { 1 } else { 4 })
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(|e| open_error(e.to_string()))?;

        info!(uri, "SQL database opened");
        Ok(Self { pool })
    }

    /// Wrap an existing pool.
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn dialect(&self) -> &'static str {
        "sqlite"
    }

    /// User tables, sorted by name.
    pub async fn usable_table_names(&self) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT name FROM sqlite_master \
             WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await
    }

    /// Schema and sample rows for the named tables, or for all tables.
    pub async fn table_info(&self, names: Option<&[String]>) -> Result<String, ToolError> {
        let all = self.usable_table_names().await.map_err(query_failed)?;
        let selected: Vec<String> = match names {
            Some(names) => {
                let missing: Vec<&str> = names
                    .iter()
                    .filter(|n| !all.contains(n))
                    .map(String::as_str)
                    .collect();
                if !missing.is_empty() {
                    return Err(ToolError::InvalidInput(format!(
                        "table_names {missing:?} not found in database"
                    )));
                }
                names.to_vec()
            }
            None => all,
        };

        let mut sections = Vec::with_capacity(selected.len());
        for name in &selected {
            sections.push(self.describe_table(name).await.map_err(query_failed)?);
        }
        Ok(sections.join("\n\n"))
    }

    async fn describe_table(&self, name: &str) -> Result<String, sqlx::Error> {
        let create: String = sqlx::query_scalar(
            "SELECT sql FROM sqlite_master WHERE type = 'table' AND name = ?",
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await?;

        let columns: Vec<String> =
            sqlx::query_scalar("SELECT name FROM pragma_table_info(?) ORDER BY cid")
                .bind(name)
                .fetch_all(&self.pool)
                .await?;

        let rows = sqlx::query(&format!(
            "SELECT * FROM {} LIMIT {SAMPLE_ROWS}",
            quote_identifier(name)
        ))
        .fetch_all(&self.pool)
        .await?;

        let mut sample = vec![columns.join("\t")];
        for row in &rows {
            let values = (0..row.len())
                .map(|i| {
                    render_value(row, i).map(|v| v.trim_matches('\'').chars().take(SAMPLE_VALUE_CHARS).collect::<String>())
                })
                .collect::<Result<Vec<_>, _>>()?;
            sample.push(values.join("\t"));
        }

        Ok(format!(
            "{}\n\n/*\n{} rows from {name} table:\n{}\n*/",
            create.trim(),
            rows.len(),
            sample.join("\n")
        ))
    }

    /// Execute a statement and render the rows as a list of tuples.
    /// An empty result renders as an empty string.
    pub async fn run(&self, query: &str) -> Result<String, sqlx::Error> {
        debug!(query, "Running SQL");
        let rows = sqlx::query(query).fetch_all(&self.pool).await?;
        if rows.is_empty() {
            return Ok(String::new());
        }

        let mut tuples = Vec::with_capacity(rows.len());
        for row in &rows {
            let values = (0..row.len())
                .map(|i| render_value(row, i))
                .collect::<Result<Vec<_>, _>>()?;
            tuples.push(match values.len() {
                1 => format!("({},)", values[0]),
                _ => format!("({})", values.join(", ")),
            });
        }
        Ok(format!("[{}]", tuples.join(", ")))
    }

    /// Like [`run`](Self::run), but failures come back as `Error: ...` text.
    pub async fn run_no_throw(&self, query: &str) -> String {
        match self.run(query).await {
            Ok(result) => result,
            Err(e) => format!("Error: {e}"),
        }
    }
}

fn query_failed(e: sqlx::Error) -> ToolError {
    ToolError::ExecutionFailed {
        tool_name: "sql_db_schema".into(),
        reason: e.to_string(),
    }
}

fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Render one column of a row by its storage class.
fn render_value(row: &SqliteRow, i: usize) -> Result<String, sqlx::Error> {
    let raw = row.try_get_raw(i)?;
    if raw.is_null() {
        return Ok("None".into());
    }
    let storage = raw.type_info().name().to_string();

    Ok(match storage.as_str() {
        "INTEGER" | "BOOLEAN" => row.try_get_unchecked::<i64, _>(i)?.to_string(),
        "REAL" | "NUMERIC" => {
            let value = row.try_get_unchecked::<f64, _>(i)?;
            if value.fract() == 0.0 {
                format!("{value:.1}")
            } else {
                value.to_string()
            }
        }
        "BLOB" => format!("<{} bytes>", row.try_get_unchecked::<Vec<u8>, _>(i)?.len()),
        _ => {
            let text = row.try_get_unchecked::<String, _>(i)?;
            format!("'{}'", text.replace('\'', "\\'"))
        }
    })
}

/// `sql_db_query`: runs a query and returns the rows.
pub struct QuerySqlDatabaseTool {
    db: Arc<SqlDatabase>,
}

#[async_trait]
impl Tool for QuerySqlDatabaseTool {
    fn name(&self) -> &str {
        "sql_db_query"
    }

    fn description(&self) -> &str {
        "Input is a detailed and correct SQL query; output is the result from the database. \
         If the query is wrong an error message is returned instead. If you get an error, \
         rewrite the query, check it, and try again. If you see an unknown column error, \
         use sql_db_schema to look up the correct table fields."
    }

    async fn call(&self, input: &str) -> Result<String, ToolError> {
        Ok(self.db.run_no_throw(input.trim()).await)
    }
}

/// `sql_db_schema`: schema and sample rows for a list of tables.
pub struct InfoSqlDatabaseTool {
    db: Arc<SqlDatabase>,
}

#[async_trait]
impl Tool for InfoSqlDatabaseTool {
    fn name(&self) -> &str {
        "sql_db_schema"
    }

    fn description(&self) -> &str {
        "Input is a comma-separated list of tables; output is the schema and sample rows \
         for those tables. Make sure the tables exist by calling sql_db_list_tables first. \
         Example input: 'table1, table2, table3'"
    }

    async fn call(&self, input: &str) -> Result<String, ToolError> {
        let names: Vec<String> = input
            .split(',')
            .map(|n| n.trim().trim_matches(|c| c == '\'' || c == '"' || c == '`').to_string())
            .filter(|n| !n.is_empty())
            .collect();
        Ok(match self.db.table_info(Some(&names)).await {
            Ok(info) => info,
            Err(e) => format!("Error: {e}"),
        })
    }
}

/// `sql_db_list_tables`: comma-separated table names.
pub struct ListSqlDatabaseTool {
    db: Arc<SqlDatabase>,
}

#[async_trait]
impl Tool for ListSqlDatabaseTool {
    fn name(&self) -> &str {
        "sql_db_list_tables"
    }

    fn description(&self) -> &str {
        "Input is an empty string; output is a comma-separated list of tables in the database."
    }

    async fn call(&self, _input: &str) -> Result<String, ToolError> {
        self.db
            .usable_table_names()
            .await
            .map(|names| names.join(", "))
            .map_err(|e| ToolError::ExecutionFailed {
                tool_name: self.name().into(),
                reason: e.to_string(),
            })
    }
}

/// `sql_db_query_checker`: asks the model to review a query before it runs.
pub struct QueryCheckerTool {
    chain: LlmChain,
    dialect: String,
    calls: AtomicUsize,
}

impl QueryCheckerTool {
    pub fn new(llm: LanguageModel, dialect: impl Into<String>) -> Self {
        Self {
            chain: LlmChain::new(llm, PromptTemplate::from_template(QUERY_CHECKER)),
            dialect: dialect.into(),
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of model calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl Tool for QueryCheckerTool {
    fn name(&self) -> &str {
        "sql_db_query_checker"
    }

    fn description(&self) -> &str {
        "Use this tool to double check that your query is correct before executing it. \
         Always use this tool before running a query with sql_db_query!"
    }

    async fn call(&self, input: &str) -> Result<String, ToolError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        let values = HashMap::from([
            ("query".to_string(), input.to_string()),
            ("dialect".to_string(), self.dialect.clone()),
        ]);
        self.chain
            .predict(&values, &[])
            .await
            .map_err(|e| ToolError::ExecutionFailed {
                tool_name: self.name().into(),
                reason: e.to_string(),
            })
    }
}

/// The SQL toolkit: query, schema, list tables, query checker (in that order).
pub struct SqlDatabaseToolkit {
    db: Arc<SqlDatabase>,
    llm: LanguageModel,
}

impl SqlDatabaseToolkit {
    pub fn new(db: Arc<SqlDatabase>, llm: LanguageModel) -> Self {
        Self { db, llm }
    }

    pub fn dialect(&self) -> &'static str {
        self.db.dialect()
    }
}

impl Toolkit for SqlDatabaseToolkit {
    fn tools(&self) -> Vec<Arc<dyn Tool>> {
        vec![
            Arc::new(QuerySqlDatabaseTool { db: self.db.clone() }),
            Arc::new(InfoSqlDatabaseTool { db: self.db.clone() }),
            Arc::new(ListSqlDatabaseTool { db: self.db.clone() }),
            Arc::new(QueryCheckerTool::new(self.llm.clone(), self.db.dialect())),
        ]
    }
}
