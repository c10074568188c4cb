use anyhow::Result;
use async_trait::async_trait;

/// A parameterized SQL statement
///
/// Parameters are bound by name (`@name` in the SQL text). `columns` is the
/// projection a query yields, in order; it is empty for DML.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    sql: String,
    params: Vec<(String, String)>,
    columns: Vec<String>,
}

impl Statement {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
            columns: Vec::new(),
        }
    }

    /// Bind a string value to `@name`
    pub fn with_param(mut self, name: &str, value: impl Into<String>) -> Self {
        self.params.push((name.to_string(), value.into()));
        self
    }

    /// Declare the columns a query returns
    pub fn with_columns(mut self, columns: &[&str]) -> Self {
        self.columns = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }
}

/// A single result row, cells in projection order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    cells: Vec<(String, String)>,
}

impl Row {
    pub fn new(cells: Vec<(String, String)>) -> Self {
        Self { cells }
    }

    pub fn column_by_name(&self, name: &str) -> Option<&str> {
        self.cells
            .iter()
            .find(|(column, _)| column == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Capability to run statements against the backing store
///
/// Implementations must be safe to share between concurrent requests.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    /// Run a read-only query and return every row it yields.
    async fn query(&self, statement: &Statement) -> Result<Vec<Row>>;

    /// Run a DML statement and return the number of affected rows.
    async fn execute(&self, statement: &Statement) -> Result<u64>;
}
