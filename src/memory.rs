use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::executor::{QueryExecutor, Row, Statement};
use crate::repository::{SELECT_ENTRY_SQL, UPSERT_ENTRY_SQL};

/// In-process stand-in for the `storage` table
///
/// Understands only the statements `StorageRepository` issues; anything else
/// is rejected the way a real store rejects a malformed query.
#[derive(Default)]
pub struct MemoryExecutor {
    table: RwLock<HashMap<String, String>>,
}

impl MemoryExecutor {
    pub fn new() -> Self {
        Self::default()
    }
}

fn required_param<'a>(statement: &'a Statement, name: &str) -> Result<&'a str> {
    statement
        .param(name)
        .with_context(|| format!("missing parameter @{}", name))
}

#[async_trait]
impl QueryExecutor for MemoryExecutor {
    async fn query(&self, statement: &Statement) -> Result<Vec<Row>> {
        if statement.sql() != SELECT_ENTRY_SQL {
            bail!("unsupported query: {}", statement.sql());
        }
        let key = required_param(statement, "key")?;

        let table = self.table.read().await;
        let rows: Vec<Row> = table
            .get_key_value(key)
            .map(|(k, v)| {
                let cells = statement
                    .columns()
                    .iter()
                    .filter_map(|column| match column.as_str() {
                        "key" => Some((column.clone(), k.clone())),
                        "value" => Some((column.clone(), v.clone())),
                        _ => None,
                    })
                    .collect();
                Row::new(cells)
            })
            .into_iter()
            .collect();

        Ok(rows)
    }

    async fn execute(&self, statement: &Statement) -> Result<u64> {
        if statement.sql() != UPSERT_ENTRY_SQL {
            bail!("unsupported statement: {}", statement.sql());
        }
        let key = required_param(statement, "key")?;
        let value = required_param(statement, "value")?;

        self.table
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn select(key: &str) -> Statement {
        Statement::new(SELECT_ENTRY_SQL)
            .with_param("key", key)
            .with_columns(&["key", "value"])
    }

    fn upsert(key: &str, value: &str) -> Statement {
        Statement::new(UPSERT_ENTRY_SQL)
            .with_param("key", key)
            .with_param("value", value)
    }

    #[tokio::test]
    async fn test_empty_table_returns_no_rows() {
        let executor = MemoryExecutor::new();

        let rows = executor.query(&select("a")).await.unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_upsert_replaces_existing_row() {
        let executor = MemoryExecutor::new();

        assert_eq!(executor.execute(&upsert("a", "1")).await.unwrap(), 1);
        assert_eq!(executor.execute(&upsert("a", "2")).await.unwrap(), 1);

        let rows = executor.query(&select("a")).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].column_by_name("key"), Some("a"));
        assert_eq!(rows[0].column_by_name("value"), Some("2"));
    }

    #[tokio::test]
    async fn test_projection_follows_columns() {
        let executor = MemoryExecutor::new();
        executor.execute(&upsert("a", "1")).await.unwrap();

        let statement = Statement::new(SELECT_ENTRY_SQL)
            .with_param("key", "a")
            .with_columns(&["value"]);
        let rows = executor.query(&statement).await.unwrap();

        assert_eq!(rows[0].column_by_name("value"), Some("1"));
        assert_eq!(rows[0].column_by_name("key"), None);
    }

    #[tokio::test]
    async fn test_rejects_unknown_statements() {
        let executor = MemoryExecutor::new();

        let err = executor
            .query(&Statement::new("SELECT 1"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("unsupported query"));

        let err = executor
            .execute(&Statement::new("DELETE FROM storage"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("unsupported statement"));
    }

    #[tokio::test]
    async fn test_missing_parameter_is_an_error() {
        let executor = MemoryExecutor::new();

        let statement = Statement::new(UPSERT_ENTRY_SQL).with_param("key", "a");
        let err = executor.execute(&statement).await.unwrap_err();
        assert!(err.to_string().contains("@value"));
    }
}
