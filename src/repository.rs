use anyhow::{Context, anyhow};
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::error::StoreError;
use crate::executor::{QueryExecutor, Statement};

pub const STORAGE_TABLE: &str = "storage";
pub const STORAGE_COLUMNS: [&str; 2] = ["key", "value"];

pub const SELECT_ENTRY_SQL: &str = "SELECT `key`, `value` FROM storage WHERE `key` = @key";
pub const UPSERT_ENTRY_SQL: &str =
    "INSERT OR UPDATE INTO storage (`key`, `value`) VALUES (@key, @value)";

/// The two logical operations the HTTP layer needs from a store
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Fetch the value stored under `key`.
    async fn get(&self, key: &str) -> Result<String, StoreError>;

    /// Insert `key`, or replace its value if it already exists.
    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// Maps key lookups and upserts onto the `storage` table
///
/// Every call issues exactly one statement, bounded by `timeout`. Failures
/// are wrapped and returned, never retried here.
#[derive(Clone)]
pub struct StorageRepository {
    executor: Arc<dyn QueryExecutor>,
    timeout: Duration,
}

impl StorageRepository {
    pub fn new(executor: Arc<dyn QueryExecutor>, timeout: Duration) -> Self {
        Self { executor, timeout }
    }

    async fn with_deadline<T>(
        &self,
        operation: impl Future<Output = anyhow::Result<T>>,
    ) -> anyhow::Result<T> {
        tokio::time::timeout(self.timeout, operation)
            .await
            .map_err(|_| anyhow!("statement timed out after {:?}", self.timeout))?
    }
}

fn select_entry(key: &str) -> Statement {
    Statement::new(SELECT_ENTRY_SQL)
        .with_param("key", key)
        .with_columns(&STORAGE_COLUMNS)
}

fn upsert_entry(key: &str, value: &str) -> Statement {
    Statement::new(UPSERT_ENTRY_SQL)
        .with_param("key", key)
        .with_param("value", value)
}

#[async_trait]
impl KvStore for StorageRepository {
    async fn get(&self, key: &str) -> Result<String, StoreError> {
        let statement = select_entry(key);
        tracing::info!("query {} with params {:?}", statement.sql(), statement.params());

        let rows = self
            .with_deadline(self.executor.query(&statement))
            .await
            .context("query storage entry")?;

        // key is the primary key, so the first row is the only row
        let Some(row) = rows.first() else {
            return Err(StoreError::NotFound(key.to_string()));
        };

        let value = row
            .column_by_name("value")
            .context("storage row has no value column")?
            .to_string();

        tracing::debug!("key {} has value {}", key, value);
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let statement = upsert_entry(key, value);
        tracing::info!("query {} with params {:?}", statement.sql(), statement.params());

        let affected = self
            .with_deadline(self.executor.execute(&statement))
            .await
            .context("upsert storage entry")?;

        tracing::debug!("upserted key {} ({} row(s) affected)", key, affected);
        Ok(())
    }
}
