use anyhow::{Context, Result};
use async_trait::async_trait;
use gcloud_gax::grpc::{Code, Status};
use gcloud_googleapis::spanner::admin::database::v1::{
    CreateDatabaseRequest, GetDatabaseDdlRequest, GetDatabaseRequest, UpdateDatabaseDdlRequest,
};
use gcloud_googleapis::spanner::admin::instance::v1::{
    CreateInstanceRequest, GetInstanceRequest, Instance,
};
use gcloud_spanner::admin::client::Client as AdminClient;
use gcloud_spanner::admin::AdminClientConfig;
use gcloud_spanner::client::{Client, ClientConfig};
use std::future::Future;
use std::sync::Arc;

use crate::config::SpannerConfig;
use crate::executor::{QueryExecutor, Row, Statement};
use crate::repository::STORAGE_TABLE;

/// Shareable Spanner client for use across async handlers
#[derive(Clone)]
pub struct SpannerClient {
    inner: Arc<Client>,
}

impl SpannerClient {
    /// Create a new Spanner client from configuration
    ///
    /// The gcloud-spanner library automatically detects the
    /// SPANNER_EMULATOR_HOST environment variable and connects to
    /// the emulator when set, or production Spanner otherwise.
    ///
    /// The instance, database and `storage` table are created first if they
    /// don't exist.
    pub async fn from_config(config: &SpannerConfig) -> Result<Self> {
        auto_provision(config).await?;

        let database_path = config.database_path();

        match &config.emulator_host {
            Some(host) => tracing::info!("Connecting to Spanner emulator at: {}", host),
            None => tracing::info!("Connecting to production Spanner"),
        }

        // ClientConfig::default() automatically uses SPANNER_EMULATOR_HOST if set
        let client = Client::new(&database_path, ClientConfig::default())
            .await
            .context("Failed to create Spanner client")?;

        tracing::info!(
            "Successfully connected to Spanner database: {}",
            database_path
        );

        Ok(Self {
            inner: Arc::new(client),
        })
    }
}

fn to_spanner_statement(statement: &Statement) -> gcloud_spanner::statement::Statement {
    let mut stmt = gcloud_spanner::statement::Statement::new(statement.sql());
    for (name, value) in statement.params() {
        stmt.add_param(name, value);
    }
    stmt
}

#[async_trait]
impl QueryExecutor for SpannerClient {
    async fn query(&self, statement: &Statement) -> Result<Vec<Row>> {
        let mut tx = self.inner
            .single()
            .await
            .context("Failed to create read transaction")?;

        let mut result_set = tx
            .query(to_spanner_statement(statement))
            .await
            .context("Failed to query Spanner")?;

        let mut rows = Vec::new();
        while let Some(row) = result_set.next().await? {
            let mut cells = Vec::with_capacity(statement.columns().len());
            for column in statement.columns() {
                let value: String = row
                    .column_by_name(column)
                    .with_context(|| format!("Failed to read column '{}'", column))?;
                cells.push((column.clone(), value));
            }
            rows.push(Row::new(cells));
        }

        tracing::debug!("Query returned {} row(s)", rows.len());
        Ok(rows)
    }

    async fn execute(&self, statement: &Statement) -> Result<u64> {
        // One attempt: an aborted commit is returned, not replayed
        let mut tx = self.inner
            .begin_read_write_transaction()
            .await
            .context("Failed to begin read-write transaction")?;

        let result = tx.update(to_spanner_statement(statement)).await;
        let (_, affected) = tx
            .end(result, None)
            .await
            .context("Failed to execute statement on Spanner")?;

        tracing::debug!("Statement affected {} row(s)", affected);
        Ok(u64::try_from(affected).unwrap_or_default())
    }
}

/// Automatically provision Spanner instance, database, and table
///
/// Checks whether the configured resources exist and creates them if needed,
/// so the emulator works without any manual setup.
async fn auto_provision(config: &SpannerConfig) -> Result<()> {
    tracing::info!("Starting auto-provisioning checks...");

    let admin_client = AdminClient::new(AdminClientConfig::default())
        .await
        .context("Failed to create Spanner admin client")?;

    let project_path = format!("projects/{}", config.project);
    let instance_path = format!("{}/instances/{}", project_path, config.instance);
    let database_path = config.database_path();

    let instance = admin_client
        .instance()
        .get_instance(
            GetInstanceRequest {
                name: instance_path.clone(),
                field_mask: None,
            },
            None,
        )
        .await;
    get_or_create("Instance", &instance_path, instance, || async {
        let mut operation = admin_client
            .instance()
            .create_instance(instance_request(config, &project_path, &instance_path), None)
            .await
            .context("Failed to start instance creation")?;
        operation.wait(None).await.context("Failed to create instance")?;
        Ok(())
    })
    .await?;

    let database = admin_client
        .database()
        .get_database(
            GetDatabaseRequest {
                name: database_path.clone(),
            },
            None,
        )
        .await;
    get_or_create("Database", &database_path, database, || async {
        let mut operation = admin_client
            .database()
            .create_database(database_request(&instance_path, &database_path)?, None)
            .await
            .context("Failed to start database creation")?;
        operation.wait(None).await.context("Failed to create database")?;
        Ok(())
    })
    .await?;

    ensure_table_exists(&admin_client, &database_path).await?;

    tracing::info!("Auto-provisioning complete");
    Ok(())
}

/// Run `create` only when the lookup came back NotFound
async fn get_or_create<T, C, F>(
    kind: &str,
    path: &str,
    lookup: std::result::Result<T, Status>,
    create: C,
) -> Result<()>
where
    C: FnOnce() -> F,
    F: Future<Output = Result<()>>,
{
    match lookup {
        Ok(_) => {
            tracing::info!("{} already exists: {}", kind, path);
            Ok(())
        }
        Err(status) if status.code() == Code::NotFound => {
            tracing::info!("{} not found, creating: {}", kind, path);
            create().await?;
            tracing::info!("{} created successfully: {}", kind, path);
            Ok(())
        }
        Err(status) => Err(anyhow::anyhow!(
            "Failed to check {} existence: {}",
            kind.to_lowercase(),
            status.message()
        )),
    }
}

fn instance_request(
    config: &SpannerConfig,
    project_path: &str,
    instance_path: &str,
) -> CreateInstanceRequest {
    let instance_config = match config.emulator_host {
        Some(_) => format!("{}/instanceConfigs/emulator-config", project_path),
        None => format!("{}/instanceConfigs/regional-us-central1", project_path),
    };

    CreateInstanceRequest {
        parent: project_path.to_string(),
        instance_id: config.instance.clone(),
        instance: Some(Instance {
            name: instance_path.to_string(),
            config: instance_config,
            display_name: format!("{} instance", config.instance),
            node_count: 1,
            ..Default::default()
        }),
    }
}

fn database_request(instance_path: &str, database_path: &str) -> Result<CreateDatabaseRequest> {
    let database_id = database_path
        .rsplit('/')
        .next()
        .filter(|id| !id.is_empty())
        .context("Invalid database path")?;

    Ok(CreateDatabaseRequest {
        parent: instance_path.to_string(),
        create_statement: format!("CREATE DATABASE `{}`", database_id),
        extra_statements: vec![],
        encryption_config: None,
        database_dialect: 1, // Google Standard SQL
        proto_descriptors: vec![],
    })
}

fn storage_table_ddl() -> String {
    format!(
        r#"
CREATE TABLE {} (
    `key` STRING(MAX) NOT NULL,
    `value` STRING(MAX) NOT NULL,
) PRIMARY KEY (`key`)
"#,
        STORAGE_TABLE
    )
    .trim()
    .to_string()
}

fn is_storage_table_ddl(statement: &str) -> bool {
    statement.contains(&format!("CREATE TABLE {} ", STORAGE_TABLE))
        || statement.contains(&format!("CREATE TABLE `{}`", STORAGE_TABLE))
}

async fn ensure_table_exists(admin_client: &AdminClient, database_path: &str) -> Result<()> {
    let get_ddl_request = GetDatabaseDdlRequest {
        database: database_path.to_string(),
    };

    let ddl_response = admin_client
        .database()
        .get_database_ddl(get_ddl_request, None)
        .await
        .context("Failed to get database DDL")?;

    let table_exists = ddl_response
        .into_inner()
        .statements
        .iter()
        .any(|stmt| is_storage_table_ddl(stmt));

    if table_exists {
        tracing::info!("Table '{}' already exists", STORAGE_TABLE);
        return Ok(());
    }

    tracing::info!("Table '{}' not found, creating...", STORAGE_TABLE);

    let update_request = UpdateDatabaseDdlRequest {
        database: database_path.to_string(),
        statements: vec![storage_table_ddl()],
        operation_id: String::new(),
        proto_descriptors: vec![],
        throughput_mode: false,
    };

    let mut operation = admin_client
        .database()
        .update_database_ddl(update_request, None)
        .await
        .context("Failed to start table creation")?;

    operation
        .wait(None)
        .await
        .context("Failed to create table")?;

    tracing::info!("Table '{}' created successfully", STORAGE_TABLE);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::repository::{KvStore, StorageRepository};
    use std::time::Duration;

    fn emulator_config(database: &str) -> SpannerConfig {
        SpannerConfig {
            emulator_host: Some("localhost:9010".to_string()),
            project: "test-project".to_string(),
            instance: "storage-test-instance".to_string(),
            database: database.to_string(),
        }
    }

    /// Connects to the local emulator, or returns None when it isn't running
    async fn emulator_client(database: &str) -> Option<SpannerClient> {
        unsafe {
            std::env::set_var("SPANNER_EMULATOR_HOST", "localhost:9010");
        }

        let config = emulator_config(database);
        match tokio::time::timeout(Duration::from_secs(10), SpannerClient::from_config(&config)).await {
            Ok(Ok(client)) => Some(client),
            Ok(Err(e)) => {
                println!("Spanner test skipped (emulator may not be running): {:#}", e);
                None
            }
            Err(_) => {
                println!("Spanner test skipped (emulator did not answer in time)");
                None
            }
        }
    }

    #[test]
    fn test_instance_request_picks_config_by_target() {
        let emulator = instance_request(
            &emulator_config("db"),
            "projects/p",
            "projects/p/instances/storage-test-instance",
        );
        let instance = emulator.instance.unwrap();
        assert_eq!(instance.config, "projects/p/instanceConfigs/emulator-config");
        assert_eq!(emulator.instance_id, "storage-test-instance");

        let production = SpannerConfig {
            emulator_host: None,
            ..emulator_config("db")
        };
        let request = instance_request(&production, "projects/p", "projects/p/instances/i");
        assert_eq!(
            request.instance.unwrap().config,
            "projects/p/instanceConfigs/regional-us-central1"
        );
    }

    #[test]
    fn test_database_request_uses_last_path_segment() {
        let request = database_request(
            "projects/p/instances/i",
            "projects/p/instances/i/databases/storage-db",
        )
        .unwrap();

        assert_eq!(request.parent, "projects/p/instances/i");
        assert_eq!(request.create_statement, "CREATE DATABASE `storage-db`");
        assert!(database_request("projects/p/instances/i", "projects/p/instances/i/databases/").is_err());
    }

    #[tokio::test]
    async fn test_get_or_create_only_creates_on_not_found() {
        let created = &std::sync::atomic::AtomicUsize::new(0);
        let create = move || async move {
            created.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            Ok(())
        };

        get_or_create("Instance", "i", Ok::<(), Status>(()), create).await.unwrap();
        assert_eq!(created.load(std::sync::atomic::Ordering::SeqCst), 0);

        get_or_create("Instance", "i", Err::<(), _>(Status::new(Code::NotFound, "missing")), create)
            .await
            .unwrap();
        assert_eq!(created.load(std::sync::atomic::Ordering::SeqCst), 1);

        let err = get_or_create(
            "Instance",
            "i",
            Err::<(), _>(Status::new(Code::PermissionDenied, "denied")),
            create,
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("Failed to check instance existence"));
        assert_eq!(created.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    #[test]
    fn test_client_is_clonable() {
        fn assert_clone<T: Clone>() {}
        assert_clone::<SpannerClient>();
    }

    #[test]
    fn test_client_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SpannerClient>();
    }

    #[test]
    fn test_storage_table_ddl() {
        let ddl = storage_table_ddl();

        assert!(ddl.starts_with("CREATE TABLE storage ("));
        assert!(ddl.contains("`key` STRING(MAX) NOT NULL"));
        assert!(ddl.ends_with("PRIMARY KEY (`key`)"));
        assert!(is_storage_table_ddl(&ddl));
        assert!(!is_storage_table_ddl("CREATE TABLE storage_old (id INT64) PRIMARY KEY (id)"));
    }

    #[tokio::test]
    async fn test_repository_against_emulator() {
        let Some(client) = emulator_client("storage-crud-db").await else {
            return;
        };
        let repo = StorageRepository::new(Arc::new(client), Duration::from_secs(10));

        let key = uuid::Uuid::new_v4().to_string();

        assert!(matches!(repo.get(&key).await, Err(StoreError::NotFound(_))));

        repo.set(&key, "1").await.unwrap();
        assert_eq!(repo.get(&key).await.unwrap(), "1");

        repo.set(&key, "2").await.unwrap();
        assert_eq!(repo.get(&key).await.unwrap(), "2");
    }

    #[tokio::test]
    async fn test_auto_provisioning_idempotent() {
        let Some(_) = emulator_client("storage-idempotent-db").await else {
            return;
        };

        let second = SpannerClient::from_config(&emulator_config("storage-idempotent-db")).await;
        assert!(second.is_ok(), "Second auto-provisioning call should succeed");
    }
}
