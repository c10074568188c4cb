use std::env;
use std::time::Duration;
use anyhow::{Context, Result, bail};

/// Connection settings for the Spanner backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpannerConfig {
    pub emulator_host: Option<String>,
    pub project: String,
    pub instance: String,
    pub database: String,
}

impl SpannerConfig {
    pub fn database_path(&self) -> String {
        format!(
            "projects/{}/instances/{}/databases/{}",
            self.project, self.instance, self.database
        )
    }
}

/// Where entries are persisted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackend {
    Spanner(SpannerConfig),
    Memory,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub backend: StorageBackend,
    pub service_port: u16,
    pub service_host: String,
    pub store_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build the configuration from any variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let backend = match lookup("STORAGE_BACKEND").as_deref().unwrap_or("spanner") {
            "spanner" => StorageBackend::Spanner(SpannerConfig {
                emulator_host: lookup("SPANNER_EMULATOR_HOST"),
                project: lookup("SPANNER_PROJECT")
                    .context("SPANNER_PROJECT environment variable is required")?,
                instance: lookup("SPANNER_INSTANCE")
                    .context("SPANNER_INSTANCE environment variable is required")?,
                database: lookup("SPANNER_DATABASE")
                    .context("SPANNER_DATABASE environment variable is required")?,
            }),
            "memory" => StorageBackend::Memory,
            other => bail!("STORAGE_BACKEND must be 'spanner' or 'memory', got '{}'", other),
        };

        let service_port = lookup("SERVICE_PORT")
            .unwrap_or_else(|| "3000".to_string())
            .parse::<u16>()
            .context("SERVICE_PORT must be a valid port number (0-65535)")?;

        let service_host = lookup("SERVICE_HOST")
            .unwrap_or_else(|| "0.0.0.0".to_string());

        let store_timeout_ms = lookup("STORE_TIMEOUT_MS")
            .unwrap_or_else(|| "5000".to_string())
            .parse::<u64>()
            .context("STORE_TIMEOUT_MS must be a whole number of milliseconds")?;
        if store_timeout_ms == 0 {
            bail!("STORE_TIMEOUT_MS must be greater than zero");
        }

        Ok(Config {
            backend,
            service_port,
            service_host,
            store_timeout: Duration::from_millis(store_timeout_ms),
        })
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.service_host, self.service_port)
    }

    pub fn log_startup(&self) {
        tracing::info!("Configuration loaded:");
        match &self.backend {
            StorageBackend::Spanner(spanner) => {
                tracing::info!("  Storage backend: spanner");
                tracing::info!("  Spanner emulator: {}",
                    spanner.emulator_host.as_deref().unwrap_or("disabled (using production)"));
                tracing::info!("  Spanner database: {}", spanner.database_path());
            }
            StorageBackend::Memory => {
                tracing::info!("  Storage backend: memory (entries are lost on exit)");
            }
        }
        tracing::info!("  Store timeout: {:?}", self.store_timeout);
        tracing::info!("  Service listening on: {}", self.listen_addr());
    }
}
