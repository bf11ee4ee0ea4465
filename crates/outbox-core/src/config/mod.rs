//! Layered configuration: defaults → TOML file → `OUTBOX_*` environment.

pub mod defaults;
pub mod observability_config;
pub mod storage_config;
pub mod sync_config;
pub mod transport_config;
pub mod worker_config;

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

pub use observability_config::ObservabilityConfig;
pub use storage_config::StorageConfig;
pub use sync_config::{OrderingMode, SyncConfig};
pub use transport_config::TransportConfig;
pub use worker_config::WorkerConfig;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutboxConfig {
    pub storage: StorageConfig,
    pub transport: TransportConfig,
    pub sync: SyncConfig,
    pub worker: WorkerConfig,
    pub observability: ObservabilityConfig,
}

impl OutboxConfig {
    /// Load configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml_str).map_err(|e| ConfigError::ParseError {
            path: "<string>".to_string(),
            message: e.to_string(),
        })
    }

    /// Load a TOML file, apply environment overrides, and validate.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
            path: path.display().to_string(),
        })?;
        let mut config: OutboxConfig =
            toml::from_str(&content).map_err(|e| ConfigError::ParseError {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sync.max_attempts == 0 {
            return Err(ConfigError::ValidationFailed {
                field: "sync.max_attempts".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }
        if self.sync.max_rejections == 0 {
            return Err(ConfigError::ValidationFailed {
                field: "sync.max_rejections".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }
        if self.sync.initial_retry_delay_ms > self.sync.max_retry_delay_ms {
            return Err(ConfigError::ValidationFailed {
                field: "sync.initial_retry_delay_ms".to_string(),
                message: "must not exceed sync.max_retry_delay_ms".to_string(),
            });
        }
        if self.transport.timeout_secs == 0 {
            return Err(ConfigError::ValidationFailed {
                field: "transport.timeout_secs".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }
        if self.worker.static_generation.is_empty() || self.worker.api_generation.is_empty() {
            return Err(ConfigError::ValidationFailed {
                field: "worker.static_generation".to_string(),
                message: "generation tags must not be empty".to_string(),
            });
        }
        if self.worker.static_cache_name() == self.worker.api_cache_name() {
            return Err(ConfigError::ValidationFailed {
                field: "worker.api_cache_prefix".to_string(),
                message: "static and API caches must use distinct namespaces".to_string(),
            });
        }
        if !self.worker.api_prefix.starts_with('/') {
            return Err(ConfigError::ValidationFailed {
                field: "worker.api_prefix".to_string(),
                message: "must start with '/'".to_string(),
            });
        }
        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("OUTBOX_DB_PATH") {
            self.storage.db_path = val;
        }
        if let Ok(val) = std::env::var("OUTBOX_REQUEST_TIMEOUT_SECS") {
            if let Ok(v) = val.parse::<u64>() {
                self.transport.timeout_secs = v;
            }
        }
        if let Ok(val) = std::env::var("OUTBOX_SYNC_MAX_ATTEMPTS") {
            if let Ok(v) = val.parse::<u32>() {
                self.sync.max_attempts = v;
            }
        }
        if let Ok(val) = std::env::var("OUTBOX_STATIC_GENERATION") {
            self.worker.static_generation = val;
        }
        if let Ok(val) = std::env::var("OUTBOX_API_GENERATION") {
            self.worker.api_generation = val;
        }
        if let Ok(val) = std::env::var("OUTBOX_ORIGIN") {
            self.worker.origin = val;
        }
        if let Ok(val) = std::env::var("OUTBOX_LOG_LEVEL") {
            self.observability.log_level = val;
        }
    }
}
