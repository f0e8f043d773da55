//! # Configuration
//!
//! Crate-level tunables, loadable from an optional `batch-core` config file
//! plus `BATCH_CORE_*` environment overrides. Every field has a default so an
//! embedding can also construct the struct directly.

use serde::{Deserialize, Serialize};

use crate::error::{BatchCoreError, Result};

/// Tunables of the batch core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchCoreConfig {
    /// Maximum number of target ids a single job receives. Batches with more
    /// ids are split into multiple jobs.
    pub max_ids_per_job: usize,
    /// Initial value of the user operation log switch.
    pub operation_log_enabled: bool,
    /// Initial value of the legacy "restrict operation log to authenticated
    /// identity" flag.
    pub restrict_log_to_authenticated: bool,
}

impl Default for BatchCoreConfig {
    fn default() -> Self {
        Self {
            max_ids_per_job: 100,
            operation_log_enabled: true,
            restrict_log_to_authenticated: false,
        }
    }
}

impl BatchCoreConfig {
    /// Load from `config/batch-core.{toml,yaml,json}` (if present) and
    /// `BATCH_CORE_*` environment variables.
    pub fn load() -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name("config/batch-core").required(false))
            .add_source(config::Environment::with_prefix("BATCH_CORE").try_parsing(true))
            .build()
            .map_err(|err| BatchCoreError::Configuration(err.to_string()))?;

        settings
            .try_deserialize()
            .map_err(|err| BatchCoreError::Configuration(err.to_string()))
    }
}
