//! # Structured Error Handling
//!
//! Error taxonomy for the batch core. Each external seam (engine, store,
//! scheduler) carries its own error type; `BatchCoreError` is the unified
//! error surfaced to the job scheduler and to batch submitters.

use thiserror::Error;
use uuid::Uuid;

use crate::engine::EngineError;
use crate::scheduler::SchedulerError;
use crate::store::StoreError;

/// Unified error type for batch creation and batch job execution.
#[derive(Error, Debug)]
pub enum BatchCoreError {
    /// Rejected synchronously at batch-creation time; no batch is created.
    #[error("Invalid batch request: {0}")]
    InvalidRequest(String),

    /// The job's configuration blob is gone. Signals double execution of a
    /// completed job and must not be silently ignored.
    #[error("Job configuration blob {blob_id} not found")]
    ConfigurationNotFound { blob_id: Uuid },

    /// The persisted configuration does not deserialize into the expected
    /// shape, or violates a structural invariant. Indicates a stored-state
    /// bug, not a transient condition.
    #[error("Job configuration is corrupt: {reason}")]
    ConfigurationCorrupt { reason: String },

    /// The external engine operation failed; the configuration blob is left
    /// intact so a scheduler retry can reload it.
    #[error("Engine operation failed: {0}")]
    Operation(#[from] EngineError),

    /// Configuration blob persistence failed.
    #[error("Configuration store error: {0}")]
    Storage(#[from] StoreError),

    /// Registering a job with the scheduler failed.
    #[error("Scheduler error: {0}")]
    Scheduler(#[from] SchedulerError),

    /// Configuration file / environment loading failed.
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl BatchCoreError {
    /// True when the underlying engine reported a missing target instance.
    /// Only the strict deletion path surfaces this; the lenient path
    /// suppresses it at the engine boundary.
    pub fn is_target_missing(&self) -> bool {
        matches!(self, Self::Operation(EngineError::TargetMissing { .. }))
    }
}

pub type Result<T> = std::result::Result<T, BatchCoreError>;
