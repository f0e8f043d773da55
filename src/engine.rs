//! # Engine Operation Interface
//!
//! Trait seams for the external workflow engine. The batch core never
//! implements instance deletion, migration, or restart itself; it drives
//! these operations through [`EngineOperations`].
//!
//! The methods on [`EngineOperations`] model the engine's *internal* entry
//! points: unlike the public API they write no user operation log of their
//! own. The bulk operation was already logged once at submission time, and
//! per-item logging during automated execution would be noise, so batch job
//! handlers always call these internal variants from inside a privileged
//! scope (see [`crate::execution::PrivilegedScope`]).

use async_trait::async_trait;
use thiserror::Error;

use crate::batch::configuration::{MigrationPlan, RestartInstruction};

/// Errors reported by the external engine.
#[derive(Error, Debug)]
pub enum EngineError {
    /// A target instance no longer resolves. Raised by the strict deletion
    /// entry point; the lenient entry point skips missing targets instead.
    #[error("target instance {id} does not exist")]
    TargetMissing { id: String },

    /// Catch-all engine failure; propagates to the scheduler's retry policy.
    #[error("engine operation failed: {message}")]
    OperationFailed { message: String },
}

/// Flags steered by a restart batch configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RestartOptions {
    /// Restart with the instance's initial set of variables.
    pub initial_variables: bool,
    /// Skip execution of custom listeners.
    pub skip_custom_listeners: bool,
    /// Skip input/output variable mappings.
    pub skip_io_mappings: bool,
    /// Do not carry the business key over to the restarted instance.
    pub without_business_key: bool,
}

/// Internal (non-logging) engine entry points consumed by batch job handlers.
///
/// Implementations must be safe to call concurrently for disjoint id sets;
/// the scheduler may run jobs of the same batch in parallel. Deletion must
/// tolerate "already gone" targets on the lenient path so that a retried job
/// can safely repeat work that partially completed before a crash.
#[async_trait]
pub trait EngineOperations: Send + Sync {
    /// Delete the given instances. Fails with [`EngineError::TargetMissing`]
    /// if any id no longer resolves.
    async fn delete_instances(
        &self,
        ids: &[String],
        delete_reason: Option<&str>,
        skip_custom_listeners: bool,
        skip_subprocesses: bool,
    ) -> Result<(), EngineError>;

    /// Delete the given instances, silently skipping ids that no longer
    /// resolve.
    async fn delete_instances_if_exists(
        &self,
        ids: &[String],
        delete_reason: Option<&str>,
        skip_custom_listeners: bool,
        skip_subprocesses: bool,
    ) -> Result<(), EngineError>;

    /// Migrate the given instances according to the migration plan.
    async fn migrate(
        &self,
        plan: &MigrationPlan,
        ids: &[String],
        skip_custom_listeners: bool,
        skip_io_mappings: bool,
    ) -> Result<(), EngineError>;

    /// Restart the given (historic) instances of a process definition from
    /// the supplied instructions.
    async fn restart(
        &self,
        process_definition_id: &str,
        ids: &[String],
        instructions: &[RestartInstruction],
        options: RestartOptions,
    ) -> Result<(), EngineError>;
}

/// Resolves the deployment that owns a process definition.
///
/// Backed by the engine's deployment cache; used only to seed a synthetic
/// ownership run for migration configurations created without deployment
/// partitioning (legacy creation path).
#[async_trait]
pub trait DeploymentResolver: Send + Sync {
    /// Returns the deployment id of the given definition, or `None` if the
    /// definition is unknown to the cache.
    async fn deployment_for_definition(
        &self,
        process_definition_id: &str,
    ) -> Result<Option<String>, EngineError>;
}
