//! # Batch Job Handlers
//!
//! One handler per bulk operation. A handler is the executable unit the job
//! scheduler dispatches: it loads the job's persisted configuration slice,
//! performs the operation through the engine's internal entry point inside a
//! privileged scope, and retires its own configuration blob on success.
//!
//! Retiring the blob is the commit point. A crash before it leaves the blob
//! in place for a scheduler retry, which reloads the identical
//! configuration; a second dispatch after it fails with
//! `ConfigurationNotFound` instead of silently re-executing the operation.

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use tracing::warn;

use crate::batch::configuration::{BatchConfiguration, OperationKind};
use crate::error::{BatchCoreError, Result};
use crate::execution::ExecutionContext;
use crate::scheduler::{BatchJobConfiguration, ScheduledJob};
use crate::store::{BlobId, ConfigurationStore};

pub mod deletion;
pub mod migration;
pub mod restart;

pub use deletion::DeletionJobHandler;
pub use migration::MigrationJobHandler;
pub use restart::RestartJobHandler;

/// Executable contract of one batch job.
///
/// `execute` runs to completion on whatever worker the scheduler assigns and
/// must not assume reentrancy. Jobs of one batch may run concurrently or out
/// of order; the handler only ever touches the disjoint id set of its own
/// configuration slice.
#[async_trait]
pub trait BatchJobHandler: Send + Sync {
    /// Operation kind this handler is registered for.
    fn kind(&self) -> OperationKind;

    /// Load the configuration slice, perform the operation, retire the blob.
    async fn execute(&self, job: &BatchJobConfiguration, ctx: &ExecutionContext) -> Result<()>;
}

/// Load and deserialize a job's configuration slice.
///
/// A missing blob signals double execution of a completed job and surfaces
/// as [`BatchCoreError::ConfigurationNotFound`]; a schema or invariant
/// mismatch as [`BatchCoreError::ConfigurationCorrupt`].
pub(crate) async fn load_configuration(
    job: &BatchJobConfiguration,
    ctx: &ExecutionContext,
) -> Result<(BlobId, BatchConfiguration)> {
    let blob_id = job.configuration_blob_id;
    let bytes = ctx
        .store
        .load(blob_id)
        .await?
        .ok_or(BatchCoreError::ConfigurationNotFound { blob_id })?;

    let configuration = BatchConfiguration::from_bytes(&bytes)
        .map_err(|err| BatchCoreError::ConfigurationCorrupt {
            reason: err.to_string(),
        })?;
    configuration
        .validate()
        .map_err(|reason| BatchCoreError::ConfigurationCorrupt { reason })?;

    Ok((blob_id, configuration))
}

/// Retire a job's configuration blob after the operation succeeded.
pub(crate) async fn retire_configuration(blob_id: BlobId, ctx: &ExecutionContext) -> Result<()> {
    if !ctx.store.delete(blob_id).await? {
        // The load above saw the blob, so a concurrent delete means two
        // workers ran the same job.
        warn!(%blob_id, "job configuration blob vanished before retirement");
    }
    Ok(())
}

pub(crate) fn unexpected_operation(
    expected: OperationKind,
    found: OperationKind,
) -> BatchCoreError {
    BatchCoreError::ConfigurationCorrupt {
        reason: format!("expected an {expected} configuration, found {found}"),
    }
}

/// Registry mapping operation kinds to their handlers.
///
/// The scheduler layer registers each handler once at startup and dispatches
/// every job through [`BatchJobHandlerRegistry::dispatch`].
#[derive(Default)]
pub struct BatchJobHandlerRegistry {
    handlers: DashMap<OperationKind, Arc<dyn BatchJobHandler>>,
}

impl BatchJobHandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the three built-in operation handlers.
    pub fn with_builtin_handlers() -> Self {
        let registry = Self::new();
        registry.register(Arc::new(DeletionJobHandler));
        registry.register(Arc::new(MigrationJobHandler));
        registry.register(Arc::new(RestartJobHandler));
        registry
    }

    pub fn register(&self, handler: Arc<dyn BatchJobHandler>) {
        self.handlers.insert(handler.kind(), handler);
    }

    pub fn get(&self, kind: OperationKind) -> Option<Arc<dyn BatchJobHandler>> {
        self.handlers.get(&kind).map(|entry| entry.value().clone())
    }

    /// Route a dispatched job to its handler.
    pub async fn dispatch(&self, job: &ScheduledJob, ctx: &ExecutionContext) -> Result<()> {
        let handler = self.get(job.job_type).ok_or_else(|| {
            BatchCoreError::ConfigurationCorrupt {
                reason: format!("no handler registered for job type {}", job.job_type),
            }
        })?;
        handler.execute(&job.configuration, ctx).await
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    //! Shared fakes for handler and partitioner tests.

    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::HashSet;
    use std::sync::Arc;

    use crate::batch::configuration::{MigrationPlan, RestartInstruction};
    use crate::engine::{
        DeploymentResolver, EngineError, EngineOperations, RestartOptions,
    };
    use crate::execution::ExecutionContext;
    use crate::scheduler::{InMemoryJobScheduler, JobScheduler};
    use crate::store::{ConfigurationStore, InMemoryConfigurationStore};

    /// Record of one engine invocation.
    #[derive(Debug, Clone, PartialEq)]
    pub(crate) enum EngineCall {
        Delete {
            ids: Vec<String>,
            delete_reason: Option<String>,
            skip_custom_listeners: bool,
            skip_subprocesses: bool,
            strict: bool,
        },
        Migrate {
            source: String,
            target: String,
            ids: Vec<String>,
            skip_custom_listeners: bool,
            skip_io_mappings: bool,
        },
        Restart {
            process_definition_id: String,
            ids: Vec<String>,
            instruction_count: usize,
            options: RestartOptions,
        },
    }

    /// Engine fake that records calls, simulates externally deleted targets,
    /// and can be armed to fail once.
    #[derive(Default)]
    pub(crate) struct MockEngine {
        pub calls: Mutex<Vec<EngineCall>>,
        fail_next: Mutex<Option<String>>,
        missing: Mutex<HashSet<String>>,
    }

    impl MockEngine {
        pub fn new() -> Self {
            Self::default()
        }

        /// Arm the next operation to fail with `OperationFailed`.
        pub fn fail_next_operation(&self, message: impl Into<String>) {
            *self.fail_next.lock() = Some(message.into());
        }

        /// Mark a target id as already deleted externally.
        pub fn mark_missing(&self, id: impl Into<String>) {
            self.missing.lock().insert(id.into());
        }

        pub fn calls(&self) -> Vec<EngineCall> {
            self.calls.lock().clone()
        }

        fn take_failure(&self) -> Result<(), EngineError> {
            match self.fail_next.lock().take() {
                Some(message) => Err(EngineError::OperationFailed { message }),
                None => Ok(()),
            }
        }
    }

    #[async_trait]
    impl EngineOperations for MockEngine {
        async fn delete_instances(
            &self,
            ids: &[String],
            delete_reason: Option<&str>,
            skip_custom_listeners: bool,
            skip_subprocesses: bool,
        ) -> Result<(), EngineError> {
            self.calls.lock().push(EngineCall::Delete {
                ids: ids.to_vec(),
                delete_reason: delete_reason.map(str::to_string),
                skip_custom_listeners,
                skip_subprocesses,
                strict: true,
            });
            self.take_failure()?;
            if let Some(missing) = ids.iter().find(|id| self.missing.lock().contains(*id)) {
                return Err(EngineError::TargetMissing {
                    id: missing.clone(),
                });
            }
            Ok(())
        }

        async fn delete_instances_if_exists(
            &self,
            ids: &[String],
            delete_reason: Option<&str>,
            skip_custom_listeners: bool,
            skip_subprocesses: bool,
        ) -> Result<(), EngineError> {
            self.calls.lock().push(EngineCall::Delete {
                ids: ids.to_vec(),
                delete_reason: delete_reason.map(str::to_string),
                skip_custom_listeners,
                skip_subprocesses,
                strict: false,
            });
            self.take_failure()
        }

        async fn migrate(
            &self,
            plan: &MigrationPlan,
            ids: &[String],
            skip_custom_listeners: bool,
            skip_io_mappings: bool,
        ) -> Result<(), EngineError> {
            self.calls.lock().push(EngineCall::Migrate {
                source: plan.source_process_definition_id.clone(),
                target: plan.target_process_definition_id.clone(),
                ids: ids.to_vec(),
                skip_custom_listeners,
                skip_io_mappings,
            });
            self.take_failure()
        }

        async fn restart(
            &self,
            process_definition_id: &str,
            ids: &[String],
            instructions: &[RestartInstruction],
            options: RestartOptions,
        ) -> Result<(), EngineError> {
            self.calls.lock().push(EngineCall::Restart {
                process_definition_id: process_definition_id.to_string(),
                ids: ids.to_vec(),
                instruction_count: instructions.len(),
                options,
            });
            self.take_failure()
        }
    }

    /// Deployment cache fake returning a fixed answer.
    #[derive(Debug, Default)]
    pub(crate) struct StubDeploymentResolver {
        deployment: Option<String>,
    }

    impl StubDeploymentResolver {
        pub fn unresolved() -> Self {
            Self::default()
        }

        pub fn with_deployment(deployment: impl Into<String>) -> Self {
            Self {
                deployment: Some(deployment.into()),
            }
        }
    }

    #[async_trait]
    impl DeploymentResolver for StubDeploymentResolver {
        async fn deployment_for_definition(
            &self,
            _process_definition_id: &str,
        ) -> Result<Option<String>, EngineError> {
            Ok(self.deployment.clone())
        }
    }

    /// Context over fresh in-memory fakes.
    pub(crate) fn test_context() -> ExecutionContext {
        context_with(
            Arc::new(MockEngine::new()),
            Arc::new(InMemoryConfigurationStore::new()),
            Arc::new(InMemoryJobScheduler::new()),
            Arc::new(StubDeploymentResolver::unresolved()),
        )
    }

    pub(crate) fn context_with(
        engine: Arc<dyn EngineOperations>,
        store: Arc<dyn ConfigurationStore>,
        scheduler: Arc<dyn JobScheduler>,
        deployments: Arc<dyn DeploymentResolver>,
    ) -> ExecutionContext {
        ExecutionContext::new(engine, store, scheduler, deployments)
    }
}
