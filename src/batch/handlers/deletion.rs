//! Batch job handler for bulk process-instance deletion.

use async_trait::async_trait;
use tracing::{debug, instrument};

use super::{load_configuration, retire_configuration, unexpected_operation, BatchJobHandler};
use crate::batch::configuration::{OperationKind, OperationSpec};
use crate::error::Result;
use crate::execution::{ExecutionContext, PrivilegedScope};
use crate::scheduler::BatchJobConfiguration;

/// Deletes one job's slice of target instances.
///
/// Branches on `fail_if_target_missing`: the strict engine entry point
/// raises on any already-gone target, the lenient one skips missing targets
/// silently. The lenient branch is what makes scheduler retries safe after a
/// crash between the engine call and blob retirement.
#[derive(Debug, Default)]
pub struct DeletionJobHandler;

#[async_trait]
impl BatchJobHandler for DeletionJobHandler {
    fn kind(&self) -> OperationKind {
        OperationKind::InstanceDeletion
    }

    #[instrument(skip(self, ctx), fields(blob_id = %job.configuration_blob_id))]
    async fn execute(&self, job: &BatchJobConfiguration, ctx: &ExecutionContext) -> Result<()> {
        let (blob_id, configuration) = load_configuration(job, ctx).await?;

        let (delete_reason, skip_custom_listeners, skip_subprocesses) =
            match &configuration.operation {
                OperationSpec::Deletion {
                    delete_reason,
                    skip_custom_listeners,
                    skip_subprocesses,
                } => (
                    delete_reason.as_deref(),
                    *skip_custom_listeners,
                    *skip_subprocesses,
                ),
                other => return Err(unexpected_operation(self.kind(), other.kind())),
            };

        {
            let _scope = PrivilegedScope::enter(&ctx.audit);
            if configuration.fail_if_target_missing {
                ctx.engine
                    .delete_instances(
                        &configuration.ids,
                        delete_reason,
                        skip_custom_listeners,
                        skip_subprocesses,
                    )
                    .await?;
            } else {
                ctx.engine
                    .delete_instances_if_exists(
                        &configuration.ids,
                        delete_reason,
                        skip_custom_listeners,
                        skip_subprocesses,
                    )
                    .await?;
            }
        }

        debug!(ids = configuration.ids.len(), "deleted batch job targets");
        retire_configuration(blob_id, ctx).await
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{context_with, EngineCall, MockEngine, StubDeploymentResolver};
    use super::*;
    use crate::batch::configuration::{BatchConfiguration, OwnershipRun};
    use crate::error::BatchCoreError;
    use crate::execution::AuditFlags;
    use crate::scheduler::InMemoryJobScheduler;
    use crate::store::{ConfigurationStore, InMemoryConfigurationStore};
    use std::sync::Arc;

    fn deletion_configuration(fail_if_target_missing: bool) -> BatchConfiguration {
        BatchConfiguration::new(
            vec!["p1".to_string(), "p2".to_string()],
            Some(vec![OwnershipRun::new(Some("depA".to_string()), 2)]),
            fail_if_target_missing,
            OperationSpec::Deletion {
                delete_reason: Some("gdpr".to_string()),
                skip_custom_listeners: true,
                skip_subprocesses: false,
            },
        )
    }

    struct Harness {
        engine: Arc<MockEngine>,
        store: Arc<InMemoryConfigurationStore>,
        ctx: ExecutionContext,
    }

    fn harness() -> Harness {
        let engine = Arc::new(MockEngine::new());
        let store = Arc::new(InMemoryConfigurationStore::new());
        let ctx = context_with(
            engine.clone(),
            store.clone(),
            Arc::new(InMemoryJobScheduler::new()),
            Arc::new(StubDeploymentResolver::unresolved()),
        );
        Harness { engine, store, ctx }
    }

    async fn persist(
        store: &InMemoryConfigurationStore,
        configuration: &BatchConfiguration,
    ) -> BatchJobConfiguration {
        let blob_id = store
            .insert(configuration.to_bytes().unwrap())
            .await
            .unwrap();
        BatchJobConfiguration::new(blob_id)
    }

    #[tokio::test]
    async fn strict_deletion_calls_strict_entry_point_and_retires_blob() {
        let h = harness();
        let job = persist(&h.store, &deletion_configuration(true)).await;

        DeletionJobHandler.execute(&job, &h.ctx).await.unwrap();

        assert_eq!(
            h.engine.calls(),
            vec![EngineCall::Delete {
                ids: vec!["p1".to_string(), "p2".to_string()],
                delete_reason: Some("gdpr".to_string()),
                skip_custom_listeners: true,
                skip_subprocesses: false,
                strict: true,
            }]
        );
        assert!(h.store.is_empty(), "blob retired on success");
    }

    #[tokio::test]
    async fn lenient_deletion_tolerates_missing_targets() {
        let h = harness();
        h.engine.mark_missing("p2");
        let job = persist(&h.store, &deletion_configuration(false)).await;

        DeletionJobHandler.execute(&job, &h.ctx).await.unwrap();

        assert!(matches!(
            h.engine.calls().as_slice(),
            [EngineCall::Delete { strict: false, .. }]
        ));
        assert!(h.store.is_empty(), "job completed, blob deleted");
    }

    #[tokio::test]
    async fn strict_deletion_propagates_missing_targets() {
        let h = harness();
        h.engine.mark_missing("p2");
        let job = persist(&h.store, &deletion_configuration(true)).await;

        let result = DeletionJobHandler.execute(&job, &h.ctx).await;

        assert!(result.unwrap_err().is_target_missing());
        assert_eq!(h.store.len(), 1, "blob retained for retry");
    }

    #[tokio::test]
    async fn reexecuting_a_completed_job_reports_not_found() {
        let h = harness();
        let job = persist(&h.store, &deletion_configuration(true)).await;

        DeletionJobHandler.execute(&job, &h.ctx).await.unwrap();
        let second = DeletionJobHandler.execute(&job, &h.ctx).await;

        assert!(matches!(
            second,
            Err(BatchCoreError::ConfigurationNotFound { .. })
        ));
        assert_eq!(h.engine.calls().len(), 1, "operation never re-executed");
    }

    #[tokio::test]
    async fn engine_failure_retains_blob_and_restores_audit_flags() {
        let h = harness();
        h.engine.fail_next_operation("engine down");
        let job = persist(&h.store, &deletion_configuration(true)).await;

        let before = h.ctx.audit.snapshot();
        let result = DeletionJobHandler.execute(&job, &h.ctx).await;

        assert!(matches!(result, Err(BatchCoreError::Operation(_))));
        assert_eq!(h.store.len(), 1, "blob retained for retry");
        assert_eq!(h.ctx.audit.snapshot(), before);
    }

    #[tokio::test]
    async fn audit_flags_restored_to_nondefault_prior_values() {
        let h = harness();
        h.engine.fail_next_operation("engine down");
        let flags = AuditFlags {
            operation_log_enabled: false,
            restrict_log_to_authenticated: false,
        };
        h.ctx.audit.restore(flags);
        let job = persist(&h.store, &deletion_configuration(true)).await;

        let _ = DeletionJobHandler.execute(&job, &h.ctx).await;

        assert_eq!(h.ctx.audit.snapshot(), flags);
    }

    #[tokio::test]
    async fn wrong_operation_kind_is_corruption() {
        let h = harness();
        let configuration = BatchConfiguration::new(
            vec!["p1".to_string()],
            None,
            true,
            OperationSpec::Restart {
                process_definition_id: "def:1".to_string(),
                instructions: vec![],
                initial_variables: false,
                skip_custom_listeners: false,
                skip_io_mappings: false,
                without_business_key: false,
            },
        );
        let job = persist(&h.store, &configuration).await;

        let result = DeletionJobHandler.execute(&job, &h.ctx).await;
        assert!(matches!(
            result,
            Err(BatchCoreError::ConfigurationCorrupt { .. })
        ));
        assert!(h.engine.calls().is_empty());
    }
}
