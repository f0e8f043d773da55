//! Batch job handler for bulk process-instance migration.

use async_trait::async_trait;
use tracing::{debug, instrument};

use super::{load_configuration, retire_configuration, unexpected_operation, BatchJobHandler};
use crate::batch::configuration::{OperationKind, OperationSpec};
use crate::error::Result;
use crate::execution::{ExecutionContext, PrivilegedScope};
use crate::scheduler::BatchJobConfiguration;

/// Migrates one job's slice of instances according to the persisted
/// migration plan.
#[derive(Debug, Default)]
pub struct MigrationJobHandler;

#[async_trait]
impl BatchJobHandler for MigrationJobHandler {
    fn kind(&self) -> OperationKind {
        OperationKind::InstanceMigration
    }

    #[instrument(skip(self, ctx), fields(blob_id = %job.configuration_blob_id))]
    async fn execute(&self, job: &BatchJobConfiguration, ctx: &ExecutionContext) -> Result<()> {
        let (blob_id, configuration) = load_configuration(job, ctx).await?;

        let (plan, skip_custom_listeners, skip_io_mappings) = match &configuration.operation {
            OperationSpec::Migration {
                plan,
                skip_custom_listeners,
                skip_io_mappings,
            } => (plan, *skip_custom_listeners, *skip_io_mappings),
            other => return Err(unexpected_operation(self.kind(), other.kind())),
        };

        {
            let _scope = PrivilegedScope::enter(&ctx.audit);
            ctx.engine
                .migrate(
                    plan,
                    &configuration.ids,
                    skip_custom_listeners,
                    skip_io_mappings,
                )
                .await?;
        }

        debug!(
            ids = configuration.ids.len(),
            source = %plan.source_process_definition_id,
            target = %plan.target_process_definition_id,
            "migrated batch job targets"
        );
        retire_configuration(blob_id, ctx).await
    }
}
