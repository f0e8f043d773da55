//! Batch job handler for bulk process-instance restart.

use async_trait::async_trait;
use tracing::{debug, instrument};

use super::{load_configuration, retire_configuration, unexpected_operation, BatchJobHandler};
use crate::batch::configuration::{OperationKind, OperationSpec};
use crate::engine::RestartOptions;
use crate::error::Result;
use crate::execution::{ExecutionContext, PrivilegedScope};
use crate::scheduler::BatchJobConfiguration;

/// Restarts one job's slice of (historic) instances from the persisted
/// restart instructions.
#[derive(Debug, Default)]
pub struct RestartJobHandler;

#[async_trait]
impl BatchJobHandler for RestartJobHandler {
    fn kind(&self) -> OperationKind {
        OperationKind::InstanceRestart
    }

    #[instrument(skip(self, ctx), fields(blob_id = %job.configuration_blob_id))]
    async fn execute(&self, job: &BatchJobConfiguration, ctx: &ExecutionContext) -> Result<()> {
        let (blob_id, configuration) = load_configuration(job, ctx).await?;

        let (process_definition_id, instructions, options) = match &configuration.operation {
            OperationSpec::Restart {
                process_definition_id,
                instructions,
                initial_variables,
                skip_custom_listeners,
                skip_io_mappings,
                without_business_key,
            } => (
                process_definition_id,
                instructions,
                RestartOptions {
                    initial_variables: *initial_variables,
                    skip_custom_listeners: *skip_custom_listeners,
                    skip_io_mappings: *skip_io_mappings,
                    without_business_key: *without_business_key,
                },
            ),
            other => return Err(unexpected_operation(self.kind(), other.kind())),
        };

        {
            let _scope = PrivilegedScope::enter(&ctx.audit);
            ctx.engine
                .restart(
                    process_definition_id,
                    &configuration.ids,
                    instructions,
                    options,
                )
                .await?;
        }

        debug!(
            ids = configuration.ids.len(),
            definition = %process_definition_id,
            "restarted batch job targets"
        );
        retire_configuration(blob_id, ctx).await
    }
}
