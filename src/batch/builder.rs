//! # Batch Builder
//!
//! Command-side entry point: turns finalized batch elements and an operation
//! spec into a batch entity and its scheduled jobs.
//!
//! The builder writes the single submission-time operation-log entry for the
//! whole bulk request. Per-item logging is deliberately suppressed later,
//! during automated job execution, by the handlers' privileged scope.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::batch::configuration::{BatchConfiguration, OperationKind, OperationSpec};
use crate::batch::element::BatchElements;
use crate::batch::job_partitioner::BatchJobPartitioner;
use crate::error::{BatchCoreError, Result};
use crate::execution::ExecutionContext;
use crate::scheduler::ScheduledJob;

/// The batch entity: one administrative bulk request spanning many target
/// entities, executed as multiple jobs. Progress counters and completion are
/// maintained by the scheduler layer; this core only creates the entity and
/// its jobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Batch {
    pub batch_id: Uuid,
    pub kind: OperationKind,
    pub total_ids: usize,
    pub total_jobs: usize,
    pub created_at: DateTime<Utc>,
}

impl Batch {
    pub fn new(kind: OperationKind, total_ids: usize) -> Self {
        Self {
            batch_id: Uuid::new_v4(),
            kind,
            total_ids,
            total_jobs: 0,
            created_at: Utc::now(),
        }
    }
}

/// Callback writing the submission-time operation log entry.
pub type OperationLogHandler = Box<dyn Fn(&Batch) + Send + Sync>;

/// Builds a batch from finalized elements: validates the request, writes the
/// submission audit entry, partitions the configuration into jobs.
pub struct BatchBuilder {
    partitioner: BatchJobPartitioner,
    fail_if_target_missing: bool,
    operation_log: Option<OperationLogHandler>,
}

impl BatchBuilder {
    pub fn new(partitioner: BatchJobPartitioner) -> Self {
        Self {
            partitioner,
            fail_if_target_missing: true,
            operation_log: None,
        }
    }

    /// Select the lenient execution mode: targets already gone at execution
    /// time are skipped instead of failing the job.
    pub fn tolerate_missing_targets(mut self) -> Self {
        self.fail_if_target_missing = false;
        self
    }

    /// Install the submission-time operation log callback. Invoked once per
    /// batch, and only while the operation log is enabled on the context.
    pub fn operation_log_handler(mut self, handler: impl Fn(&Batch) + Send + Sync + 'static) -> Self {
        self.operation_log = Some(Box::new(handler));
        self
    }

    /// Create the batch and its jobs.
    ///
    /// Rejects an empty target set with [`BatchCoreError::InvalidRequest`];
    /// no batch entity is created and nothing is persisted in that case.
    #[instrument(skip(self, elements, operation, ctx), fields(kind = %operation.kind()))]
    pub async fn build(
        self,
        elements: BatchElements,
        operation: OperationSpec,
        ctx: &ExecutionContext,
    ) -> Result<(Batch, Vec<ScheduledJob>)> {
        if elements.is_empty() {
            return Err(BatchCoreError::InvalidRequest(
                "batch target id set is empty".to_string(),
            ));
        }

        let (ids, runs) = elements.into_parts();
        let configuration =
            BatchConfiguration::new(ids, Some(runs), self.fail_if_target_missing, operation);

        let mut batch = Batch::new(configuration.operation.kind(), configuration.ids.len());

        if let Some(log) = &self.operation_log {
            if ctx.audit.is_operation_log_enabled() {
                log(&batch);
            }
        }

        let jobs = self.partitioner.create_jobs(&batch, &configuration, ctx).await?;
        batch.total_jobs = jobs.len();

        info!(
            batch_id = %batch.batch_id,
            kind = %batch.kind,
            ids = batch.total_ids,
            jobs = batch.total_jobs,
            "batch created"
        );
        Ok((batch, jobs))
    }
}
