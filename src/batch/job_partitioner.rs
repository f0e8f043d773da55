//! # Batch Job Partitioner
//!
//! Splits a batch configuration that is too large for one job into a
//! sequence of smaller configurations, respecting the configured maximum
//! ids per job while preserving the ownership-run structure downstream
//! deployment-scoped resource resolution relies on.
//!
//! Job creation order is deterministic: job N always receives an earlier
//! contiguous slice of the sorted id sequence than job N+1.

use std::collections::VecDeque;

use tracing::{debug, info, instrument};

use crate::batch::builder::Batch;
use crate::batch::configuration::{BatchConfiguration, OperationSpec, OwnershipRun};
use crate::config::BatchCoreConfig;
use crate::engine::DeploymentResolver;
use crate::error::{BatchCoreError, Result};
use crate::execution::ExecutionContext;
use crate::scheduler::{JobScheduler, ScheduledJob};
use crate::store::ConfigurationStore;

/// Chunks a batch configuration into per-job slices, persists each slice,
/// and registers one job per slice with the scheduler.
#[derive(Debug, Clone, Copy)]
pub struct BatchJobPartitioner {
    max_ids_per_job: usize,
}

impl BatchJobPartitioner {
    pub fn new(max_ids_per_job: usize) -> Self {
        Self {
            // A chunk size of zero would never make progress.
            max_ids_per_job: max_ids_per_job.max(1),
        }
    }

    pub fn from_config(config: &BatchCoreConfig) -> Self {
        Self::new(config.max_ids_per_job)
    }

    pub fn max_ids_per_job(&self) -> usize {
        self.max_ids_per_job
    }

    /// Create, persist, and register the jobs for `configuration`.
    ///
    /// Consumes ownership runs from the front to cover each chunk exactly;
    /// a run larger than the remaining chunk capacity is split, with the
    /// remainder left for the next job. Runs never silently span a job
    /// boundary with an invalid count.
    #[instrument(skip(self, configuration, ctx), fields(batch_id = %batch.batch_id))]
    pub async fn create_jobs(
        &self,
        batch: &Batch,
        configuration: &BatchConfiguration,
        ctx: &ExecutionContext,
    ) -> Result<Vec<ScheduledJob>> {
        if configuration.ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut runs: VecDeque<OwnershipRun> = self.seed_runs(configuration, ctx).await?.into();
        let mut jobs = Vec::with_capacity(configuration.ids.len().div_ceil(self.max_ids_per_job));
        let mut offset = 0;

        while offset < configuration.ids.len() {
            let take = (configuration.ids.len() - offset).min(self.max_ids_per_job);
            let job_ids = configuration.ids[offset..offset + take].to_vec();

            let mut job_runs = Vec::new();
            let mut capacity = take;
            while capacity > 0 {
                let mut run = runs.pop_front().ok_or_else(|| {
                    BatchCoreError::ConfigurationCorrupt {
                        reason: "ownership runs exhausted before the id sequence".to_string(),
                    }
                })?;
                if run.count() <= capacity {
                    capacity -= run.count();
                    job_runs.push(run);
                } else {
                    job_runs.push(run.with_count(capacity));
                    run.consume(capacity);
                    runs.push_front(run);
                    capacity = 0;
                }
            }

            let slice = configuration.slice(job_ids, job_runs);
            let bytes = slice
                .to_bytes()
                .map_err(|err| BatchCoreError::ConfigurationCorrupt {
                    reason: format!("failed to serialize job configuration: {err}"),
                })?;
            let blob_id = ctx.store.insert(bytes).await?;

            let job = ScheduledJob::new(batch.batch_id, batch.kind, blob_id);
            debug!(job_id = %job.job_id, %blob_id, ids = take, "registered batch job");
            ctx.scheduler.enqueue(job.clone()).await?;
            jobs.push(job);

            offset += take;
        }

        info!(
            jobs = jobs.len(),
            ids = configuration.ids.len(),
            kind = %batch.kind,
            "partitioned batch into jobs"
        );
        Ok(jobs)
    }

    /// Normalize the run sequence before partitioning. Partitioning never
    /// operates on an absent run sequence: a legacy configuration without
    /// deployment partitioning gets a single synthetic run covering all ids.
    /// For migrations that run is keyed by the deployment of the plan's
    /// source process definition, resolved through the deployment cache.
    async fn seed_runs(
        &self,
        configuration: &BatchConfiguration,
        ctx: &ExecutionContext,
    ) -> Result<Vec<OwnershipRun>> {
        if let Some(runs) = &configuration.ownership_runs {
            if !runs.is_empty() {
                configuration
                    .validate()
                    .map_err(|reason| BatchCoreError::ConfigurationCorrupt { reason })?;
                return Ok(runs.clone());
            }
        }

        let owner = match &configuration.operation {
            OperationSpec::Migration { plan, .. } => {
                ctx.deployments
                    .deployment_for_definition(&plan.source_process_definition_id)
                    .await?
            }
            _ => None,
        };
        debug!(?owner, ids = configuration.ids.len(), "seeded synthetic ownership run");
        Ok(vec![OwnershipRun::new(owner, configuration.ids.len())])
    }
}
