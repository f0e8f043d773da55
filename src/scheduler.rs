//! # Job Scheduler Interface
//!
//! The batch core does not run jobs itself. It registers jobs with an
//! external scheduler and is called back (through a
//! [`crate::batch::handlers::BatchJobHandler`]) when the scheduler dispatches
//! them. Retry and dead-letter policy on handler failure belong to the
//! scheduler, not to this crate.
//!
//! Job execution order across the jobs of one batch is not guaranteed; the
//! scheduler may run them concurrently or out of order. Creation order,
//! however, is deterministic: job N always covers an earlier contiguous slice
//! of the batch's id sequence than job N+1.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

use crate::batch::configuration::OperationKind;
use crate::store::BlobId;

/// Reference a dispatched job carries to its persisted configuration slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchJobConfiguration {
    pub configuration_blob_id: BlobId,
}

impl BatchJobConfiguration {
    pub fn new(configuration_blob_id: BlobId) -> Self {
        Self {
            configuration_blob_id,
        }
    }
}

/// One schedulable unit of batch work.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduledJob {
    pub job_id: Uuid,
    pub batch_id: Uuid,
    pub job_type: OperationKind,
    pub configuration: BatchJobConfiguration,
    pub created_at: DateTime<Utc>,
}

impl ScheduledJob {
    pub fn new(batch_id: Uuid, job_type: OperationKind, configuration_blob_id: BlobId) -> Self {
        Self {
            job_id: Uuid::new_v4(),
            batch_id,
            job_type,
            configuration: BatchJobConfiguration::new(configuration_blob_id),
            created_at: Utc::now(),
        }
    }
}

/// Lifecycle of a batch job as observed by the scheduler layer.
///
/// There is no partial/half-applied state: the underlying engine operation
/// is expected to be atomic or to report a clear failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    /// Job registered, configuration blob persisted.
    Pending,
    /// Handler invoked.
    Executing,
    /// Operation succeeded, configuration blob deleted.
    Completed,
    /// Operation raised; blob retained for the scheduler's retry policy.
    Failed,
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed)
    }

    pub fn can_transition_to(&self, next: JobState) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Executing)
                | (Self::Executing, Self::Completed)
                | (Self::Executing, Self::Failed)
                | (Self::Failed, Self::Executing)
        )
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Executing => write!(f, "executing"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

impl std::str::FromStr for JobState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "executing" => Ok(Self::Executing),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            _ => Err(format!("Invalid job state: {s}")),
        }
    }
}

/// Errors raised while registering a job.
#[derive(Error, Debug)]
pub enum SchedulerError {
    #[error("failed to enqueue job: {message}")]
    Enqueue { message: String },
}

/// Consumed scheduler seam: register one job for later dispatch.
#[async_trait]
pub trait JobScheduler: Send + Sync {
    async fn enqueue(&self, job: ScheduledJob) -> Result<(), SchedulerError>;
}

/// Scheduler stub that records enqueued jobs in order.
///
/// Useful for tests and for single-process embeddings that drain and
/// dispatch jobs themselves.
#[derive(Debug, Default)]
pub struct InMemoryJobScheduler {
    jobs: Mutex<Vec<ScheduledJob>>,
}

impl InMemoryJobScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.jobs.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.lock().is_empty()
    }

    /// Remove and return all enqueued jobs in enqueue order.
    pub fn drain(&self) -> Vec<ScheduledJob> {
        std::mem::take(&mut *self.jobs.lock())
    }
}

#[async_trait]
impl JobScheduler for InMemoryJobScheduler {
    async fn enqueue(&self, job: ScheduledJob) -> Result<(), SchedulerError> {
        self.jobs.lock().push(job);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn job_state_transitions() {
        assert!(JobState::Pending.can_transition_to(JobState::Executing));
        assert!(JobState::Executing.can_transition_to(JobState::Completed));
        assert!(JobState::Executing.can_transition_to(JobState::Failed));
        assert!(JobState::Failed.can_transition_to(JobState::Executing));

        assert!(!JobState::Pending.can_transition_to(JobState::Completed));
        assert!(!JobState::Completed.can_transition_to(JobState::Executing));
    }

    #[test]
    fn job_state_round_trips_through_strings() {
        for state in [
            JobState::Pending,
            JobState::Executing,
            JobState::Completed,
            JobState::Failed,
        ] {
            assert_eq!(JobState::from_str(&state.to_string()), Ok(state));
        }
        assert!(JobState::from_str("paused").is_err());
    }

    #[tokio::test]
    async fn in_memory_scheduler_preserves_enqueue_order() {
        let scheduler = InMemoryJobScheduler::new();
        let batch_id = Uuid::new_v4();

        for _ in 0..3 {
            scheduler
                .enqueue(ScheduledJob::new(
                    batch_id,
                    OperationKind::InstanceDeletion,
                    Uuid::new_v4(),
                ))
                .await
                .unwrap();
        }

        let drained = scheduler.drain();
        assert_eq!(drained.len(), 3);
        assert!(scheduler.is_empty());
        assert!(drained.iter().all(|job| job.batch_id == batch_id));
    }
}
