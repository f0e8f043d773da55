//! # Batch Operation Core
//!
//! The pieces that turn one bulk request into durable, partitioned work:
//!
//! - [`partitioner`] run-length-encodes `(owner, id)` pairs into ownership
//!   runs,
//! - [`element`] accumulates pairs from multiple sources and finalizes them,
//! - [`configuration`] is the persisted batch/job configuration model,
//! - [`builder`] validates a request and creates the batch entity,
//! - [`job_partitioner`] cuts the configuration into per-job slices,
//! - [`handlers`] execute one job each and retire its configuration blob.

pub mod builder;
pub mod configuration;
pub mod element;
pub mod handlers;
pub mod job_partitioner;
pub mod partitioner;

pub use builder::{Batch, BatchBuilder};
pub use configuration::{
    BatchConfiguration, MigrationInstruction, MigrationPlan, OperationKind, OperationSpec,
    OwnershipRun, RestartInstruction, RestartPosition, NULL_OWNER_TOKEN,
};
pub use element::{BatchElementConfiguration, BatchElements};
pub use handlers::{
    BatchJobHandler, BatchJobHandlerRegistry, DeletionJobHandler, MigrationJobHandler,
    RestartJobHandler,
};
pub use job_partitioner::BatchJobPartitioner;
pub use partitioner::{partition, OwnerIdPair};
