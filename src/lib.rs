#![allow(clippy::doc_markdown)] // Allow technical terms like PostgreSQL, SQLx in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Batch Core
//!
//! Rust core of a process-orchestration engine's batch subsystem: the
//! machinery that turns one administrative bulk request — "delete these
//! 50,000 process instances", "migrate these instances to a new definition
//! version", "restart these instances" — into a durable, partitioned,
//! resumable unit of work executed piecewise by a job scheduler instead of
//! as one giant synchronous transaction.
//!
//! ## Architecture
//!
//! ```text
//! command input ──▶ BatchElementConfiguration ──▶ BatchConfiguration
//!                        (collect + sort)            (persisted model)
//!                                                         │
//!                                                 BatchJobPartitioner
//!                                                         │ one blob per job
//!                                                         ▼
//!                        job scheduler ──dispatch──▶ BatchJobHandler
//!                                                         │ privileged scope
//!                                                         ▼
//!                                                  engine operation,
//!                                                  then blob retirement
//! ```
//!
//! Target ids are sorted by `(owner deployment, id)` and run-length-encoded
//! into *ownership runs*, so each job covers deployment-homogeneous slices
//! and downstream deployment-scoped resources resolve once per job, not once
//! per id. Each job owns exactly one persisted configuration blob; deleting
//! that blob on success is the commit point and the single authoritative
//! "this job is done" signal.
//!
//! ## Module Organization
//!
//! - [`batch`] - partitioning, configuration model, job creation, handlers
//! - [`engine`] - consumed interface of the external workflow engine
//! - [`scheduler`] - consumed job scheduler interface and job lifecycle
//! - [`store`] - configuration blob persistence (in-memory, Postgres)
//! - [`execution`] - execution context, audit controls, privileged scope
//! - [`config`] - crate configuration
//! - [`error`] - structured error handling
//! - [`logging`] - tracing bootstrap
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use batch_core::{
//!     BatchBuilder, BatchElementConfiguration, BatchJobPartitioner, ExecutionContext,
//!     OperationSpec, OwnerIdPair,
//! };
//!
//! # async fn example(ctx: ExecutionContext) -> batch_core::Result<()> {
//! let mut elements = BatchElementConfiguration::new();
//! elements.add_mappings(vec![
//!     OwnerIdPair::owned("deployment-1", "instance-a"),
//!     OwnerIdPair::owned("deployment-1", "instance-b"),
//! ]);
//!
//! let operation = OperationSpec::Deletion {
//!     delete_reason: Some("retention expired".to_string()),
//!     skip_custom_listeners: false,
//!     skip_subprocesses: false,
//! };
//!
//! let (batch, jobs) = BatchBuilder::new(BatchJobPartitioner::new(100))
//!     .build(elements.finalize(), operation, &ctx)
//!     .await?;
//! println!("batch {} split into {} jobs", batch.batch_id, jobs.len());
//! # Ok(())
//! # }
//! ```

pub mod batch;
pub mod config;
pub mod engine;
pub mod error;
pub mod execution;
pub mod logging;
pub mod scheduler;
pub mod store;

pub use batch::{
    partition, Batch, BatchBuilder, BatchConfiguration, BatchElementConfiguration, BatchElements,
    BatchJobHandler, BatchJobHandlerRegistry, BatchJobPartitioner, DeletionJobHandler,
    MigrationInstruction, MigrationJobHandler, MigrationPlan, OperationKind, OperationSpec,
    OwnerIdPair, OwnershipRun, RestartInstruction, RestartJobHandler, RestartPosition,
    NULL_OWNER_TOKEN,
};
pub use config::BatchCoreConfig;
pub use engine::{DeploymentResolver, EngineError, EngineOperations, RestartOptions};
pub use error::{BatchCoreError, Result};
pub use execution::{AuditControls, AuditFlags, ExecutionContext, PrivilegedScope};
pub use scheduler::{
    BatchJobConfiguration, InMemoryJobScheduler, JobScheduler, JobState, ScheduledJob,
    SchedulerError,
};
pub use store::{BlobId, ConfigurationStore, InMemoryConfigurationStore, StoreError};
