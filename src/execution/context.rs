//! # Execution Context
//!
//! Carries the external collaborators a batch command or batch job handler
//! needs: the engine operations, the configuration blob store, the job
//! scheduler, the deployment resolver, and the audit controls.
//!
//! ## Audit controls
//!
//! The engine's operation-log switches are legacy ambient flags. Here they
//! are modeled as explicit state on the context ([`AuditControls`]), never as
//! process-wide mutable globals. Batch job handlers suppress per-item
//! operation logging for the duration of the engine call through
//! [`PrivilegedScope`], an RAII guard that restores the *exact* pre-entry
//! flag values on every exit path, including early returns on engine failure.
//! Scopes nest: each guard restores the snapshot it took on entry.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::config::BatchCoreConfig;
use crate::engine::{DeploymentResolver, EngineOperations};
use crate::scheduler::JobScheduler;
use crate::store::ConfigurationStore;

/// Snapshot of the operation-log switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuditFlags {
    /// Whether user operation log entries are written at all.
    pub operation_log_enabled: bool,
    /// Legacy flag: restrict operation log entries to authenticated
    /// identities.
    pub restrict_log_to_authenticated: bool,
}

impl Default for AuditFlags {
    fn default() -> Self {
        Self {
            operation_log_enabled: true,
            restrict_log_to_authenticated: false,
        }
    }
}

/// Mutable operation-log state scoped to one execution context.
#[derive(Debug, Default)]
pub struct AuditControls {
    flags: Mutex<AuditFlags>,
}

impl AuditControls {
    pub fn new(flags: AuditFlags) -> Self {
        Self {
            flags: Mutex::new(flags),
        }
    }

    pub fn is_operation_log_enabled(&self) -> bool {
        self.flags.lock().operation_log_enabled
    }

    pub fn disable_operation_log(&self) {
        self.flags.lock().operation_log_enabled = false;
    }

    pub fn enable_operation_log(&self) {
        self.flags.lock().operation_log_enabled = true;
    }

    pub fn restrict_log_to_authenticated(&self) -> bool {
        self.flags.lock().restrict_log_to_authenticated
    }

    pub fn set_restrict_log_to_authenticated(&self, restrict: bool) {
        self.flags.lock().restrict_log_to_authenticated = restrict;
    }

    /// Current flag values, for scope entry.
    pub fn snapshot(&self) -> AuditFlags {
        *self.flags.lock()
    }

    /// Overwrite both flags with a previously taken snapshot.
    pub fn restore(&self, flags: AuditFlags) {
        *self.flags.lock() = flags;
    }
}

/// RAII guard for privileged batch execution.
///
/// On entry: disables the user operation log and forces the legacy
/// "restrict to authenticated identity" flag to `true` regardless of its
/// ambient value. On drop: restores both flags to the values they held at
/// entry. Dropping is the only way out, so restoration covers success,
/// engine failure, and unexpected faults alike.
#[must_use = "the privileged scope is released when this guard is dropped"]
pub struct PrivilegedScope<'a> {
    audit: &'a AuditControls,
    prior: AuditFlags,
}

impl<'a> PrivilegedScope<'a> {
    pub fn enter(audit: &'a AuditControls) -> Self {
        let prior = audit.snapshot();
        audit.disable_operation_log();
        audit.set_restrict_log_to_authenticated(true);
        Self { audit, prior }
    }
}

impl Drop for PrivilegedScope<'_> {
    fn drop(&mut self) {
        self.audit.restore(self.prior);
    }
}

/// External collaborators for batch creation and batch job execution.
pub struct ExecutionContext {
    pub engine: Arc<dyn EngineOperations>,
    pub store: Arc<dyn ConfigurationStore>,
    pub scheduler: Arc<dyn JobScheduler>,
    pub deployments: Arc<dyn DeploymentResolver>,
    pub audit: AuditControls,
}

impl ExecutionContext {
    pub fn new(
        engine: Arc<dyn EngineOperations>,
        store: Arc<dyn ConfigurationStore>,
        scheduler: Arc<dyn JobScheduler>,
        deployments: Arc<dyn DeploymentResolver>,
    ) -> Self {
        Self {
            engine,
            store,
            scheduler,
            deployments,
            audit: AuditControls::default(),
        }
    }

    /// Seed the audit flags from configuration instead of the defaults.
    pub fn with_audit_flags(mut self, flags: AuditFlags) -> Self {
        self.audit = AuditControls::new(flags);
        self
    }

    /// Seed the audit flags from a loaded [`BatchCoreConfig`].
    pub fn with_config(self, config: &BatchCoreConfig) -> Self {
        self.with_audit_flags(AuditFlags {
            operation_log_enabled: config.operation_log_enabled,
            restrict_log_to_authenticated: config.restrict_log_to_authenticated,
        })
    }
}
