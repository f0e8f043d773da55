//! # Execution Environment
//!
//! The execution context handed to batch job handlers, plus the privileged
//! scope discipline for audit/operation-log suppression.

pub mod context;

pub use context::{AuditControls, AuditFlags, ExecutionContext, PrivilegedScope};
