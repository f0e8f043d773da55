//! # Batch Configuration Model
//!
//! The persisted, serializable description of a batch: the full target id
//! sequence, the ownership-run index over it, the shared
//! `failIfTargetMissing` flag, and the operation-specific fields.
//!
//! ## Wire format
//!
//! A configuration serializes as a JSON object with `ids` (array of
//! strings), `ownershipRuns` (array of `ownerKey;count` strings, sentinel
//! [`NULL_OWNER_TOKEN`] for a missing owner), `failIfTargetMissing`
//! (boolean), an `operation` tag, and the tagged operation's own fields.
//! A run string with other than exactly two semicolon-delimited parts or a
//! non-positive/non-integer count fails deserialization; job handlers
//! surface that as a configuration-corruption error.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Sentinel encoding of a `None` owner key in the textual run format.
/// Distinct from any real deployment id.
pub const NULL_OWNER_TOKEN: &str = "$NULL";

/// A maximal contiguous stretch of the batch's sorted id sequence owned by
/// one deployment: "the next `count` ids all belong to `owner_key`".
///
/// Invariants: `count > 0`; across a run sequence, counts sum to the length
/// of the id sequence and adjacent runs never share an owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OwnershipRun {
    owner_key: Option<String>,
    count: usize,
}

impl OwnershipRun {
    pub fn new(owner_key: Option<String>, count: usize) -> Self {
        debug_assert!(count > 0, "ownership runs are never empty");
        Self { owner_key, count }
    }

    pub fn owner_key(&self) -> Option<&str> {
        self.owner_key.as_deref()
    }

    pub fn count(&self) -> usize {
        self.count
    }

    /// Shrink the run after `consumed` of its ids were cut into a job slice.
    pub(crate) fn consume(&mut self, consumed: usize) {
        debug_assert!(consumed < self.count, "a run must never shrink to zero");
        self.count -= consumed;
    }

    /// A run with the same owner covering `count` ids.
    pub(crate) fn with_count(&self, count: usize) -> Self {
        Self::new(self.owner_key.clone(), count)
    }
}

impl fmt::Display for OwnershipRun {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{};{}",
            self.owner_key.as_deref().unwrap_or(NULL_OWNER_TOKEN),
            self.count
        )
    }
}

impl FromStr for OwnershipRun {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(';').collect();
        if parts.len() != 2 {
            return Err(format!(
                "ownership run must consist of two parts separated by a semicolon, but was: {s}"
            ));
        }
        let count: usize = parts[1]
            .parse()
            .map_err(|_| format!("ownership run count is not an integer: {s}"))?;
        if count == 0 {
            return Err(format!("ownership run count must be positive: {s}"));
        }
        let owner_key = if parts[0] == NULL_OWNER_TOKEN {
            None
        } else {
            Some(parts[0].to_string())
        };
        Ok(Self { owner_key, count })
    }
}

impl From<OwnershipRun> for String {
    fn from(run: OwnershipRun) -> Self {
        run.to_string()
    }
}

impl TryFrom<String> for OwnershipRun {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// The kind of bulk operation a batch performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OperationKind {
    InstanceDeletion,
    InstanceMigration,
    InstanceRestart,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InstanceDeletion => "instance-deletion",
            Self::InstanceMigration => "instance-migration",
            Self::InstanceRestart => "instance-restart",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One activity-to-activity mapping of a migration plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationInstruction {
    pub source_activity_ids: Vec<String>,
    pub target_activity_ids: Vec<String>,
    #[serde(default)]
    pub update_event_trigger: bool,
}

/// Migration plan between two versions of a process definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationPlan {
    pub source_process_definition_id: String,
    pub target_process_definition_id: String,
    #[serde(default)]
    pub instructions: Vec<MigrationInstruction>,
}

/// Where a restarted instance resumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RestartPosition {
    StartBeforeActivity,
    StartAfterActivity,
    StartTransition,
}

/// One restart instruction: resume before/after an activity or at a
/// transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestartInstruction {
    pub position: RestartPosition,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activity_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transition_id: Option<String>,
}

/// Operation-specific configuration, tagged by operation kind.
///
/// Every field of a variant is required for execution; a persisted
/// configuration missing one of them fails deserialization and is treated as
/// corrupt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "operation")]
pub enum OperationSpec {
    #[serde(rename = "instance-deletion", rename_all = "camelCase")]
    Deletion {
        delete_reason: Option<String>,
        skip_custom_listeners: bool,
        skip_subprocesses: bool,
    },
    #[serde(rename = "instance-migration", rename_all = "camelCase")]
    Migration {
        plan: MigrationPlan,
        skip_custom_listeners: bool,
        skip_io_mappings: bool,
    },
    #[serde(rename = "instance-restart", rename_all = "camelCase")]
    Restart {
        process_definition_id: String,
        instructions: Vec<RestartInstruction>,
        initial_variables: bool,
        skip_custom_listeners: bool,
        skip_io_mappings: bool,
        without_business_key: bool,
    },
}

impl OperationSpec {
    pub fn kind(&self) -> OperationKind {
        match self {
            Self::Deletion { .. } => OperationKind::InstanceDeletion,
            Self::Migration { .. } => OperationKind::InstanceMigration,
            Self::Restart { .. } => OperationKind::InstanceRestart,
        }
    }
}

/// Persisted description of a batch or of one job's slice of a batch.
///
/// `ownership_runs` is a run-length index over `ids`, never an independent
/// list; [`BatchConfiguration::validate`] checks it against `ids.len()`.
/// It is optional in the persisted form because configurations created by
/// legacy paths carry no deployment partitioning; the job partitioner
/// normalizes such configurations before use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchConfiguration {
    pub ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ownership_runs: Option<Vec<OwnershipRun>>,
    pub fail_if_target_missing: bool,
    #[serde(flatten)]
    pub operation: OperationSpec,
}

impl BatchConfiguration {
    pub fn new(
        ids: Vec<String>,
        ownership_runs: Option<Vec<OwnershipRun>>,
        fail_if_target_missing: bool,
        operation: OperationSpec,
    ) -> Self {
        Self {
            ids,
            ownership_runs,
            fail_if_target_missing,
            operation,
        }
    }

    /// Check the run-length invariant: if runs are present, their counts must
    /// sum to the id count.
    pub fn validate(&self) -> Result<(), String> {
        if let Some(runs) = &self.ownership_runs {
            let covered: usize = runs.iter().map(OwnershipRun::count).sum();
            if covered != self.ids.len() {
                return Err(format!(
                    "ownership runs cover {covered} ids but the configuration holds {}",
                    self.ids.len()
                ));
            }
        }
        Ok(())
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    /// Build one job's slice: a contiguous sub-sequence of ids with the runs
    /// covering exactly that sub-sequence. Every operation-specific field and
    /// the `fail_if_target_missing` flag carry over unchanged.
    pub(crate) fn slice(&self, ids: Vec<String>, ownership_runs: Vec<OwnershipRun>) -> Self {
        Self {
            ids,
            ownership_runs: Some(ownership_runs),
            fail_if_target_missing: self.fail_if_target_missing,
            operation: self.operation.clone(),
        }
    }
}
