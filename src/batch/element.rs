//! # Batch Element Configuration
//!
//! Two-phase collection of a batch's target pairs. The accumulation phase
//! gathers `(owner key, entity id)` pairs from one or more sources (an
//! explicit id list, one or more query results); `finalize` then derives the
//! immutable id sequence and ownership-run sequence exactly once.
//!
//! Duplicate pairs are discarded by the underlying set. An id reported under
//! two different owners is a caller error: callers must guarantee exactly
//! one owner per id.

use std::collections::BTreeSet;

use crate::batch::configuration::OwnershipRun;
use crate::batch::partitioner::{partition, OwnerIdPair};

/// Accumulation phase: a deduplicated, ordered pair set.
#[derive(Debug, Default)]
pub struct BatchElementConfiguration {
    collected: BTreeSet<OwnerIdPair>,
}

impl BatchElementConfiguration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge pairs from one source. Idempotent under exact duplicates.
    pub fn add_mappings(&mut self, pairs: impl IntoIterator<Item = OwnerIdPair>) {
        self.collected.extend(pairs);
    }

    /// Whether any pairs were collected so far.
    pub fn is_empty(&self) -> bool {
        self.collected.is_empty()
    }

    pub fn len(&self) -> usize {
        self.collected.len()
    }

    /// Derive the final id sequence and ownership runs, consuming the
    /// builder.
    pub fn finalize(self) -> BatchElements {
        let (ids, runs) = partition(&self.collected);
        BatchElements { ids, runs }
    }
}

/// Finalized, immutable batch targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchElements {
    ids: Vec<String>,
    runs: Vec<OwnershipRun>,
}

impl BatchElements {
    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn runs(&self) -> &[OwnershipRun] {
        &self.runs
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn into_parts(self) -> (Vec<String>, Vec<OwnershipRun>) {
        (self.ids, self.runs)
    }
}
