//! # Pair Partitioner
//!
//! Orders and run-length-encodes `(owner key, entity id)` pairs into
//! contiguous ownership runs. Pure and stateless; the sort dominates at
//! O(n log n) and a single pass emits the runs.
//!
//! Ordering is total over `(owner_key, entity_id)` with `None` owner keys
//! sorting *before* every real key (the derived order of `Option<String>`).
//! This placement is fixed: it determines the processing order of batches
//! mixing legacy (ownerless) and partitioned data.

use std::collections::BTreeSet;

use crate::batch::configuration::OwnershipRun;

/// A `(owner key, entity id)` pair with the total order the partitioner
/// relies on: owner key first, then entity id.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct OwnerIdPair {
    pub owner_key: Option<String>,
    pub entity_id: String,
}

impl OwnerIdPair {
    pub fn new(owner_key: Option<String>, entity_id: impl Into<String>) -> Self {
        Self {
            owner_key,
            entity_id: entity_id.into(),
        }
    }

    /// Pair owned by a deployment.
    pub fn owned(owner_key: impl Into<String>, entity_id: impl Into<String>) -> Self {
        Self::new(Some(owner_key.into()), entity_id)
    }

    /// Pair without a resolvable owner (legacy data).
    pub fn unowned(entity_id: impl Into<String>) -> Self {
        Self::new(None, entity_id)
    }
}

/// Run-length-encode an ordered pair set into the id sequence and its
/// ownership runs.
///
/// The returned id sequence is the entity ids in `(owner, id)` order; the
/// runs' counts sum to the sequence length and no two adjacent runs share an
/// owner. Empty input yields two empty vectors.
pub fn partition(pairs: &BTreeSet<OwnerIdPair>) -> (Vec<String>, Vec<OwnershipRun>) {
    let mut ids = Vec::with_capacity(pairs.len());
    let mut runs = Vec::new();

    let mut current: Option<(Option<String>, usize)> = None;
    for pair in pairs {
        ids.push(pair.entity_id.clone());
        current = match current {
            Some((owner, count)) if owner == pair.owner_key => Some((owner, count + 1)),
            Some((owner, count)) => {
                runs.push(OwnershipRun::new(owner, count));
                Some((pair.owner_key.clone(), 1))
            }
            None => Some((pair.owner_key.clone(), 1)),
        };
    }
    if let Some((owner, count)) = current {
        runs.push(OwnershipRun::new(owner, count));
    }

    (ids, runs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn pairs(entries: &[(Option<&str>, &str)]) -> BTreeSet<OwnerIdPair> {
        entries
            .iter()
            .map(|(owner, id)| OwnerIdPair::new(owner.map(str::to_string), *id))
            .collect()
    }

    #[test]
    fn empty_input_yields_empty_output() {
        let (ids, runs) = partition(&BTreeSet::new());
        assert!(ids.is_empty());
        assert!(runs.is_empty());
    }

    #[test]
    fn groups_ids_by_owner_in_sorted_order() {
        let input = pairs(&[
            (Some("depA"), "p1"),
            (Some("depB"), "p2"),
            (Some("depA"), "p3"),
        ]);

        let (ids, runs) = partition(&input);

        assert_eq!(ids, vec!["p1", "p3", "p2"]);
        assert_eq!(
            runs,
            vec![
                OwnershipRun::new(Some("depA".to_string()), 2),
                OwnershipRun::new(Some("depB".to_string()), 1),
            ]
        );
    }

    #[test]
    fn null_owner_sorts_before_real_owners() {
        let input = pairs(&[(Some("depA"), "p1"), (None, "p2"), (Some("depB"), "p3")]);

        let (ids, runs) = partition(&input);

        assert_eq!(ids, vec!["p2", "p1", "p3"]);
        assert_eq!(runs[0].owner_key(), None);
        assert_eq!(runs[0].count(), 1);
    }

    #[test]
    fn duplicate_pairs_collapse_via_set_semantics() {
        let mut input = pairs(&[(Some("depA"), "p1")]);
        input.insert(OwnerIdPair::owned("depA", "p1"));

        let (ids, runs) = partition(&input);

        assert_eq!(ids, vec!["p1"]);
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].count(), 1);
    }

    proptest! {
        #[test]
        fn run_counts_always_sum_to_id_count(
            entries in proptest::collection::btree_set(
                (proptest::option::of("[a-d]"), "[a-z]{1,6}")
                    .prop_map(|(owner, id)| OwnerIdPair::new(owner, id)),
                0..64,
            )
        ) {
            let (ids, runs) = partition(&entries);

            prop_assert_eq!(ids.len(), entries.len());
            prop_assert_eq!(runs.iter().map(|r| r.count()).sum::<usize>(), ids.len());

            // No two adjacent runs share an owner.
            for window in runs.windows(2) {
                prop_assert_ne!(window[0].owner_key(), window[1].owner_key());
            }

            // Ids come out in (owner, id) order.
            let expected: Vec<String> =
                entries.iter().map(|p| p.entity_id.clone()).collect();
            prop_assert_eq!(ids, expected);
        }
    }
}
